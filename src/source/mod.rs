//! Discovery of renderable inputs.

/// Directory enumeration into ordered work items.
pub mod tasks;
