use super::*;
use crate::foundation::core::RenderConfig;
use crate::schedule::report::{RecordingReporter, ReportEvent, SilentReporter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

fn items(names: &[&str]) -> Vec<WorkItem> {
    let render = Arc::new(RenderConfig::default());
    names
        .iter()
        .map(|n| WorkItem::new(format!("sketches/{n}"), render.clone()))
        .collect()
}

fn numbered(n: usize) -> Vec<WorkItem> {
    let names: Vec<String> = (0..n).map(|i| format!("s{i:02}.js")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    items(&refs)
}

/// Fake renderer tracking how many invocations overlap.
#[derive(Default)]
struct Probe {
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    started: Mutex<Vec<String>>,
    delay: Duration,
    fail: Vec<&'static str>,
    barrier: Option<Barrier>,
}

impl Probe {
    fn with_delay(ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Invoker for Probe {
    fn invoke(&self, item: &WorkItem) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(item.name());

        if let Some(b) = &self.barrier {
            b.wait();
        }
        std::thread::sleep(self.delay);

        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.fail.contains(&item.name().as_str()) {
            Outcome::failure(
                item.clone(),
                BatchError::invocation("renderer exited with status 1"),
                self.delay,
            )
        } else {
            Outcome::success(item.clone(), self.delay)
        }
    }
}

#[test]
fn five_items_ceiling_two_never_exceeds_two() {
    let work = items(&["a.js", "b.js", "c.js", "d.js", "e.js"]);
    let probe = Probe::with_delay(20);
    let mut rec = RecordingReporter::new();

    let report = run(&work, 2, &probe, &mut rec).unwrap();

    assert!(probe.peak() <= 2);
    assert!(rec.peak_active() <= 2);
    assert_eq!(report.total, 5);
    assert_eq!(report.completed, 5);
    assert!(report.failures.is_empty());
    assert!(report.is_success());

    let mut started = probe.started.lock().unwrap().clone();
    started.sort();
    assert_eq!(started, ["a.js", "b.js", "c.js", "d.js", "e.js"]);
}

#[test]
fn ceiling_above_item_count_runs_everything_at_once() {
    let work = items(&["a.js", "b.js", "c.js"]);
    // Every invocation waits for the other two, so this only finishes if all three overlap.
    let probe = Probe {
        barrier: Some(Barrier::new(3)),
        ..Probe::default()
    };
    let mut rec = RecordingReporter::new();

    let report = run(&work, 8, &probe, &mut rec).unwrap();

    assert_eq!(probe.peak(), 3);
    assert_eq!(report.completed, 3);
    let dispatched_waiting: Vec<usize> = rec
        .events()
        .iter()
        .filter_map(|e| match e {
            ReportEvent::Dispatch { progress, .. } => Some(progress.waiting),
            _ => None,
        })
        .collect();
    assert_eq!(dispatched_waiting, [2, 1, 0]);
}

#[test]
fn one_failure_is_isolated() {
    let work = items(&["a.js", "bad.js", "c.js", "d.js"]);
    let probe = Probe {
        fail: vec!["bad.js"],
        ..Probe::with_delay(5)
    };

    let report = run(&work, 2, &probe, &mut SilentReporter).unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item.name(), "bad.js");
    assert!(!report.is_success());
    assert_eq!(probe.calls(), 4);
}

#[test]
fn empty_batch_dispatches_nothing() {
    let probe = Probe::default();
    let mut rec = RecordingReporter::new();

    let report = run(&[], 4, &probe, &mut rec).unwrap();

    assert_eq!(report.total, 0);
    assert_eq!(report.completed, 0);
    assert!(report.failures.is_empty());
    assert_eq!(probe.calls(), 0);
    assert_eq!(
        rec.events(),
        [
            ReportEvent::Start { total: 0 },
            ReportEvent::Finish {
                completed: 0,
                failed: 0
            }
        ]
    );
}

#[test]
fn invalid_ceiling_is_rejected_before_work_starts() {
    let work = items(&["a.js", "b.js"]);
    for ceiling in [0, -1, -8] {
        let probe = Probe::default();
        let mut rec = RecordingReporter::new();
        let err = run(&work, ceiling, &probe, &mut rec).unwrap_err();
        assert!(matches!(err, BatchError::Configuration(_)));
        assert_eq!(probe.calls(), 0);
        assert!(rec.events().is_empty());
    }
}

#[test]
fn admission_follows_enumeration_order() {
    let work = numbered(9);
    let probe = Probe::with_delay(2);
    let mut rec = RecordingReporter::new();

    run(&work, 3, &probe, &mut rec).unwrap();

    let dispatched: Vec<String> = rec
        .events()
        .iter()
        .filter_map(|e| match e {
            ReportEvent::Dispatch { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    let expected: Vec<String> = work.iter().map(WorkItem::name).collect();
    assert_eq!(dispatched, expected);
}

#[test]
fn ceiling_of_one_runs_strictly_in_order() {
    let work = numbered(4);
    let probe = Probe::with_delay(1);
    run(&work, 1, &probe, &mut SilentReporter).unwrap();
    assert_eq!(probe.peak(), 1);
    let expected: Vec<String> = work.iter().map(WorkItem::name).collect();
    assert_eq!(*probe.started.lock().unwrap(), expected);
}

#[test]
fn progress_counts_stay_consistent() {
    let work = numbered(7);
    let probe = Probe::with_delay(3);
    let mut rec = RecordingReporter::new();

    run(&work, 3, &probe, &mut rec).unwrap();

    let completions: Vec<_> = rec
        .events()
        .iter()
        .filter_map(|e| match e {
            ReportEvent::Complete { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(completions.len(), 7);
    for (i, p) in completions.iter().enumerate() {
        assert_eq!(p.completed, i + 1);
        assert_eq!(p.total, 7);
        assert_eq!(p.completed + p.active + p.waiting, p.total);
        assert!(p.active <= 3);
    }
    let last = completions.last().unwrap();
    assert_eq!((last.active, last.waiting), (0, 0));
    assert_eq!(
        rec.events().last(),
        Some(&ReportEvent::Finish {
            completed: 7,
            failed: 0
        })
    );
}

#[test]
fn panicking_invoker_becomes_failed_outcome() {
    let work = items(&["ok.js", "boom.js", "fine.js"]);
    let invoker = |item: &WorkItem| {
        if item.name() == "boom.js" {
            panic!("renderer crashed");
        }
        Outcome::success(item.clone(), Duration::ZERO)
    };

    let report = run(&work, 2, &invoker, &mut SilentReporter).unwrap();

    assert_eq!(report.completed, 3);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.item.name(), "boom.js");
    let msg = failure.error.as_ref().unwrap().to_string();
    assert!(msg.contains("panicked"));
    assert!(msg.contains("renderer crashed"));
}

#[test]
fn every_item_gets_exactly_one_outcome() {
    for ceiling in 1..=4 {
        for n in [0usize, 1, 5, 12] {
            let work = numbered(n);
            let probe = Probe {
                fail: vec!["s01.js", "s04.js"],
                ..Probe::with_delay(1)
            };
            let report = run(&work, ceiling, &probe, &mut SilentReporter).unwrap();

            assert!(probe.peak() <= ceiling as usize);
            assert_eq!(probe.calls(), n);
            assert_eq!(report.completed, n);

            let mut started = probe.started.lock().unwrap().clone();
            started.sort();
            started.dedup();
            assert_eq!(started.len(), n);

            let expected_failures = work
                .iter()
                .filter(|i| ["s01.js", "s04.js"].contains(&i.name().as_str()))
                .count();
            assert_eq!(report.failures.len(), expected_failures);
        }
    }
}
