use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BatchError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        BatchError::invocation("x")
            .to_string()
            .contains("invocation failure:")
    );
    assert!(
        BatchError::directory_unreadable("/nope", std::io::Error::other("gone"))
            .to_string()
            .contains("directory unreadable: '/nope'")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BatchError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
