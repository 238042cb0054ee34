use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MaskpackError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MaskpackError::device("x")
            .to_string()
            .contains("device error:")
    );
    assert!(
        MaskpackError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MaskpackError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
