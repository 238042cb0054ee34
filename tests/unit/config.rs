use super::*;

#[test]
fn defaults_are_valid() {
    let o = RendererOpts::default();
    o.validate().unwrap();
    assert_eq!(o.mask_buffer_count, 1);
    assert_eq!(o.mask_buffer_size, PixelSize::square(256));
    assert!(!o.right_handed);
}

#[test]
fn partial_json_fills_defaults() {
    let o = RendererOpts::from_json_str(
        r#"{ "mask_buffer_count": 3, "mask_buffer_size": { "width": 512, "height": 512 } }"#,
    )
    .unwrap();
    assert_eq!(o.mask_buffer_count, 3);
    assert_eq!(o.mask_buffer_size, PixelSize::square(512));
    assert_eq!(o.model_target_size, PixelSize::square(1024));
}

#[test]
fn zero_mask_buffers_rejected() {
    let err = RendererOpts::from_json_str(r#"{ "mask_buffer_count": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("mask_buffer_count"));
}

#[test]
fn empty_surface_size_rejected() {
    let o = RendererOpts {
        model_target_size: PixelSize::new(0, 10),
        ..RendererOpts::default()
    };
    assert!(matches!(o.validate(), Err(MaskpackError::Validation(_))));
}
