use super::*;

#[test]
fn signature_is_sorted_and_deduplicated() {
    let s = MaskSignature::new(&[7, 2, 7, 5]).unwrap();
    assert_eq!(s.as_slice(), &[2, 5, 7]);
    assert_eq!(s.len(), 3);
    assert_eq!(s, MaskSignature::new(&[5, 7, 2]).unwrap());
}

#[test]
fn empty_signature_is_rejected() {
    assert!(MaskSignature::new(&[]).is_none());
}

#[test]
fn matches_ignores_order_and_duplicates() {
    let s = MaskSignature::new(&[1, 4]).unwrap();
    assert!(s.matches(&[4, 1]));
    assert!(s.matches(&[4, 4, 1, 1]));
    assert!(!s.matches(&[1]));
    assert!(!s.matches(&[1, 4, 9]));
    assert!(!s.matches(&[]));
}

#[test]
fn new_context_is_in_use_on_exclusive_slot() {
    let c = ClippingContext::new(ContextId(3), MaskSignature::new(&[0]).unwrap());
    assert_eq!(c.id(), ContextId(3));
    assert!(c.is_using());
    assert_eq!(c.buffer_index(), 0);
    assert_eq!(c.channel(), ColorChannel::R);
    assert_eq!(c.layout_bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
    assert!(c.clipped_objects().is_empty());
}

#[test]
fn binding_carries_slot_and_channel_flag() {
    let mut c = ClippingContext::new(ContextId(0), MaskSignature::new(&[2]).unwrap());
    c.apply_slot(LayoutSlot {
        buffer_index: 1,
        channel: ColorChannel::B,
        bounds: Rect::new(0.5, 0.0, 1.0, 1.0),
    });
    c.matrix_for_draw = Affine::translate((2.0, 3.0));
    let b = c.binding();
    assert_eq!(b.buffer_index, 1);
    assert_eq!(b.channel, ColorChannel::B);
    assert_eq!(b.channel_flag, [0.0, 0.0, 1.0, 0.0]);
    assert_eq!(b.layout_bounds, Rect::new(0.5, 0.0, 1.0, 1.0));
    assert_eq!(b.matrix_for_draw, Affine::translate((2.0, 3.0)));
}
