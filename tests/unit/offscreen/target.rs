use super::*;
use crate::offscreen::cpu::CpuSurfaceDevice;
use crate::scene::model::{Offscreen, Part};

fn offscreen(owner_part: usize) -> Offscreen {
    Offscreen {
        owner_part,
        masks: Vec::new(),
        render_order: 0,
    }
}

#[test]
fn set_render_target_keeps_held_target() {
    let mut dev = CpuSurfaceDevice::new();
    let mut pool = RenderTargetPool::new();
    pool.begin_frame();

    let mut t = OffscreenRenderTarget::new(0);
    assert!(!t.is_using(&pool));
    let a = t.set_render_target(&mut pool, &mut dev, 32, 32).unwrap();
    let again = t.set_render_target(&mut pool, &mut dev, 32, 32).unwrap();
    assert_eq!(a, again);
    assert_eq!(pool.current_active_count(), 1);
    assert!(t.is_using(&pool));
}

#[test]
fn held_target_is_recreated_on_size_change() {
    let mut dev = CpuSurfaceDevice::new();
    let mut pool = RenderTargetPool::new();
    pool.begin_frame();

    let mut t = OffscreenRenderTarget::new(0);
    let a = t.set_render_target(&mut pool, &mut dev, 32, 32).unwrap();
    let serial = pool.surface(a).unwrap().serial();
    let b = t.set_render_target(&mut pool, &mut dev, 64, 16).unwrap();
    assert_eq!(a, b);
    assert_eq!(pool.size_of(b), Some((64, 16)));
    assert_ne!(pool.surface(b).unwrap().serial(), serial);
    assert_eq!(dev.live_surfaces(), 1);
}

#[test]
fn stop_using_returns_target_to_pool() {
    let mut dev = CpuSurfaceDevice::new();
    let mut pool = RenderTargetPool::new();
    pool.begin_frame();

    let mut t = OffscreenRenderTarget::new(2);
    let a = t.set_render_target(&mut pool, &mut dev, 8, 8).unwrap();
    t.stop_using(&mut pool);
    assert_eq!(t.render_target(), None);
    assert!(!pool.is_in_use(a));

    let mut other = OffscreenRenderTarget::new(3);
    assert_eq!(other.set_render_target(&mut pool, &mut dev, 8, 8).unwrap(), a);
    // stopping an idle handle is harmless
    t.stop_using(&mut pool);
    assert!(pool.is_in_use(a));
}

#[test]
fn parent_and_old_offscreen_are_plain_bookkeeping() {
    let mut t = OffscreenRenderTarget::new(1);
    t.set_parent_offscreen(Some(0));
    t.set_old_offscreen(Some(4));
    assert_eq!(t.offscreen_index(), 1);
    assert_eq!(t.parent_offscreen(), Some(0));
    assert_eq!(t.old_offscreen(), Some(4));
}

#[test]
fn parents_resolve_through_intermediate_parts() {
    let mut model = Model::default();
    // 0 <- 1 <- 2 <- 3, offscreens on parts 0, 2 and 3
    model.parts = vec![
        Part { parent: None },
        Part { parent: Some(0) },
        Part { parent: Some(1) },
        Part { parent: Some(2) },
    ];
    model.offscreens = vec![offscreen(0), offscreen(2), offscreen(3)];
    assert_eq!(resolve_parent_offscreens(&model), vec![None, Some(0), Some(1)]);
}
