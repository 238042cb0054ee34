use super::*;
use crate::foundation::core::Point;
use crate::scene::model::{Drawable, Offscreen, Part};

fn square(x: f64, y: f64, side: f64) -> Drawable {
    Drawable::new(vec![
        Point::new(x, y),
        Point::new(x + side, y),
        Point::new(x + side, y + side),
        Point::new(x, y + side),
    ])
}

/// Drawables 0..=2 are masks; the rest are clipped by the given sets.
fn model_with(clips: &[&[usize]]) -> Model {
    let mut drawables = vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(0.0, 1.0, 1.0)];
    for (i, masks) in clips.iter().enumerate() {
        drawables.push(square(i as f64, 0.0, 2.0).with_masks(masks.to_vec()));
    }
    Model::new(drawables)
}

fn manager(model: &Model, count: u32) -> ClippingManager {
    let mut m = ClippingManager::new(PixelSize::square(256));
    m.initialize(model, count, ObjectKind::Drawable);
    m
}

#[test]
fn no_masked_drawables_means_no_contexts() {
    let model = model_with(&[&[], &[]]);
    let mut m = manager(&model, 1);
    assert!(m.contexts_for_mask().is_empty());
    assert!(m.contexts_for_draw().iter().all(Option::is_none));
    assert_eq!(m.setup_clipping_context(&model, false, Affine::IDENTITY), 0);
    assert!(m.build_mask_passes(&model).is_empty());
}

#[test]
fn identical_mask_sets_share_one_context() {
    let model = model_with(&[&[0, 1], &[1, 0], &[1, 1, 0], &[2]]);
    let m = manager(&model, 1);
    assert_eq!(m.contexts_for_mask().len(), 2);

    let shared = m.find_same_clip(&[1, 0]).unwrap();
    assert_eq!(m.find_same_clip(&[0, 0, 1]), Some(shared));
    assert_eq!(m.context_for(3).unwrap().id(), shared);
    assert_eq!(m.context_for(4).unwrap().id(), shared);
    assert_eq!(m.context_for(5).unwrap().id(), shared);
    assert_eq!(m.context(shared).unwrap().clipped_objects(), &[3, 4, 5]);
    assert_ne!(m.context_for(6).unwrap().id(), shared);
    assert!(m.context_for(0).is_none());
    assert_eq!(m.find_same_clip(&[0]), None);
}

#[test]
fn render_texture_count_follows_configuration() {
    let model = model_with(&[&[0]]);
    assert_eq!(manager(&model, 0).render_texture_count(), 1);
    assert_eq!(manager(&model, 1).render_texture_count(), 1);
    assert_eq!(manager(&model, 3).render_texture_count(), 3);
}

#[test]
fn render_texture_count_grows_past_capacity() {
    // 40 distinct single-mask groups over 40 mask drawables.
    let mut drawables = (0..40).map(|i| square(i as f64, 0.0, 1.0)).collect::<Vec<_>>();
    for i in 0..40 {
        drawables.push(square(i as f64, 0.0, 1.0).with_masks(vec![i]));
    }
    let model = Model::new(drawables);
    let mut m = manager(&model, 1);
    assert_eq!(m.contexts_for_mask().len(), 40);
    assert_eq!(m.render_texture_count(), 2);

    m.setup_clipping_context(&model, false, Affine::IDENTITY);
    for b in 0..2 {
        let n = m
            .contexts_for_mask()
            .iter()
            .filter(|c| c.buffer_index() == b)
            .count();
        assert!(n <= crate::clipping::channel::CLIPPING_MASK_MAX_COUNT_ON_MULTI_RENDER_TEXTURE);
    }
}

#[test]
fn layout_skips_contexts_not_in_use() {
    let mut model = model_with(&[&[0], &[1], &[2]]);
    // collapse the geometry clipped by the second context
    model.drawables[4].vertices.clear();
    let mut m = manager(&model, 1);

    assert_eq!(m.setup_clipping_context(&model, false, Affine::IDENTITY), 2);
    let ctxs = m.contexts_for_mask();
    assert!(ctxs[0].is_using());
    assert!(!ctxs[1].is_using());
    assert_eq!(ctxs[1].all_clipped_drawables_bounds(), Rect::ZERO);
    assert!(ctxs[2].is_using());
    assert_eq!(ctxs[0].channel(), ColorChannel::R);
    assert_eq!(ctxs[2].channel(), ColorChannel::G);

    assert!(m.mask_binding(ctxs[1].id()).is_none());
    let passes = m.build_mask_passes(&model);
    assert_eq!(passes.len(), 2);
    assert!(passes.iter().all(|p| p.context != ContextId(1)));
}

#[test]
fn setup_fits_bounds_with_margin_into_tile() {
    let model = model_with(&[&[0]]);
    let mut m = manager(&model, 1);
    m.setup_clipping_context(&model, false, Affine::IDENTITY);

    let ctx = m.context_for(3).unwrap();
    assert_eq!(ctx.all_clipped_drawables_bounds(), Rect::new(0.0, 0.0, 2.0, 2.0));
    // bounds expanded by 5% on each side map onto the full tile
    let p = ctx.matrix_for_draw() * Point::new(-0.1, -0.1);
    assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
    let p = ctx.matrix_for_draw() * Point::new(2.1, 2.1);
    assert!((p.x - 1.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
    let p = ctx.matrix_for_mask() * Point::new(2.1, 2.1);
    assert!((p.x - 1.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
}

#[test]
fn layout_bounds_zero_count_is_a_no_op() {
    let model = model_with(&[&[0], &[1]]);
    let mut m = manager(&model, 1);
    m.setup_clipping_context(&model, false, Affine::IDENTITY);
    let before = m.contexts_for_mask().to_vec();
    m.setup_layout_bounds(0);
    assert_eq!(m.contexts_for_mask(), before.as_slice());
}

#[test]
fn mask_passes_clear_each_surface_once_and_skip_stale_masks() {
    let mut model = model_with(&[&[0, 1], &[2], &[1], &[0]]);
    model.drawables[1].vertex_positions_changed = false;
    let mut m = manager(&model, 2);
    m.setup_clipping_context(&model, false, Affine::IDENTITY);

    let passes = m.build_mask_passes(&model);
    assert_eq!(passes.len(), 4);
    let clears = passes.iter().filter(|p| p.clear).collect::<Vec<_>>();
    assert_eq!(clears.len(), 2);
    assert_eq!(clears[0].buffer_index, 0);
    assert_eq!(clears[1].buffer_index, 1);
    assert!(passes.windows(2).all(|w| w[0].buffer_index <= w[1].buffer_index));

    let pair = passes
        .iter()
        .find(|p| p.context == m.find_same_clip(&[0, 1]).unwrap())
        .unwrap();
    assert_eq!(pair.drawables, vec![0]);
    assert_eq!(pair.binding.channel_flag, pair.binding.channel.flag());
}

#[test]
fn high_precision_puts_every_context_on_exclusive_slot() {
    let mut model = model_with(&[&[0], &[1], &[2]]);
    model.pixels_per_unit = 10.0;
    let mut m = manager(&model, 1);
    assert_eq!(m.setup_matrix_for_high_precision(&model, false, Affine::IDENTITY), 3);
    for c in m.contexts_for_mask() {
        assert_eq!(c.buffer_index(), 0);
        assert_eq!(c.channel(), ColorChannel::R);
        assert_eq!(c.layout_bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
    }
    // 2 units at 10 px/unit fit in 256 px: density scale, no margin
    let ctx = m.context_for(3).unwrap();
    let p = ctx.matrix_for_draw() * Point::new(2.0, 2.0);
    assert!((p.x - 20.0 / 256.0).abs() < 1e-9);
}

#[test]
fn offscreen_draw_matrix_undoes_mvp() {
    let mut model = Model::new(vec![
        square(0.0, 0.0, 1.0),
        square(0.0, 0.0, 4.0).with_parent_part(0),
    ]);
    model.parts = vec![Part::default()];
    model.offscreens = vec![Offscreen {
        owner_part: 0,
        masks: vec![0],
        render_order: 0,
    }];
    let mvp = Affine::scale(0.5) * Affine::translate((1.0, 1.0));

    let mut plain = ClippingManager::new(PixelSize::square(256));
    plain.initialize(&model, 1, ObjectKind::Offscreen);
    plain.setup_clipping_context(&model, false, Affine::IDENTITY);

    let mut m = ClippingManager::new(PixelSize::square(256));
    m.initialize(&model, 1, ObjectKind::Offscreen);
    assert_eq!(m.kind(), ObjectKind::Offscreen);
    m.setup_clipping_context(&model, false, mvp);

    let model_pt = Point::new(3.0, 2.0);
    let clip_pt = mvp * model_pt;
    let a = plain.context_for(0).unwrap().matrix_for_draw() * model_pt;
    let b = m.context_for(0).unwrap().matrix_for_draw() * clip_pt;
    assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
}

#[test]
fn singular_mvp_leaves_offscreen_draw_matrix_in_model_space() {
    let mut model = Model::new(vec![
        square(0.0, 0.0, 1.0),
        square(0.0, 0.0, 4.0).with_parent_part(0),
    ]);
    model.parts = vec![Part::default()];
    model.offscreens = vec![Offscreen {
        owner_part: 0,
        masks: vec![0],
        render_order: 0,
    }];
    let mut m = ClippingManager::new(PixelSize::square(256));
    m.initialize(&model, 1, ObjectKind::Offscreen);
    m.setup_clipping_context(&model, false, Affine::scale(0.0));
    let d = m.context_for(0).unwrap().matrix_for_draw();
    assert!(d.as_coeffs().iter().all(|c| c.is_finite()));
}

#[test]
fn buffer_size_round_trips() {
    let mut m = ClippingManager::new(PixelSize::square(256));
    m.set_clipping_mask_buffer_size(PixelSize::new(512, 128));
    assert_eq!(m.clipping_mask_buffer_size(), PixelSize::new(512, 128));
    assert_eq!(m.channel_flag(ColorChannel::G), [0.0, 1.0, 0.0, 0.0]);
}
