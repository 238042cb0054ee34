//! Transforms that place a mask group's geometry into its tile.

use crate::foundation::core::{Affine, Rect, Vec2};

/// Fraction of the clipped bounds added on each side before fitting into a tile.
pub const MASK_MARGIN: f64 = 0.05;

/// The two transforms of a clipping context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskMatrices {
    /// Model space to mask-surface clip space (-1..1), used while rasterizing the mask.
    pub for_mask: Affine,
    /// Model space to 0..1 mask texture space, used by consumers sampling the mask.
    pub for_draw: Affine,
}

/// Builds both transforms for a tile `layout`, per-axis scales and the (already expanded)
/// model-space `bounds`.
///
/// `for_draw` flips the Y axis when `right_handed` is set; `for_mask` never does.
pub fn create_matrix_for_mask(
    right_handed: bool,
    layout: Rect,
    scale_x: f64,
    scale_y: f64,
    bounds: Rect,
) -> MaskMatrices {
    let to_origin = Affine::translate(Vec2::new(-bounds.x0, -bounds.y0));

    let for_mask = Affine::translate((-1.0, -1.0))
        * Affine::scale(2.0)
        * Affine::translate((layout.x0, layout.y0))
        * Affine::scale_non_uniform(scale_x, scale_y)
        * to_origin;

    let y_sign = if right_handed { -1.0 } else { 1.0 };
    let for_draw = Affine::translate((layout.x0, layout.y0 * y_sign))
        * Affine::scale_non_uniform(scale_x, scale_y * y_sign)
        * to_origin;

    MaskMatrices { for_mask, for_draw }
}

/// Expands `bounds` by [`MASK_MARGIN`] and returns it with the per-axis scales that fit it
/// into `layout`.
pub fn fit_to_layout(bounds: Rect, layout: Rect) -> (Rect, f64, f64) {
    let expanded = bounds.inflate(bounds.width() * MASK_MARGIN, bounds.height() * MASK_MARGIN);
    let scale_x = layout.width() / expanded.width();
    let scale_y = layout.height() / expanded.height();
    (expanded, scale_x, scale_y)
}

/// Scales for exclusive (high precision) masks.
///
/// Geometry is rasterized at `pixels_per_unit` while it fits the physical mask; an axis that
/// would overflow falls back to the margin-expanded fit for that axis only.
pub fn high_precision_scale(
    bounds: Rect,
    layout: Rect,
    pixels_per_unit: f64,
    mask_size: Vec2,
) -> (Rect, f64, f64) {
    let physical_w = layout.width() * mask_size.x;
    let physical_h = layout.height() * mask_size.y;
    let mut out = bounds;

    let scale_x = if bounds.width() * pixels_per_unit > physical_w {
        let margin = bounds.width() * MASK_MARGIN;
        out.x0 -= margin;
        out.x1 += margin;
        layout.width() / out.width()
    } else {
        pixels_per_unit / physical_w
    };

    let scale_y = if bounds.height() * pixels_per_unit > physical_h {
        let margin = bounds.height() * MASK_MARGIN;
        out.y0 -= margin;
        out.y1 += margin;
        layout.height() / out.height()
    } else {
        pixels_per_unit / physical_h
    };

    (out, scale_x, scale_y)
}

#[cfg(test)]
#[path = "../../tests/unit/clipping/matrix.rs"]
mod tests;
