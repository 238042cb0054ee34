//! Model-space bounds of the geometry a mask has to cover.

use crate::foundation::core::{ObjectKind, Point, Rect};
use crate::foundation::math::{BoundsAccumulator, has_area};
use crate::scene::model::Model;

/// Tight AABB of one vertex list. `None` when there is no finite vertex.
pub fn drawable_bounds(vertices: &[Point]) -> Option<Rect> {
    let mut acc = BoundsAccumulator::new();
    for &p in vertices {
        acc.add_point(p);
    }
    acc.finish()
}

/// Union of the AABBs of every drawable covered by `objects`.
///
/// Drawables with no vertices or a zero-area box are left out of the union. `None` means
/// nothing usable remained and the mask should be skipped for this frame.
pub fn clipped_total_bounds(model: &Model, kind: ObjectKind, objects: &[usize]) -> Option<Rect> {
    let mut acc = BoundsAccumulator::new();
    for &object in objects {
        for drawable in model.covered_drawables(kind, object) {
            let Some(d) = model.drawables.get(drawable) else {
                continue;
            };
            match drawable_bounds(&d.vertices) {
                Some(r) if has_area(r) => acc.add_rect(r),
                _ => {}
            }
        }
    }
    acc.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/clipping/bounds.rs"]
mod tests;
