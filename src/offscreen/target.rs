use crate::foundation::error::MaskpackResult;
use crate::offscreen::device::SurfaceDevice;
use crate::offscreen::pool::{RenderTargetId, RenderTargetPool};
use crate::scene::model::Model;

/// Per-offscreen borrower of a pooled render target.
///
/// Holds a [`RenderTargetId`] only between [`Self::set_render_target`] and
/// [`Self::stop_using`]; the pool keeps ownership of the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffscreenRenderTarget {
    offscreen_index: usize,
    parent_offscreen: Option<usize>,
    old_offscreen: Option<usize>,
    target: Option<RenderTargetId>,
}

impl OffscreenRenderTarget {
    pub fn new(offscreen_index: usize) -> Self {
        Self {
            offscreen_index,
            parent_offscreen: None,
            old_offscreen: None,
            target: None,
        }
    }

    pub fn offscreen_index(&self) -> usize {
        self.offscreen_index
    }

    /// Offscreen this one is composited into, or `None` for the model target.
    pub fn parent_offscreen(&self) -> Option<usize> {
        self.parent_offscreen
    }

    pub fn set_parent_offscreen(&mut self, parent: Option<usize>) {
        self.parent_offscreen = parent;
    }

    /// Offscreen that was bound when this one began; restored after compositing.
    pub fn old_offscreen(&self) -> Option<usize> {
        self.old_offscreen
    }

    pub fn set_old_offscreen(&mut self, old: Option<usize>) {
        self.old_offscreen = old;
    }

    pub fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    pub fn is_using<D: SurfaceDevice>(&self, pool: &RenderTargetPool<D>) -> bool {
        self.target.is_some_and(|id| pool.is_in_use(id))
    }

    /// Makes sure a `width x height` target is borrowed for this frame.
    ///
    /// A target still held is kept (and recreated if the size changed); otherwise one is
    /// acquired from the pool.
    pub fn set_render_target<D: SurfaceDevice>(
        &mut self,
        pool: &mut RenderTargetPool<D>,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> MaskpackResult<RenderTargetId> {
        if let Some(id) = self.target
            && pool.is_in_use(id)
        {
            pool.resize(device, id, width, height)?;
            return Ok(id);
        }
        let id = pool.acquire(device, width, height)?;
        self.target = Some(id);
        Ok(id)
    }

    pub fn stop_using<D: SurfaceDevice>(&mut self, pool: &mut RenderTargetPool<D>) {
        if let Some(id) = self.target.take() {
            pool.release(id);
        }
    }
}

/// For each offscreen of `model`, the nearest enclosing offscreen found by walking up the
/// part hierarchy from its owner part.
pub fn resolve_parent_offscreens(model: &Model) -> Vec<Option<usize>> {
    model
        .offscreens
        .iter()
        .map(|o| {
            model
                .ancestors(o.owner_part)
                .find_map(|part| model.offscreen_owned_by(part))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/offscreen/target.rs"]
mod tests;
