use crate::clipping::manager::ClippingManager;
use crate::config::RendererOpts;
use crate::foundation::core::{Affine, ObjectKind, PixelSize};
use crate::foundation::error::MaskpackResult;
use crate::offscreen::device::SurfaceDevice;
use crate::offscreen::pool::{RenderTargetId, RenderTargetPool};
use crate::offscreen::target::{OffscreenRenderTarget, resolve_parent_offscreens};
use crate::render::plan::{FramePlan, OffscreenPass, Pass, PlanInputs, compile_frame};
use crate::scene::model::Model;

/// Per-model driver owning the clipping managers, their mask surfaces and the offscreen pool.
///
/// Frame protocol: [`Self::prepare_frame`], execute the plan (calling
/// [`Self::acquire_offscreen`] on each offscreen begin), then [`Self::finish_frame`].
pub struct ModelRenderer<D: SurfaceDevice> {
    opts: RendererOpts,
    drawable_clipping: Option<ClippingManager>,
    offscreen_clipping: Option<ClippingManager>,
    mask_buffers: Vec<Option<D::Surface>>,
    offscreen_mask_buffers: Vec<Option<D::Surface>>,
    pool: RenderTargetPool<D>,
    offscreen_targets: Vec<OffscreenRenderTarget>,
    parent_offscreens: Vec<Option<usize>>,
}

impl<D: SurfaceDevice> ModelRenderer<D> {
    pub fn new(opts: RendererOpts) -> MaskpackResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            drawable_clipping: None,
            offscreen_clipping: None,
            mask_buffers: Vec::new(),
            offscreen_mask_buffers: Vec::new(),
            pool: RenderTargetPool::new(),
            offscreen_targets: Vec::new(),
            parent_offscreens: Vec::new(),
        })
    }

    /// (Re)builds mask groups, mask surfaces and offscreen handles for `model`.
    ///
    /// A mask surface the device fails to create is left out; clipped draws that would use it
    /// render unclipped.
    #[tracing::instrument(skip(self, model, device))]
    pub fn initialize(&mut self, model: &Model, device: &mut D) -> MaskpackResult<()> {
        model.validate()?;
        self.destroy_mask_buffers(device);
        for t in &mut self.offscreen_targets {
            t.stop_using(&mut self.pool);
        }

        self.drawable_clipping = self.build_manager(model, ObjectKind::Drawable);
        self.offscreen_clipping = self.build_manager(model, ObjectKind::Offscreen);
        self.create_mask_buffers(device);

        self.parent_offscreens = resolve_parent_offscreens(model);
        self.offscreen_targets = self
            .parent_offscreens
            .iter()
            .enumerate()
            .map(|(i, &parent)| {
                let mut t = OffscreenRenderTarget::new(i);
                t.set_parent_offscreen(parent);
                t
            })
            .collect();
        Ok(())
    }

    fn build_manager(&self, model: &Model, kind: ObjectKind) -> Option<ClippingManager> {
        if !model.is_using_masking(kind) {
            return None;
        }
        let size = match kind {
            ObjectKind::Drawable => self.opts.mask_buffer_size,
            ObjectKind::Offscreen => self.opts.offscreen_mask_buffer_size,
        };
        let mut mgr = ClippingManager::new(size);
        mgr.initialize(model, self.opts.mask_buffer_count, kind);
        Some(mgr)
    }

    fn create_mask_buffers(&mut self, device: &mut D) {
        self.mask_buffers =
            create_buffers(device, self.drawable_clipping.as_ref(), ObjectKind::Drawable);
        self.offscreen_mask_buffers =
            create_buffers(device, self.offscreen_clipping.as_ref(), ObjectKind::Offscreen);
    }

    fn destroy_mask_buffers(&mut self, device: &mut D) {
        for s in self
            .mask_buffers
            .drain(..)
            .chain(self.offscreen_mask_buffers.drain(..))
            .flatten()
        {
            device.destroy_surface(s);
        }
    }

    /// Opens the frame: lays out masks and returns the pass list to execute.
    #[tracing::instrument(skip(self, model))]
    pub fn prepare_frame(&mut self, model: &Model, mvp: Affine) -> FramePlan {
        self.pool.begin_frame();

        let high_precision = self.opts.high_precision_mask;
        let right_handed = self.opts.right_handed;
        for mgr in [&mut self.drawable_clipping, &mut self.offscreen_clipping]
            .into_iter()
            .flatten()
        {
            if high_precision {
                mgr.setup_matrix_for_high_precision(model, right_handed, mvp);
            } else {
                mgr.setup_clipping_context(model, right_handed, mvp);
            }
        }

        let mut plan = compile_frame(
            model,
            PlanInputs {
                drawable_clipping: self.drawable_clipping.as_ref(),
                offscreen_clipping: self.offscreen_clipping.as_ref(),
                parent_offscreens: &self.parent_offscreens,
                high_precision,
            },
        );
        self.drop_unavailable_masks(&mut plan);
        plan
    }

    fn drop_unavailable_masks(&self, plan: &mut FramePlan) {
        let has_buffer = |kind: ObjectKind, index: usize| {
            let buffers = match kind {
                ObjectKind::Drawable => &self.mask_buffers,
                ObjectKind::Offscreen => &self.offscreen_mask_buffers,
            };
            buffers.get(index).is_some_and(Option::is_some)
        };

        let before = plan.passes.len();
        plan.passes.retain(|p| match p {
            Pass::Mask(m) => has_buffer(m.kind, m.buffer_index),
            _ => true,
        });
        let mut degraded = before - plan.passes.len();

        for pass in &mut plan.passes {
            let (mask, kind) = match pass {
                Pass::DrawMesh(d) => (&mut d.mask, ObjectKind::Drawable),
                Pass::CompositeOffscreen(c) => (&mut c.mask, ObjectKind::Offscreen),
                _ => continue,
            };
            if mask.is_some_and(|b| !has_buffer(kind, b.buffer_index)) {
                *mask = None;
                degraded += 1;
            }
        }
        if degraded > 0 {
            tracing::warn!(degraded, "mask surfaces unavailable; affected passes render unclipped");
        }
    }

    /// Borrows the render target for an offscreen begin pass.
    ///
    /// On device failure the offscreen gets no target (`None`) and its content should be drawn
    /// straight into the parent target.
    pub fn acquire_offscreen(
        &mut self,
        device: &mut D,
        pass: &OffscreenPass,
    ) -> Option<RenderTargetId> {
        let size = self.opts.model_target_size;
        let target = self.offscreen_targets.get_mut(pass.offscreen)?;
        target.set_old_offscreen(pass.parent);
        match target.set_render_target(&mut self.pool, device, size.width, size.height) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    offscreen = pass.offscreen,
                    error = %e,
                    "offscreen target unavailable; drawing unblended"
                );
                None
            }
        }
    }

    pub fn release_offscreen(&mut self, offscreen: usize) {
        if let Some(t) = self.offscreen_targets.get_mut(offscreen) {
            t.stop_using(&mut self.pool);
        }
    }

    /// Closes the frame: returns every borrowed target and lets the pool shrink.
    pub fn finish_frame(&mut self, device: &mut D) {
        for t in &mut self.offscreen_targets {
            t.stop_using(&mut self.pool);
        }
        self.pool.release_all_in_use();
        self.pool.end_frame();
        self.pool.release_stale(device);
    }

    /// Destroys every device surface, e.g. after the device was lost. Call
    /// [`Self::initialize`] again before the next frame.
    pub fn release_device_resources(&mut self, device: &mut D) {
        self.destroy_mask_buffers(device);
        for t in &mut self.offscreen_targets {
            t.stop_using(&mut self.pool);
        }
        self.pool.release_all(device);
    }

    /// Changes the drawable mask surface size and recreates those surfaces.
    pub fn set_mask_buffer_size(&mut self, device: &mut D, size: PixelSize) -> MaskpackResult<()> {
        let opts = RendererOpts {
            mask_buffer_size: size,
            ..self.opts
        };
        opts.validate()?;
        self.opts = opts;

        for s in self.mask_buffers.drain(..).flatten() {
            device.destroy_surface(s);
        }
        if let Some(mgr) = &mut self.drawable_clipping {
            mgr.set_clipping_mask_buffer_size(size);
        }
        self.mask_buffers =
            create_buffers(device, self.drawable_clipping.as_ref(), ObjectKind::Drawable);
        Ok(())
    }

    pub fn opts(&self) -> &RendererOpts {
        &self.opts
    }

    pub fn clipping(&self, kind: ObjectKind) -> Option<&ClippingManager> {
        match kind {
            ObjectKind::Drawable => self.drawable_clipping.as_ref(),
            ObjectKind::Offscreen => self.offscreen_clipping.as_ref(),
        }
    }

    pub fn mask_buffer_count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Drawable => self.mask_buffers.len(),
            ObjectKind::Offscreen => self.offscreen_mask_buffers.len(),
        }
    }

    pub fn mask_buffer(&self, kind: ObjectKind, index: usize) -> Option<&D::Surface> {
        let buffers = match kind {
            ObjectKind::Drawable => &self.mask_buffers,
            ObjectKind::Offscreen => &self.offscreen_mask_buffers,
        };
        buffers.get(index).and_then(Option::as_ref)
    }

    pub fn mask_buffer_mut(&mut self, kind: ObjectKind, index: usize) -> Option<&mut D::Surface> {
        let buffers = match kind {
            ObjectKind::Drawable => &mut self.mask_buffers,
            ObjectKind::Offscreen => &mut self.offscreen_mask_buffers,
        };
        buffers.get_mut(index).and_then(Option::as_mut)
    }

    pub fn offscreen_target(&self, offscreen: usize) -> Option<&OffscreenRenderTarget> {
        self.offscreen_targets.get(offscreen)
    }

    /// Surface currently borrowed by `offscreen`, if any.
    pub fn offscreen_surface(&self, offscreen: usize) -> Option<&D::Surface> {
        let id = self.offscreen_targets.get(offscreen)?.render_target()?;
        self.pool.surface(id)
    }

    pub fn parent_offscreens(&self) -> &[Option<usize>] {
        &self.parent_offscreens
    }

    pub fn pool(&self) -> &RenderTargetPool<D> {
        &self.pool
    }
}

fn create_buffers<D: SurfaceDevice>(
    device: &mut D,
    mgr: Option<&ClippingManager>,
    kind: ObjectKind,
) -> Vec<Option<D::Surface>> {
    let Some(mgr) = mgr else {
        return Vec::new();
    };
    let size = mgr.clipping_mask_buffer_size();
    (0..mgr.render_texture_count())
        .map(|index| match device.create_surface(size.width, size.height) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(?kind, index, error = %e, "mask surface unavailable");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
