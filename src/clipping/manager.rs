use crate::clipping::bounds::clipped_total_bounds;
use crate::clipping::channel::{ChannelAllocator, ColorChannel, LayoutSlot, surfaces_needed};
use crate::clipping::context::{ClippingContext, ContextId, MaskBinding, MaskSignature};
use crate::clipping::matrix::{
    MaskMatrices, create_matrix_for_mask, fit_to_layout, high_precision_scale,
};
use crate::foundation::core::{Affine, ObjectKind, PixelSize, Rect};
use crate::scene::model::Model;

/// One mask rasterization: the mask drawables of a context drawn into its channel and tile.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskPass {
    /// Object kind of the owning manager; each kind has its own set of mask surfaces.
    pub kind: ObjectKind,
    pub buffer_index: usize,
    /// Clear the whole mask surface before this pass. Set on the first pass of each surface.
    pub clear: bool,
    pub context: ContextId,
    pub binding: MaskBinding,
    /// Mask drawables to rasterize; those whose vertices did not change this frame are left out.
    pub drawables: Vec<usize>,
}

/// Discovers the distinct mask groups of one object kind and lays them out on mask surfaces.
///
/// `initialize` runs when the masking relationships of a model change; one of the two setup
/// passes runs every frame since vertex positions are dynamic.
#[derive(Clone, Debug)]
pub struct ClippingManager {
    kind: ObjectKind,
    mask_buffer_size: PixelSize,
    render_texture_count: usize,
    contexts: Vec<ClippingContext>,
    context_for_draw: Vec<Option<ContextId>>,
}

impl ClippingManager {
    pub fn new(mask_buffer_size: PixelSize) -> Self {
        Self {
            kind: ObjectKind::Drawable,
            mask_buffer_size,
            render_texture_count: 1,
            contexts: Vec::new(),
            context_for_draw: Vec::new(),
        }
    }

    /// Builds one context per distinct mask set among the objects of `kind`.
    ///
    /// A model without masked objects yields zero contexts.
    #[tracing::instrument(skip(self, model))]
    pub fn initialize(&mut self, model: &Model, mask_buffer_count: u32, kind: ObjectKind) {
        self.kind = kind;
        self.contexts.clear();

        let object_count = model.object_count(kind);
        self.context_for_draw = vec![None; object_count];

        for object in 0..object_count {
            let Some(signature) = MaskSignature::new(model.masks_of(kind, object)) else {
                continue;
            };
            let id = match self.find_same_clip(signature.as_slice()) {
                Some(id) => id,
                None => {
                    let id = ContextId(self.contexts.len());
                    self.contexts.push(ClippingContext::new(id, signature));
                    id
                }
            };
            self.contexts[id.index()].add_clipped_object(object);
            self.context_for_draw[object] = Some(id);
        }

        let configured = usize::try_from(mask_buffer_count).unwrap_or(usize::MAX).max(1);
        self.render_texture_count = surfaces_needed(self.contexts.len(), configured);
        if self.render_texture_count != configured {
            tracing::debug!(
                contexts = self.contexts.len(),
                configured,
                render_texture_count = self.render_texture_count,
                "grew mask surface count to hold every mask group"
            );
        }

        tracing::debug!(
            contexts = self.contexts.len(),
            render_texture_count = self.render_texture_count,
            "clipping manager initialized"
        );
    }

    /// Context clipping by exactly the given set of mask drawables, if any.
    pub fn find_same_clip(&self, mask_indices: &[usize]) -> Option<ContextId> {
        self.contexts
            .iter()
            .find(|c| c.signature().matches(mask_indices))
            .map(ClippingContext::id)
    }

    /// Assigns surface, channel and tile to the first `using_clip_count` in-use contexts.
    /// Contexts not in use are parked on the exclusive slot.
    pub fn setup_layout_bounds(&mut self, using_clip_count: usize) {
        if using_clip_count == 0 {
            return;
        }
        let slots = ChannelAllocator::new(self.render_texture_count).layout(using_clip_count);
        let mut slots = slots.into_iter();
        for ctx in &mut self.contexts {
            let slot = if ctx.is_using {
                slots.next().unwrap_or_else(LayoutSlot::exclusive)
            } else {
                LayoutSlot::exclusive()
            };
            ctx.apply_slot(slot);
        }
    }

    /// Recomputes the model-space bounds of everything `id` clips.
    ///
    /// When nothing usable remains the bounds collapse to [`Rect::ZERO`] and the context is
    /// marked unused for this frame.
    pub fn calc_clipped_total_bounds(&mut self, model: &Model, id: ContextId) {
        let kind = self.kind;
        let Some(ctx) = self.contexts.get_mut(id.index()) else {
            return;
        };
        match clipped_total_bounds(model, kind, ctx.clipped_objects()) {
            Some(bounds) => {
                ctx.all_clipped_drawables_bounds = bounds;
                ctx.is_using = true;
            }
            None => {
                ctx.all_clipped_drawables_bounds = Rect::ZERO;
                ctx.is_using = false;
            }
        }
    }

    fn refresh_bounds(&mut self, model: &Model) -> usize {
        for i in 0..self.contexts.len() {
            self.calc_clipped_total_bounds(model, ContextId(i));
        }
        self.contexts.iter().filter(|c| c.is_using).count()
    }

    /// Per-frame layout for shared mask surfaces. Returns the number of contexts in use.
    ///
    /// `mvp` is only consulted for the offscreen kind, whose consumers sample in clip space.
    #[tracing::instrument(skip(self, model))]
    pub fn setup_clipping_context(
        &mut self,
        model: &Model,
        right_handed: bool,
        mvp: Affine,
    ) -> usize {
        let using = self.refresh_bounds(model);
        if using == 0 {
            return 0;
        }
        self.setup_layout_bounds(using);

        let kind = self.kind;
        for ctx in self.contexts.iter_mut().filter(|c| c.is_using) {
            let (bounds, scale_x, scale_y) =
                fit_to_layout(ctx.all_clipped_drawables_bounds, ctx.layout_bounds);
            let m =
                create_matrix_for_mask(right_handed, ctx.layout_bounds, scale_x, scale_y, bounds);
            apply_matrices(ctx, m, kind, mvp);
        }
        using
    }

    /// Per-frame layout where every mask owns the whole of surface 0, channel R, and is drawn
    /// right before its consumer. Returns the number of contexts in use.
    #[tracing::instrument(skip(self, model))]
    pub fn setup_matrix_for_high_precision(
        &mut self,
        model: &Model,
        right_handed: bool,
        mvp: Affine,
    ) -> usize {
        let using = self.refresh_bounds(model);
        if using == 0 {
            return 0;
        }

        let kind = self.kind;
        let mask_size = self.mask_buffer_size.as_vec2();
        for ctx in &mut self.contexts {
            ctx.apply_slot(LayoutSlot::exclusive());
            if !ctx.is_using {
                continue;
            }
            let (bounds, scale_x, scale_y) = high_precision_scale(
                ctx.all_clipped_drawables_bounds,
                ctx.layout_bounds,
                model.pixels_per_unit,
                mask_size,
            );
            let m =
                create_matrix_for_mask(right_handed, ctx.layout_bounds, scale_x, scale_y, bounds);
            apply_matrices(ctx, m, kind, mvp);
        }
        using
    }

    pub fn mask_binding(&self, id: ContextId) -> Option<MaskBinding> {
        self.context(id).filter(|c| c.is_using).map(ClippingContext::binding)
    }

    /// Mask rasterization for one context, or `None` if the context is not in use this frame.
    pub fn mask_pass(&self, model: &Model, id: ContextId, clear: bool) -> Option<MaskPass> {
        let ctx = self.context(id).filter(|c| c.is_using)?;
        let drawables = ctx
            .mask_indices()
            .iter()
            .copied()
            .filter(|&i| model.drawables.get(i).is_some_and(|d| d.vertex_positions_changed))
            .collect();
        Some(MaskPass {
            kind: self.kind,
            buffer_index: ctx.buffer_index,
            clear,
            context: ctx.id(),
            binding: ctx.binding(),
            drawables,
        })
    }

    /// Every mask rasterization for the frame, grouped by surface.
    ///
    /// Each surface is cleared exactly once, by its first pass. All of these must be issued
    /// before any draw that samples the mask surfaces.
    pub fn build_mask_passes(&self, model: &Model) -> Vec<MaskPass> {
        let mut passes = self
            .contexts
            .iter()
            .filter_map(|c| self.mask_pass(model, c.id(), false))
            .collect::<Vec<_>>();
        passes.sort_by_key(|p| p.buffer_index);

        let mut cleared = vec![false; self.render_texture_count];
        for pass in &mut passes {
            if let Some(done) = cleared.get_mut(pass.buffer_index)
                && !*done
            {
                *done = true;
                pass.clear = true;
            }
        }
        passes
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// All contexts, in discovery order. Only those in use are rasterized.
    pub fn contexts_for_mask(&self) -> &[ClippingContext] {
        &self.contexts
    }

    /// Context per object index of the managed kind; `None` for unclipped objects.
    pub fn contexts_for_draw(&self) -> &[Option<ContextId>] {
        &self.context_for_draw
    }

    pub fn context(&self, id: ContextId) -> Option<&ClippingContext> {
        self.contexts.get(id.index())
    }

    /// Context clipping object `index` of the managed kind.
    pub fn context_for(&self, index: usize) -> Option<&ClippingContext> {
        self.context_for_draw
            .get(index)
            .copied()
            .flatten()
            .and_then(|id| self.context(id))
    }

    pub fn render_texture_count(&self) -> usize {
        self.render_texture_count
    }

    pub fn clipping_mask_buffer_size(&self) -> PixelSize {
        self.mask_buffer_size
    }

    pub fn set_clipping_mask_buffer_size(&mut self, size: PixelSize) {
        self.mask_buffer_size = size;
    }

    pub fn channel_flag(&self, channel: ColorChannel) -> [f32; 4] {
        channel.flag()
    }
}

fn apply_matrices(ctx: &mut ClippingContext, m: MaskMatrices, kind: ObjectKind, mvp: Affine) {
    ctx.matrix_for_mask = m.for_mask;
    ctx.matrix_for_draw = m.for_draw;
    if kind != ObjectKind::Offscreen {
        return;
    }
    let det = mvp.determinant();
    if det == 0.0 || !det.is_finite() {
        tracing::warn!(
            context = ctx.id().index(),
            "offscreen mvp is not invertible; sampling transform left in model space"
        );
        return;
    }
    ctx.matrix_for_draw = m.for_draw * mvp.inverse();
}

#[cfg(test)]
#[path = "../../tests/unit/clipping/manager.rs"]
mod tests;
