use crate::clipping::channel::{ColorChannel, LayoutSlot};
use crate::foundation::core::{Affine, Rect};
use smallvec::SmallVec;

/// Canonical, order-independent set of mask drawable indices.
///
/// Stored sorted and deduplicated, so two signatures are equal exactly when their sets are.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MaskSignature(SmallVec<[usize; 4]>);

impl MaskSignature {
    /// Returns `None` for an empty index list; a mask group always has at least one member.
    pub fn new(indices: &[usize]) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }
        let mut v: SmallVec<[usize; 4]> = indices.iter().copied().collect();
        v.sort_unstable();
        v.dedup();
        Some(Self(v))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set equality against an arbitrary (unsorted, possibly repeating) index list.
    pub fn matches(&self, indices: &[usize]) -> bool {
        if indices.is_empty() {
            return false;
        }
        indices.iter().all(|i| self.0.binary_search(i).is_ok())
            && self.0.iter().all(|m| indices.contains(m))
    }
}

/// Index of a context inside its [`crate::ClippingManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub usize);

impl ContextId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One mask group: which surface/channel/tile it is rasterized into and how to reach it.
///
/// Layout, bounds and matrices are recomputed every frame; the signature and the list of
/// clipped objects only change on re-initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct ClippingContext {
    id: ContextId,
    signature: MaskSignature,
    clipped_objects: Vec<usize>,
    pub(crate) is_using: bool,
    pub(crate) buffer_index: usize,
    pub(crate) channel: ColorChannel,
    pub(crate) layout_bounds: Rect,
    pub(crate) all_clipped_drawables_bounds: Rect,
    pub(crate) matrix_for_mask: Affine,
    pub(crate) matrix_for_draw: Affine,
}

impl ClippingContext {
    pub(crate) fn new(id: ContextId, signature: MaskSignature) -> Self {
        let slot = LayoutSlot::exclusive();
        Self {
            id,
            signature,
            clipped_objects: Vec::new(),
            is_using: true,
            buffer_index: slot.buffer_index,
            channel: slot.channel,
            layout_bounds: slot.bounds,
            all_clipped_drawables_bounds: Rect::ZERO,
            matrix_for_mask: Affine::IDENTITY,
            matrix_for_draw: Affine::IDENTITY,
        }
    }

    pub(crate) fn add_clipped_object(&mut self, index: usize) {
        self.clipped_objects.push(index);
    }

    pub(crate) fn apply_slot(&mut self, slot: LayoutSlot) {
        self.buffer_index = slot.buffer_index;
        self.channel = slot.channel;
        self.layout_bounds = slot.bounds;
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn signature(&self) -> &MaskSignature {
        &self.signature
    }

    /// Mask drawables whose union forms this stencil.
    pub fn mask_indices(&self) -> &[usize] {
        self.signature.as_slice()
    }

    /// Objects (of the manager's kind) drawn through this mask, in model order.
    pub fn clipped_objects(&self) -> &[usize] {
        &self.clipped_objects
    }

    /// `false` when the clipped geometry collapsed this frame; the mask is then skipped and
    /// consumers draw unclipped.
    pub fn is_using(&self) -> bool {
        self.is_using
    }

    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    pub fn channel(&self) -> ColorChannel {
        self.channel
    }

    pub fn layout_bounds(&self) -> Rect {
        self.layout_bounds
    }

    pub fn all_clipped_drawables_bounds(&self) -> Rect {
        self.all_clipped_drawables_bounds
    }

    pub fn matrix_for_mask(&self) -> Affine {
        self.matrix_for_mask
    }

    pub fn matrix_for_draw(&self) -> Affine {
        self.matrix_for_draw
    }

    pub fn binding(&self) -> MaskBinding {
        MaskBinding {
            buffer_index: self.buffer_index,
            channel: self.channel,
            channel_flag: self.channel.flag(),
            layout_bounds: self.layout_bounds,
            matrix_for_mask: self.matrix_for_mask,
            matrix_for_draw: self.matrix_for_draw,
        }
    }
}

/// Everything a mask or consumer shader needs about one context, by value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskBinding {
    pub buffer_index: usize,
    pub channel: ColorChannel,
    pub channel_flag: [f32; 4],
    pub layout_bounds: Rect,
    pub matrix_for_mask: Affine,
    pub matrix_for_draw: Affine,
}

#[cfg(test)]
#[path = "../../tests/unit/clipping/context.rs"]
mod tests;
