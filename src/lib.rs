//! Maskpack lays out clipping masks and recycles offscreen render targets for renderers of
//! deformable 2D models.
//!
//! Drawables clipped by the same set of mask meshes share one mask group. Groups are packed
//! into the four color channels of a small number of mask surfaces, so a whole model needs a
//! handful of mask renders per frame instead of one per clipped mesh. Offscreen-composited
//! sub-trees borrow their targets from a frame-scoped pool.
//!
//! - Describe the model as a [`Model`]
//! - Drive it with a [`ModelRenderer`] (or use [`ClippingManager`] and [`RenderTargetPool`]
//!   directly)
//! - Feed each [`FramePlan`] to a [`PassBackend`]
#![forbid(unsafe_code)]

mod clipping;
mod config;
mod foundation;
mod offscreen;
mod render;
mod scene;

pub use crate::foundation::core::{Affine, ObjectKind, PixelSize, Point, Rect, Vec2};
pub use crate::foundation::error::{MaskpackError, MaskpackResult};

pub use crate::clipping::bounds::{clipped_total_bounds, drawable_bounds};
pub use crate::clipping::channel::{
    CLIPPING_MASK_MAX_COUNT_ON_DEFAULT, CLIPPING_MASK_MAX_COUNT_ON_MULTI_RENDER_TEXTURE,
    COLOR_CHANNEL_COUNT, ChannelAllocator, ColorChannel, LayoutSlot, max_masks_per_surface,
    surfaces_needed, tile_bounds,
};
pub use crate::clipping::context::{ClippingContext, ContextId, MaskBinding, MaskSignature};
pub use crate::clipping::manager::{ClippingManager, MaskPass};
pub use crate::clipping::matrix::{
    MASK_MARGIN, MaskMatrices, create_matrix_for_mask, fit_to_layout, high_precision_scale,
};
pub use crate::config::RendererOpts;
pub use crate::offscreen::cpu::{CpuSurface, CpuSurfaceDevice, rasterize_mask};
pub use crate::offscreen::device::SurfaceDevice;
pub use crate::offscreen::pool::{RenderTargetId, RenderTargetPool, RenderTargetPoolStats};
pub use crate::offscreen::target::{OffscreenRenderTarget, resolve_parent_offscreens};
pub use crate::render::passes::{PassBackend, execute_plan};
pub use crate::render::plan::{
    CompositePass, DrawMeshPass, FramePlan, OffscreenPass, Pass, PlanInputs, compile_frame,
};
pub use crate::render::renderer::ModelRenderer;
pub use crate::scene::model::{Drawable, Model, Offscreen, Part};
