use crate::{
    clipping::manager::MaskPass,
    foundation::error::MaskpackResult,
    render::plan::{CompositePass, DrawMeshPass, FramePlan, OffscreenPass, Pass},
};

/// Graphics backend driven by a [`FramePlan`].
///
/// Passes arrive in plan order; GPU-side synchronization between mask writes and mask reads
/// is the backend's concern.
pub trait PassBackend {
    fn exec_mask(&mut self, pass: &MaskPass) -> MaskpackResult<()>;

    fn begin_offscreen(&mut self, pass: &OffscreenPass) -> MaskpackResult<()>;

    fn draw_mesh(&mut self, pass: &DrawMeshPass) -> MaskpackResult<()>;

    fn composite_offscreen(&mut self, pass: &CompositePass) -> MaskpackResult<()>;
}

pub fn execute_plan<B: PassBackend + ?Sized>(
    backend: &mut B,
    plan: &FramePlan,
) -> MaskpackResult<()> {
    for pass in &plan.passes {
        match pass {
            Pass::Mask(p) => backend.exec_mask(p)?,
            Pass::BeginOffscreen(p) => backend.begin_offscreen(p)?,
            Pass::DrawMesh(p) => backend.draw_mesh(p)?,
            Pass::CompositeOffscreen(p) => backend.composite_offscreen(p)?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/passes.rs"]
mod tests;
