use crate::foundation::error::MaskpackResult;

/// Surface capabilities a graphics backend provides to the mask and offscreen layers.
///
/// Surfaces are fixed-size once created; resizing means destroying and creating again.
/// Creation failure is reported as [`crate::MaskpackError::Device`] and passed through
/// untouched by callers in this crate.
pub trait SurfaceDevice {
    type Surface;

    fn create_surface(&mut self, width: u32, height: u32) -> MaskpackResult<Self::Surface>;

    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Binds `surface` as the current draw destination.
    fn begin_draw(&mut self, surface: &Self::Surface);

    /// Unbinds `surface`, restoring whatever destination was bound before.
    fn end_draw(&mut self, surface: &Self::Surface);

    fn surface_size(&self, surface: &Self::Surface) -> (u32, u32);
}
