//! Reference surface device on CPU pixmaps.
//!
//! Surfaces are premultiplied RGBA8 `vello_cpu` pixmaps. Mask passes can be rasterized with
//! [`rasterize_mask`], writing coverage into the pass's channel and tile only.

use crate::clipping::channel::ColorChannel;
use crate::clipping::manager::MaskPass;
use crate::foundation::core::{Affine, Point};
use crate::foundation::error::{MaskpackError, MaskpackResult};
use crate::offscreen::device::SurfaceDevice;
use crate::scene::model::Model;

pub struct CpuSurface {
    serial: u64,
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("serial", &self.serial)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    /// Identity of the backing allocation; a recreated surface gets a new serial.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }

    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let d = self.pixmap.data_as_u8_slice();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    pub fn channel_value(&self, x: u32, y: u32, channel: ColorChannel) -> Option<u8> {
        self.pixel(x, y).map(|p| p[channel.index()])
    }
}

/// Counts allocations and tracks the bound draw destination.
#[derive(Debug, Default)]
pub struct CpuSurfaceDevice {
    next_serial: u64,
    created: u64,
    destroyed: u64,
    bound: Vec<u64>,
}

impl CpuSurfaceDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    pub fn live_surfaces(&self) -> u64 {
        self.created.saturating_sub(self.destroyed)
    }

    /// Serial of the surface currently bound by `begin_draw`.
    pub fn bound_surface(&self) -> Option<u64> {
        self.bound.last().copied()
    }
}

impl SurfaceDevice for CpuSurfaceDevice {
    type Surface = CpuSurface;

    fn create_surface(&mut self, width: u32, height: u32) -> MaskpackResult<CpuSurface> {
        if width == 0 || height == 0 {
            return Err(MaskpackError::device(format!(
                "surface dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| MaskpackError::device(format!("surface width exceeds u16: {width}")))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| MaskpackError::device(format!("surface height exceeds u16: {height}")))?;

        self.next_serial += 1;
        self.created += 1;
        Ok(CpuSurface {
            serial: self.next_serial,
            width: width_u16,
            height: height_u16,
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
        })
    }

    fn destroy_surface(&mut self, surface: CpuSurface) {
        self.bound.retain(|&s| s != surface.serial);
        self.destroyed += 1;
    }

    fn begin_draw(&mut self, surface: &CpuSurface) {
        self.bound.push(surface.serial);
    }

    fn end_draw(&mut self, surface: &CpuSurface) {
        match self.bound.last() {
            Some(&top) if top == surface.serial => {
                self.bound.pop();
            }
            _ => tracing::warn!(
                serial = surface.serial,
                "end_draw on a surface that is not the bound destination"
            ),
        }
    }

    fn surface_size(&self, surface: &CpuSurface) -> (u32, u32) {
        (surface.width(), surface.height())
    }
}

/// Rasterizes the mask drawables of `pass` into its channel, limited to its tile.
///
/// Coverage is merged with `max`, so overlapping mask drawables form a union. The surface is
/// cleared to transparent first when the pass asks for it.
///
/// Each drawable's vertices are filled as one closed polygon, so they must be in outline
/// order. Indexed triangle meshes are not triangulated here; a mesh whose vertex list does
/// not trace its outline yields wrong coverage.
pub fn rasterize_mask(surface: &mut CpuSurface, model: &Model, pass: &MaskPass) {
    if pass.clear {
        surface.clear([0, 0, 0, 0]);
    }
    if pass.drawables.is_empty() {
        return;
    }

    let (w, h) = (surface.width, surface.height);
    let (wf, hf) = (f64::from(w), f64::from(h));
    let to_pixels = Affine::scale_non_uniform(wf / 2.0, hf / 2.0)
        * Affine::translate((1.0, 1.0))
        * pass.binding.matrix_for_mask;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(affine_to_cpu(to_pixels));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    for &i in &pass.drawables {
        let Some(d) = model.drawables.get(i) else {
            continue;
        };
        if d.vertices.len() < 3 {
            continue;
        }
        ctx.fill_path(&polygon_to_cpu(&d.vertices));
    }
    ctx.flush();
    let mut coverage = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut coverage);

    let tile = pass.binding.layout_bounds;
    let x0 = pixel_edge(tile.x0, wf);
    let x1 = pixel_edge(tile.x1, wf);
    let y0 = pixel_edge(tile.y0, hf);
    let y1 = pixel_edge(tile.y1, hf);
    let c = pass.binding.channel.index();
    let stride = usize::from(w);

    let src = coverage.data_as_u8_slice();
    let dst = surface.pixmap.data_as_u8_slice_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let i = (y * stride + x) * 4;
            dst[i + c] = dst[i + c].max(src[i + 3]);
        }
    }
}

fn pixel_edge(t: f64, size: f64) -> usize {
    (t * size).round().clamp(0.0, size) as usize
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn polygon_to_cpu(vertices: &[Point]) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for (i, p) in vertices.iter().enumerate() {
        let p = vello_cpu::kurbo::Point::new(p.x, p.y);
        if i == 0 {
            out.move_to(p);
        } else {
            out.line_to(p);
        }
    }
    out.close_path();
    out
}

#[cfg(test)]
#[path = "../../tests/unit/offscreen/cpu.rs"]
mod tests;
