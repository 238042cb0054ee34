//! Channel and tile packing for mask render surfaces.
//!
//! Each mask surface offers four independent color channels. Up to four mask groups per
//! surface get a whole channel each; beyond that a channel is split into a near-square grid
//! of tiles, trading per-mask resolution for capacity.

use crate::foundation::core::Rect;
use crate::foundation::math::{ceil_div, grid_dims};

/// Color channels available per mask surface.
pub const COLOR_CHANNEL_COUNT: usize = 4;
/// Mask groups one surface may hold when it is the only mask surface.
pub const CLIPPING_MASK_MAX_COUNT_ON_DEFAULT: usize = 36;
/// Mask groups one surface may hold when several mask surfaces exist.
pub const CLIPPING_MASK_MAX_COUNT_ON_MULTI_RENDER_TEXTURE: usize = 32;

/// One RGBA channel of a mask surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorChannel {
    #[default]
    R,
    G,
    B,
    A,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; COLOR_CHANNEL_COUNT] =
        [ColorChannel::R, ColorChannel::G, ColorChannel::B, ColorChannel::A];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Write-mask color selecting this channel (R = `[1, 0, 0, 0]`, ...).
    pub fn flag(self) -> [f32; 4] {
        let mut c = [0.0; 4];
        c[self.index()] = 1.0;
        c
    }
}

/// Where one mask group lands: surface, channel and tile in 0..1 texture space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSlot {
    pub buffer_index: usize,
    pub channel: ColorChannel,
    pub bounds: Rect,
}

impl LayoutSlot {
    /// Whole surface 0, channel R. Used when each mask is rendered right before its consumer.
    pub fn exclusive() -> Self {
        Self {
            buffer_index: 0,
            channel: ColorChannel::R,
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
        }
    }
}

/// Capacity of a single surface for a given mask surface count.
pub fn max_masks_per_surface(render_texture_count: usize) -> usize {
    if render_texture_count <= 1 {
        CLIPPING_MASK_MAX_COUNT_ON_DEFAULT
    } else {
        CLIPPING_MASK_MAX_COUNT_ON_MULTI_RENDER_TEXTURE
    }
}

/// Surface count able to hold `context_count` mask groups, never below `configured`.
pub fn surfaces_needed(context_count: usize, configured: usize) -> usize {
    let configured = configured.max(1);
    if context_count <= max_masks_per_surface(configured) * configured {
        return configured;
    }
    ceil_div(
        context_count,
        CLIPPING_MASK_MAX_COUNT_ON_MULTI_RENDER_TEXTURE,
    )
    .max(configured)
}

/// Packs mask groups into `(surface, channel, tile)` slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelAllocator {
    render_texture_count: usize,
}

impl ChannelAllocator {
    pub fn new(render_texture_count: usize) -> Self {
        Self {
            render_texture_count: render_texture_count.max(1),
        }
    }

    pub fn render_texture_count(&self) -> usize {
        self.render_texture_count
    }

    /// Total mask groups this allocator can place without falling back.
    pub fn capacity(&self) -> usize {
        max_masks_per_surface(self.render_texture_count) * self.render_texture_count
    }

    /// Slots for `count` mask groups, in assignment order.
    ///
    /// Groups are spread over surfaces first (`ceil(count / surfaces)` each, trailing surfaces
    /// taking one fewer), then over channels (`n / 4` each, one more for the first `n % 4`).
    /// A count above [`Self::capacity`] yields the exclusive slot for every group.
    pub fn layout(&self, count: usize) -> Vec<LayoutSlot> {
        if count == 0 {
            return Vec::new();
        }
        if count > self.capacity() {
            tracing::warn!(
                count,
                capacity = self.capacity(),
                render_texture_count = self.render_texture_count,
                "mask group count exceeds surface capacity; masks share one exclusive slot"
            );
            return vec![LayoutSlot::exclusive(); count];
        }

        let surfaces = self.render_texture_count;
        let per_surface = ceil_div(count, surfaces);
        let reduce_from = count % surfaces;

        let mut slots = Vec::with_capacity(count);
        for buffer_index in 0..surfaces {
            let mut on_surface = per_surface;
            if reduce_from > 0 && buffer_index >= reduce_from {
                on_surface -= 1;
            }
            let on_surface = on_surface.min(count - slots.len());

            let base = on_surface / COLOR_CHANNEL_COUNT;
            let extra = on_surface % COLOR_CHANNEL_COUNT;
            for channel in ColorChannel::ALL {
                let in_channel = base + usize::from(channel.index() < extra);
                for i in 0..in_channel {
                    slots.push(LayoutSlot {
                        buffer_index,
                        channel,
                        bounds: tile_bounds(in_channel, i),
                    });
                }
            }
        }
        slots
    }
}

/// Bounds of tile `i` when a channel is split into `count` tiles.
pub fn tile_bounds(count: usize, i: usize) -> Rect {
    let (cols, rows) = grid_dims(count);
    let col = (i % cols) as f64;
    let row = (i / cols) as f64;
    let w = 1.0 / cols as f64;
    let h = 1.0 / rows as f64;
    Rect::new(col * w, row * h, (col + 1.0) * w, (row + 1.0) * h)
}

#[cfg(test)]
#[path = "../../tests/unit/clipping/channel.rs"]
mod tests;
