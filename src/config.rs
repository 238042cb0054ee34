use crate::foundation::core::PixelSize;
use crate::foundation::error::{MaskpackError, MaskpackResult};
use serde::{Deserialize, Serialize};

/// Renderer-level configuration for mask buffers and offscreen targets.
///
/// Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOpts {
    /// Number of mask render surfaces per clipping manager (>= 1).
    pub mask_buffer_count: u32,
    /// Pixel size of each drawable mask surface.
    pub mask_buffer_size: PixelSize,
    /// Pixel size of each offscreen mask surface.
    pub offscreen_mask_buffer_size: PixelSize,
    /// Size requested from the pool for offscreen-composited sub-trees.
    pub model_target_size: PixelSize,
    /// Flip the Y axis of the sampling transform for right-handed targets.
    pub right_handed: bool,
    /// Render each mask right before its consumer into a full, exclusive surface.
    pub high_precision_mask: bool,
}

impl Default for RendererOpts {
    fn default() -> Self {
        Self {
            mask_buffer_count: 1,
            mask_buffer_size: PixelSize::square(256),
            offscreen_mask_buffer_size: PixelSize::square(256),
            model_target_size: PixelSize::square(1024),
            right_handed: false,
            high_precision_mask: false,
        }
    }
}

impl RendererOpts {
    pub fn with_mask_buffer_count(mut self, count: u32) -> Self {
        self.mask_buffer_count = count;
        self
    }

    pub fn with_high_precision_mask(mut self, enabled: bool) -> Self {
        self.high_precision_mask = enabled;
        self
    }

    pub fn with_right_handed(mut self, right_handed: bool) -> Self {
        self.right_handed = right_handed;
        self
    }

    pub fn validate(&self) -> MaskpackResult<()> {
        if self.mask_buffer_count == 0 {
            return Err(MaskpackError::validation("mask_buffer_count must be >= 1"));
        }
        for (name, size) in [
            ("mask_buffer_size", self.mask_buffer_size),
            ("offscreen_mask_buffer_size", self.offscreen_mask_buffer_size),
            ("model_target_size", self.model_target_size),
        ] {
            if size.is_empty() {
                return Err(MaskpackError::validation(format!(
                    "{name} must be non-zero, got {}x{}",
                    size.width, size.height
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate options from JSON.
    pub fn from_json_str(s: &str) -> MaskpackResult<Self> {
        let opts: RendererOpts = serde_json::from_str(s)
            .map_err(|e| MaskpackError::serde(format!("parse renderer options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
