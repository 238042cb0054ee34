use crate::foundation::core::{ObjectKind, Point};
use crate::foundation::error::{MaskpackError, MaskpackResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One mesh of a deformable model, as seen by the mask layer.
///
/// The owner refreshes `vertices` (model space) before every layout pass. The index of a
/// drawable is its position in [`Model::drawables`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    /// Drawables whose union clips this one. Empty when unclipped.
    #[serde(default)]
    pub masks: Vec<usize>,
    #[serde(default, deserialize_with = "deserialize_points")]
    pub vertices: Vec<Point>,
    #[serde(default)]
    pub render_order: i32,
    #[serde(default)]
    pub parent_part: Option<usize>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    /// Whether `vertices` were refreshed this frame. Stale mask meshes are not rasterized.
    #[serde(default = "default_true")]
    pub vertex_positions_changed: bool,
}

impl Drawable {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self {
            masks: Vec::new(),
            vertices,
            render_order: 0,
            parent_part: None,
            is_visible: true,
            vertex_positions_changed: true,
        }
    }

    pub fn with_masks(mut self, masks: impl Into<Vec<usize>>) -> Self {
        self.masks = masks.into();
        self
    }

    pub fn with_parent_part(mut self, part: usize) -> Self {
        self.parent_part = Some(part);
        self
    }

    pub fn with_render_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }
}

/// Node of the part hierarchy; drawables and offscreens hang off parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub parent: Option<usize>,
}

/// A part sub-tree rendered into a pooled surface and then composited into its parent target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offscreen {
    pub owner_part: usize,
    #[serde(default)]
    pub masks: Vec<usize>,
    #[serde(default)]
    pub render_order: i32,
}

/// Snapshot of the model data the mask layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub drawables: Vec<Drawable>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub offscreens: Vec<Offscreen>,
    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: f64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            drawables: Vec::new(),
            parts: Vec::new(),
            offscreens: Vec::new(),
            pixels_per_unit: default_pixels_per_unit(),
        }
    }
}

impl Model {
    pub fn new(drawables: Vec<Drawable>) -> Self {
        Self {
            drawables,
            ..Self::default()
        }
    }

    /// Parse and validate a model snapshot from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MaskpackResult<Self> {
        let model: Model = serde_json::from_reader(r)
            .map_err(|e| MaskpackError::serde(format!("parse model JSON: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(s: &str) -> MaskpackResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse and validate a model snapshot from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MaskpackResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MaskpackError::validation(format!("open model JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every cross-reference and reject part cycles.
    pub fn validate(&self) -> MaskpackResult<()> {
        if !(self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0) {
            return Err(MaskpackError::validation(
                "pixels_per_unit must be finite and > 0",
            ));
        }

        let drawable_count = self.drawables.len();
        let part_count = self.parts.len();

        for (i, d) in self.drawables.iter().enumerate() {
            if let Some(&m) = d.masks.iter().find(|&&m| m >= drawable_count) {
                return Err(MaskpackError::validation(format!(
                    "drawable {i} masked by unknown drawable {m}"
                )));
            }
            if let Some(p) = d.parent_part
                && p >= part_count
            {
                return Err(MaskpackError::validation(format!(
                    "drawable {i} references unknown part {p}"
                )));
            }
        }

        for (i, part) in self.parts.iter().enumerate() {
            if let Some(p) = part.parent
                && p >= part_count
            {
                return Err(MaskpackError::validation(format!(
                    "part {i} references unknown parent part {p}"
                )));
            }
            if self.ancestors(i).count() >= part_count {
                return Err(MaskpackError::validation(format!(
                    "part {i} is part of a parent cycle"
                )));
            }
        }

        for (i, o) in self.offscreens.iter().enumerate() {
            if o.owner_part >= part_count {
                return Err(MaskpackError::validation(format!(
                    "offscreen {i} owned by unknown part {}",
                    o.owner_part
                )));
            }
            if let Some(&m) = o.masks.iter().find(|&&m| m >= drawable_count) {
                return Err(MaskpackError::validation(format!(
                    "offscreen {i} masked by unknown drawable {m}"
                )));
            }
        }
        Ok(())
    }

    pub fn object_count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Drawable => self.drawables.len(),
            ObjectKind::Offscreen => self.offscreens.len(),
        }
    }

    /// Mask drawable indices of object `index` of the given kind.
    pub fn masks_of(&self, kind: ObjectKind, index: usize) -> &[usize] {
        let masks = match kind {
            ObjectKind::Drawable => self.drawables.get(index).map(|d| d.masks.as_slice()),
            ObjectKind::Offscreen => self.offscreens.get(index).map(|o| o.masks.as_slice()),
        };
        masks.unwrap_or(&[])
    }

    pub fn is_using_masking(&self, kind: ObjectKind) -> bool {
        (0..self.object_count(kind)).any(|i| !self.masks_of(kind, i).is_empty())
    }

    pub fn part_parent(&self, part: usize) -> Option<usize> {
        self.parts.get(part).and_then(|p| p.parent)
    }

    /// Strict ancestors of `part`, nearest first. Bounded by the part count so a malformed
    /// hierarchy cannot loop forever.
    pub fn ancestors(&self, part: usize) -> impl Iterator<Item = usize> + '_ {
        let mut cur = self.part_parent(part);
        let mut remaining = self.parts.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let p = cur?;
            cur = self.part_parent(p);
            Some(p)
        })
    }

    /// Whether `part` is `ancestor` or lies somewhere below it.
    pub fn is_part_within(&self, part: usize, ancestor: usize) -> bool {
        part == ancestor || self.ancestors(part).any(|p| p == ancestor)
    }

    /// Drawables that hang (directly or through child parts) under `part`, in index order.
    pub fn drawables_under_part(&self, part: usize) -> Vec<usize> {
        self.drawables
            .iter()
            .enumerate()
            .filter(|(_, d)| d.parent_part.is_some_and(|p| self.is_part_within(p, part)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Drawables whose vertices stand in for object `index` when measuring mask coverage.
    pub fn covered_drawables(&self, kind: ObjectKind, index: usize) -> Vec<usize> {
        match kind {
            ObjectKind::Drawable if index < self.drawables.len() => vec![index],
            ObjectKind::Drawable => Vec::new(),
            ObjectKind::Offscreen => self
                .offscreens
                .get(index)
                .map(|o| self.drawables_under_part(o.owner_part))
                .unwrap_or_default(),
        }
    }

    pub fn offscreen_owned_by(&self, part: usize) -> Option<usize> {
        self.offscreens.iter().position(|o| o.owner_part == part)
    }
}

fn default_true() -> bool {
    true
}

fn default_pixels_per_unit() -> f64 {
    1.0
}

fn deserialize_points<'de, D>(deserializer: D) -> Result<Vec<Point>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Arr([f64; 2]),
        Obj { x: f64, y: f64 },
    }

    let raw = Vec::<Repr>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|r| match r {
            Repr::Arr([x, y]) => Point::new(x, y),
            Repr::Obj { x, y } => Point::new(x, y),
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
