use crate::foundation::core::{Point, Rect};

/// Running min/max accumulator for axis-aligned bounds.
///
/// Non-finite coordinates are ignored so one corrupt vertex cannot poison a union.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BoundsAccumulator {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundsAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub(crate) fn add_point(&mut self, p: Point) {
        if !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub(crate) fn add_rect(&mut self, r: Rect) {
        self.add_point(Point::new(r.x0, r.y0));
        self.add_point(Point::new(r.x1, r.y1));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub(crate) fn finish(self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::new(self.min_x, self.min_y, self.max_x, self.max_y))
    }
}

pub(crate) fn has_area(r: Rect) -> bool {
    r.width() > 0.0 && r.height() > 0.0
}

pub(crate) fn ceil_div(a: usize, b: usize) -> usize {
    if b == 0 {
        return 0;
    }
    a.div_ceil(b)
}

/// `(cols, rows)` grid holding `count` cells.
///
/// Two cells sit side by side; from three on, `rows = ceil(sqrt(count))` and
/// `cols = ceil(count / rows)`, so uneven grids are taller than wide.
pub(crate) fn grid_dims(count: usize) -> (usize, usize) {
    match count {
        0 | 1 => (1, 1),
        2 => (2, 1),
        _ => {
            let mut rows = 1usize;
            while rows * rows < count {
                rows += 1;
            }
            (ceil_div(count, rows), rows)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
