use crate::foundation::error::{MaskpackError, MaskpackResult};
use crate::offscreen::device::SurfaceDevice;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generation-checked handle to a pooled render target.
    ///
    /// Stays valid across shrink compaction; becomes stale once its surface is destroyed.
    pub struct RenderTargetId;
}

/// Counters describing pool churn since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetPoolStats {
    pub created: u64,
    pub recreated: u64,
    pub reused: u64,
    pub destroyed: u64,
}

struct PoolEntry<S> {
    surface: S,
    width: u32,
    height: u32,
    in_use: bool,
}

/// Render targets reused across frames, grown on demand and shrunk lazily.
///
/// The pool owns every surface. Borrowers hold [`RenderTargetId`]s valid between
/// [`Self::begin_frame`] and their release; holding one across [`Self::release_stale`]
/// without releasing it first is a caller error.
pub struct RenderTargetPool<D: SurfaceDevice> {
    entries: SlotMap<RenderTargetId, PoolEntry<D::Surface>>,
    // Pool order; compaction swaps here so ids never move.
    order: Vec<RenderTargetId>,
    current_active: usize,
    previous_active_max: usize,
    has_reset_this_frame: bool,
    stats: RenderTargetPoolStats,
}

impl<D: SurfaceDevice> Default for RenderTargetPool<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SurfaceDevice> RenderTargetPool<D> {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
            current_active: 0,
            previous_active_max: 0,
            has_reset_this_frame: false,
            stats: RenderTargetPoolStats::default(),
        }
    }

    /// Marks a new frame. Re-entrant calls before [`Self::end_frame`] are no-ops, so nested or
    /// repeated model draws do not reset the peak twice.
    pub fn begin_frame(&mut self) {
        if self.has_reset_this_frame {
            return;
        }
        self.previous_active_max = 0;
        self.has_reset_this_frame = true;
    }

    pub fn end_frame(&mut self) {
        self.has_reset_this_frame = false;
    }

    pub fn has_reset_this_frame(&self) -> bool {
        self.has_reset_this_frame
    }

    /// Borrows a `width x height` target for this frame.
    ///
    /// Reuses the first free slot, recreating its surface if the size differs; otherwise a new
    /// slot is appended. A device failure is returned as-is and leaves the accounting untouched.
    pub fn acquire(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> MaskpackResult<RenderTargetId> {
        let prev_max = self.previous_active_max;
        self.current_active += 1;
        self.previous_active_max = self.previous_active_max.max(self.current_active);

        let free = self
            .order
            .iter()
            .copied()
            .find(|&id| self.entries.get(id).is_some_and(|e| !e.in_use));

        let result = match free {
            Some(id) => self.reuse_slot(device, id, width, height),
            None => self.append_slot(device, width, height),
        };
        if result.is_err() {
            self.current_active -= 1;
            self.previous_active_max = prev_max;
        }
        result
    }

    fn reuse_slot(
        &mut self,
        device: &mut D,
        id: RenderTargetId,
        width: u32,
        height: u32,
    ) -> MaskpackResult<RenderTargetId> {
        let recreated = self.resize(device, id, width, height)?;
        if let Some(e) = self.entries.get_mut(id) {
            e.in_use = true;
        }
        if !recreated {
            self.stats.reused = self.stats.reused.saturating_add(1);
        }
        Ok(id)
    }

    /// Recreates the surface of `id` at a new size, creating the new surface before the old
    /// one is destroyed. Returns whether anything was recreated.
    pub fn resize(
        &mut self,
        device: &mut D,
        id: RenderTargetId,
        width: u32,
        height: u32,
    ) -> MaskpackResult<bool> {
        let Some(e) = self.entries.get(id) else {
            return Err(MaskpackError::validation(format!(
                "unknown render target {id:?}"
            )));
        };
        if e.width == width && e.height == height {
            return Ok(false);
        }

        let surface = device.create_surface(width, height)?;
        let Some(entry) = self.entries.get_mut(id) else {
            device.destroy_surface(surface);
            return Ok(false);
        };
        let old = std::mem::replace(&mut entry.surface, surface);
        tracing::debug!(
            from_w = entry.width,
            from_h = entry.height,
            width,
            height,
            "recreated pooled render target at new size"
        );
        entry.width = width;
        entry.height = height;
        device.destroy_surface(old);
        self.stats.recreated = self.stats.recreated.saturating_add(1);
        Ok(true)
    }

    fn append_slot(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> MaskpackResult<RenderTargetId> {
        let surface = device.create_surface(width, height)?;
        let id = self.entries.insert(PoolEntry {
            surface,
            width,
            height,
            in_use: true,
        });
        self.order.push(id);
        self.stats.created = self.stats.created.saturating_add(1);
        tracing::debug!(len = self.order.len(), width, height, "pool grew");
        Ok(id)
    }

    /// Returns one target to the pool. The surface is kept for reuse.
    /// Returns `false` if `id` was not in use (or is stale).
    pub fn release(&mut self, id: RenderTargetId) -> bool {
        match self.entries.get_mut(id) {
            Some(e) if e.in_use => {
                e.in_use = false;
                self.current_active = self.current_active.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn release_all_in_use(&mut self) {
        for e in self.entries.values_mut() {
            e.in_use = false;
        }
        self.current_active = 0;
    }

    /// Shrinks the pool toward the peak usage of the current frame.
    ///
    /// Walks down from the tail to the peak: free entries are destroyed, in-use entries are
    /// first swapped with a free slot below the peak. If no such slot exists the pass stops
    /// early and keeps everything from that position down. Skipped while the frame bracket is
    /// still open or when the pool is empty.
    #[tracing::instrument(skip(self, device))]
    pub fn release_stale(&mut self, device: &mut D) {
        if self.has_reset_this_frame || self.order.is_empty() {
            return;
        }

        let peak = self.previous_active_max;
        let mut resize_to = peak.min(self.order.len());
        let mut i = self.order.len();
        while peak < i {
            let idx = i - 1;
            if self.is_in_use(self.order[idx]) {
                let swap_with = (0..peak).find(|&pos| !self.is_in_use(self.order[pos]));
                match swap_with {
                    Some(pos) => self.order.swap(pos, idx),
                    None => {
                        resize_to = i;
                        break;
                    }
                }
            }
            let id = self.order[idx];
            self.destroy_entry(device, id);
            i -= 1;
        }

        if resize_to < self.order.len() {
            tracing::debug!(from = self.order.len(), to = resize_to, "pool shrank");
        }
        self.order.truncate(resize_to);
    }

    /// Destroys every surface, e.g. after the device was lost.
    pub fn release_all(&mut self, device: &mut D) {
        let ids = std::mem::take(&mut self.order);
        for id in ids {
            self.destroy_entry(device, id);
        }
        self.entries.clear();
        self.current_active = 0;
        self.previous_active_max = 0;
    }

    fn destroy_entry(&mut self, device: &mut D, id: RenderTargetId) {
        if let Some(e) = self.entries.remove(id) {
            device.destroy_surface(e.surface);
            self.stats.destroyed = self.stats.destroyed.saturating_add(1);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: RenderTargetId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_in_use(&self, id: RenderTargetId) -> bool {
        self.entries.get(id).is_some_and(|e| e.in_use)
    }

    pub fn surface(&self, id: RenderTargetId) -> Option<&D::Surface> {
        self.entries.get(id).map(|e| &e.surface)
    }

    pub fn size_of(&self, id: RenderTargetId) -> Option<(u32, u32)> {
        self.entries.get(id).map(|e| (e.width, e.height))
    }

    /// Handles in pool order.
    pub fn ids(&self) -> &[RenderTargetId] {
        &self.order
    }

    /// Peak concurrent borrows since the last [`Self::begin_frame`] reset.
    pub fn previous_active_count(&self) -> usize {
        self.previous_active_max
    }

    pub fn current_active_count(&self) -> usize {
        self.current_active
    }

    pub fn stats(&self) -> RenderTargetPoolStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/offscreen/pool.rs"]
mod tests;
