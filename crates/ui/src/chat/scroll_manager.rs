use gpui::{Bounds, Pixels, point};
use gpui_component::VirtualListScrollHandle;

/// Small delta used to ignore floating-point scroll jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

/// Keeps the transcript on its newest block after every store change.
///
/// Row heights are estimated first and measured later, so a scroll request stays armed until the
/// list height stops moving under it.
pub struct ScrollManager {
    scroll_handle: VirtualListScrollHandle,
    pending_target: Option<usize>,
    last_max_offset: Pixels,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: VirtualListScrollHandle::new(),
            pending_target: None,
            last_max_offset: Pixels::ZERO,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.scroll_handle
    }

    pub fn pending_target(&self) -> Option<usize> {
        self.pending_target
    }

    pub fn request_scroll_to(&mut self, target: Option<usize>) {
        if target.is_some() {
            self.pending_target = target;
        }
    }

    pub fn reset(&mut self) {
        self.pending_target = None;
        self.last_max_offset = Pixels::ZERO;
    }

    /// Scrolls to the tail when a request is pending. Returns whether the offset moved.
    pub fn apply_pending_scroll(&mut self) -> bool {
        if self.pending_target.is_none() {
            return false;
        }

        let max_offset = self.scroll_handle.max_offset().height;
        let current_x = self.scroll_handle.offset().x;
        self.scroll_handle
            .set_offset(point(current_x, tail_offset(max_offset)));

        let settled = !pixels_changed(max_offset, self.last_max_offset);
        self.last_max_offset = max_offset;
        if settled {
            self.pending_target = None;
        }
        true
    }

    pub fn bounds(&self) -> Bounds<Pixels> {
        self.scroll_handle.bounds()
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}

/// GPUI scrolls down with negative Y offsets, so the tail sits at `-max_offset`.
fn tail_offset(max_offset: Pixels) -> Pixels {
    if max_offset > Pixels::ZERO {
        -max_offset
    } else {
        Pixels::ZERO
    }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > SCROLL_DELTA_EPSILON
}

#[cfg(test)]
mod tests {
    use gpui::px;

    use super::*;

    #[test]
    fn tail_offset_is_negative_max_or_zero() {
        assert_eq!(tail_offset(px(240.)), px(-240.));
        assert_eq!(tail_offset(Pixels::ZERO), Pixels::ZERO);
    }

    #[test]
    fn empty_requests_do_not_clear_a_pending_target() {
        let mut manager = ScrollManager::new();
        manager.request_scroll_to(Some(4));
        manager.request_scroll_to(None);
        assert_eq!(manager.pending_target(), Some(4));

        manager.reset();
        assert_eq!(manager.pending_target(), None);
    }
}
