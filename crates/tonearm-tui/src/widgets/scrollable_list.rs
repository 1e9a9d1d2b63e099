//! Viewport trackers shared by every list-like pane.
//!
//! `CursorList` tracks a highlighted row inside a window of `height` rows;
//! `ScrollList` only tracks the window. Neither owns the items: panes keep
//! their own `Vec` and call `rebuild(len)` whenever it changes.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorList {
    count: usize,
    top: usize,
    selected: usize,
    height: usize,
    /// Row of the externally "current" item (the playing song, say).
    pub playing: Option<usize>,
}

impl CursorList {
    pub fn new(height: usize) -> Self {
        Self {
            count: 0,
            top: 0,
            selected: 0,
            height: height.max(1),
            playing: None,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bound an index to `[0, count-1]` (0 when empty).
    pub fn clamp(&self, n: usize) -> usize {
        n.min(self.count.saturating_sub(1))
    }

    /// Item indices currently on screen.
    pub fn visible(&self) -> Range<usize> {
        self.top.min(self.count)..(self.top + self.height).min(self.count)
    }

    /// Item count changed: keep the window and selection where they were,
    /// pulled back inside the list.
    pub fn rebuild(&mut self, count: usize) {
        self.count = count;
        self.top = self.clamp(self.top);
        self.selected = self.clamp(self.selected);
        if let Some(p) = self.playing {
            if p >= count {
                self.playing = None;
            }
        }
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height.max(1);
        self.top = self.clamp(self.top);
        self.selected = self.clamp(
            self.selected
                .min(self.top + self.height - 1)
                .max(self.top),
        );
    }

    pub fn line_down(&mut self) {
        if self.selected + 1 < self.count {
            self.selected += 1;
            if self.selected - self.top == self.height {
                self.top += 1;
            }
        }
    }

    pub fn line_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.top {
                self.top -= 1;
            }
        }
    }

    pub fn page_down(&mut self) {
        if self.count == 0 {
            return;
        }
        let h = self.height;
        if self.selected + h < self.count {
            self.selected += h;
            self.top = (self.top + h).min(self.count - h);
        } else {
            self.selected = self.count - 1;
            self.top = self.count.saturating_sub(h);
        }
    }

    pub fn page_up(&mut self) {
        let h = self.height;
        if self.selected < h {
            self.selected = 0;
            self.top = 0;
        } else {
            self.selected -= h;
            self.top = self.top.saturating_sub(h);
        }
    }

    pub fn select_top(&mut self) {
        self.selected = self.clamp(self.top);
    }

    pub fn select_middle(&mut self) {
        self.selected = self.clamp(self.top + self.height / 2);
    }

    pub fn select_bottom(&mut self) {
        self.selected = self.clamp(self.top + self.height - 1);
    }

    pub fn to_first(&mut self) {
        self.top = 0;
        self.selected = 0;
    }

    pub fn to_last(&mut self) {
        self.selected = self.count.saturating_sub(1);
        self.top = self.count.saturating_sub(self.height);
    }

    /// Center the window on `pos` and select it.
    pub fn locate(&mut self, pos: usize) {
        let pos = self.clamp(pos);
        self.top = pos.saturating_sub(self.height / 2);
        self.selected = pos;
    }

    /// Select `pos`, scrolling only when it is off screen.
    pub fn select(&mut self, pos: usize) {
        let pos = self.clamp(pos);
        if pos < self.top || pos >= self.top + self.height {
            self.locate(pos);
        } else {
            self.selected = pos;
        }
    }
}

/// Window-only variant for read-only text panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollList {
    count: usize,
    top: usize,
    height: usize,
}

impl ScrollList {
    pub fn new(height: usize) -> Self {
        Self {
            count: 0,
            top: 0,
            height: height.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn max_top(&self) -> usize {
        self.count.saturating_sub(self.height)
    }

    pub fn visible(&self) -> Range<usize> {
        self.top.min(self.count)..(self.top + self.height).min(self.count)
    }

    pub fn rebuild(&mut self, count: usize) {
        self.count = count;
        self.top = self.top.min(self.max_top());
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height.max(1);
        self.top = self.top.min(self.max_top());
    }

    pub fn line_down(&mut self) {
        if self.top < self.max_top() {
            self.top += 1;
        }
    }

    pub fn line_up(&mut self) {
        self.top = self.top.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        self.top = (self.top + self.height).min(self.max_top());
    }

    pub fn page_up(&mut self) {
        self.top = self.top.saturating_sub(self.height);
    }

    pub fn to_first(&mut self) {
        self.top = 0;
    }

    pub fn to_last(&mut self) {
        self.top = self.max_top();
    }

    /// Center `pos` in the window, as far as the list allows.
    pub fn locate(&mut self, pos: usize) {
        self.top = pos.saturating_sub(self.height / 2).min(self.max_top());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(count: usize, height: usize) -> CursorList {
        let mut l = CursorList::new(height);
        l.rebuild(count);
        l
    }

    fn assert_window(l: &CursorList) {
        if l.count() == 0 {
            assert_eq!((l.top(), l.selected()), (0, 0));
            return;
        }
        assert!(l.selected() < l.count(), "{l:?}");
        assert!(l.top() <= l.selected(), "{l:?}");
        assert!(l.selected() <= l.top() + l.height() - 1, "{l:?}");
        if l.count() > l.height() {
            assert!(l.top() <= l.count() - l.height(), "{l:?}");
        }
    }

    #[derive(Debug, Clone)]
    enum Move {
        LineDown,
        LineUp,
        PageDown,
        PageUp,
        Top,
        Middle,
        Bottom,
        First,
        Last,
    }

    fn any_move() -> impl Strategy<Value = Move> {
        prop_oneof![
            Just(Move::LineDown),
            Just(Move::LineUp),
            Just(Move::PageDown),
            Just(Move::PageUp),
            Just(Move::Top),
            Just(Move::Middle),
            Just(Move::Bottom),
            Just(Move::First),
            Just(Move::Last),
        ]
    }

    proptest! {
        #[test]
        fn prop_movement_keeps_selection_in_window(
            count in 0usize..200,
            height in 1usize..40,
            moves in proptest::collection::vec(any_move(), 0..80),
        ) {
            let mut l = list(count, height);
            for m in moves {
                match m {
                    Move::LineDown => l.line_down(),
                    Move::LineUp => l.line_up(),
                    Move::PageDown => l.page_down(),
                    Move::PageUp => l.page_up(),
                    Move::Top => l.select_top(),
                    Move::Middle => l.select_middle(),
                    Move::Bottom => l.select_bottom(),
                    Move::First => l.to_first(),
                    Move::Last => l.to_last(),
                }
                assert_window(&l);
            }
        }

        #[test]
        fn prop_locate_centers(count in 1usize..500, height in 1usize..60, pos in 0usize..500) {
            let mut l = list(count, height);
            let pos = pos % count;
            l.locate(pos);
            prop_assert_eq!(l.selected(), pos);
            prop_assert_eq!(l.top(), pos.saturating_sub(height / 2));
            prop_assert!(l.selected() <= l.top() + l.height() - 1);
        }

        #[test]
        fn prop_scroll_top_stays_in_range(
            count in 0usize..200,
            height in 1usize..40,
            moves in proptest::collection::vec(0u8..6, 0..60),
        ) {
            let mut s = ScrollList::new(height);
            s.rebuild(count);
            for m in moves {
                match m {
                    0 => s.line_down(),
                    1 => s.line_up(),
                    2 => s.page_down(),
                    3 => s.page_up(),
                    4 => s.to_last(),
                    _ => s.locate(count / 2),
                }
                prop_assert!(s.top() <= count.saturating_sub(height));
            }
        }
    }

    #[test]
    fn test_empty_list_is_inert() {
        let mut l = list(0, 5);
        l.line_down();
        l.page_down();
        l.page_up();
        l.to_last();
        l.select_bottom();
        assert_eq!((l.top(), l.selected()), (0, 0));
        assert!(l.visible().is_empty());
    }

    #[test]
    fn test_line_down_scrolls_at_bottom_edge() {
        let mut l = list(10, 3);
        l.line_down();
        l.line_down();
        assert_eq!((l.top(), l.selected()), (0, 2));
        l.line_down();
        assert_eq!((l.top(), l.selected()), (1, 3));
    }

    #[test]
    fn test_page_up_near_top_snaps_to_zero() {
        let mut l = list(50, 10);
        l.locate(7);
        l.page_up();
        assert_eq!((l.top(), l.selected()), (0, 0));
    }

    #[test]
    fn test_page_down_overshoot_clamps_to_end() {
        let mut l = list(25, 10);
        l.page_down();
        assert_eq!((l.top(), l.selected()), (10, 10));
        l.page_down();
        assert_eq!((l.top(), l.selected()), (15, 20));
        l.page_down();
        assert_eq!((l.top(), l.selected()), (15, 24));
    }

    #[test]
    fn test_select_middle_and_bottom_clamp_to_count() {
        let mut l = list(4, 10);
        l.select_middle();
        assert_eq!(l.selected(), 3);
        l.to_first();
        l.select_bottom();
        assert_eq!(l.selected(), 3);
    }

    #[test]
    fn test_shrinking_list_pulls_selection_back() {
        let mut l = list(30, 10);
        l.to_last();
        l.playing = Some(29);
        l.rebuild(12);
        assert_eq!(l.selected(), 11);
        assert!(l.top() <= l.selected());
        assert_eq!(l.playing, None);
    }

    #[test]
    fn test_resize_keeps_selection_visible() {
        let mut l = list(100, 20);
        l.select_bottom();
        assert_eq!(l.selected(), 19);
        l.resize(5);
        assert_eq!(l.top(), 0);
        assert_eq!(l.selected(), 4);
        l.resize(0);
        assert_eq!(l.height(), 1);
        assert_window(&l);
    }

    #[test]
    fn test_scroll_locate_clamps_to_tail() {
        let mut s = ScrollList::new(10);
        s.rebuild(30);
        s.locate(28);
        assert_eq!(s.top(), 20);
        s.locate(3);
        assert_eq!(s.top(), 0);
        s.locate(15);
        assert_eq!(s.top(), 10);
    }
}
