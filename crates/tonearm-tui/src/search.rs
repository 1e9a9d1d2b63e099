//! Incremental find over a pane's item titles.

use crate::mailbox::Mailbox;
use crate::widgets::scrollable_list::CursorList;

/// Which way to look relative to the stored direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// Same direction as the last explicit find.
    Repeat,
    /// Opposite direction.
    Reverse,
}

pub const HIT_BOTTOM: &str = "search hit BOTTOM, continuing at TOP";
pub const HIT_TOP: &str = "search hit TOP, continuing at BOTTOM";

/// Find the next title containing `term`, starting one step from the
/// selection and wrapping around. On a hit the list is centered on it.
pub fn find<S: AsRef<str>>(
    list: &mut CursorList,
    titles: &[S],
    term: &str,
    direction: i8,
    seek: Seek,
    mailbox: &mut Mailbox,
) -> Option<usize> {
    let count = titles.len();
    if term.is_empty() || count == 0 {
        return None;
    }
    let dr: i64 = match (seek, direction >= 0) {
        (Seek::Repeat, true) | (Seek::Reverse, false) => 1,
        _ => -1,
    };
    let n = count as i64;
    let origin = list.selected() as i64;

    for step in 1..=n {
        let raw = origin + dr * step;
        let idx = raw.rem_euclid(n) as usize;
        if titles[idx].as_ref().contains(term) {
            if raw >= n {
                mailbox.post_message(HIT_BOTTOM);
            } else if raw < 0 {
                mailbox.post_message(HIT_TOP);
            }
            list.locate(idx);
            return Some(idx);
        }
    }
    mailbox.post_message(format!("Not found: {term}"));
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_at(count: usize, sel: usize) -> CursorList {
        let mut l = CursorList::new(10);
        l.rebuild(count);
        l.locate(sel);
        l
    }

    #[test]
    fn test_wraps_past_bottom() {
        let titles = ["a", "target", "b"];
        let mut l = list_at(3, 2);
        let mut mb = Mailbox::default();
        assert_eq!(find(&mut l, &titles, "target", 1, Seek::Repeat, &mut mb), Some(1));
        assert_eq!(l.selected(), 1);
        assert_eq!(mb.message.as_deref(), Some(HIT_BOTTOM));
    }

    #[test]
    fn test_wraps_past_top_when_searching_up() {
        let titles = ["a", "b", "target", "c"];
        let mut l = list_at(4, 1);
        let mut mb = Mailbox::default();
        assert_eq!(find(&mut l, &titles, "targ", -1, Seek::Repeat, &mut mb), Some(2));
        assert_eq!(mb.message.as_deref(), Some(HIT_TOP));
    }

    #[test]
    fn test_reverse_flips_direction_without_wrap_message() {
        let titles = ["x1", "y", "x2", "y", "x3"];
        let mut l = list_at(5, 2);
        let mut mb = Mailbox::default();
        assert_eq!(find(&mut l, &titles, "x", 1, Seek::Reverse, &mut mb), Some(0));
        assert_eq!(mb.message, None);
    }

    #[test]
    fn test_not_found_keeps_position() {
        let titles = ["a", "b"];
        let mut l = list_at(2, 1);
        let mut mb = Mailbox::default();
        assert_eq!(find(&mut l, &titles, "zzz", 1, Seek::Repeat, &mut mb), None);
        assert_eq!(l.selected(), 1);
        assert_eq!(mb.message.as_deref(), Some("Not found: zzz"));
    }

    #[test]
    fn test_only_match_is_selection_itself() {
        let titles = ["a", "only"];
        let mut l = list_at(2, 1);
        let mut mb = Mailbox::default();
        // full lap lands back on the start
        assert_eq!(find(&mut l, &titles, "only", 1, Seek::Repeat, &mut mb), Some(1));
    }
}
