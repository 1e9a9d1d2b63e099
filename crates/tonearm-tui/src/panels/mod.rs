//! Concrete panels plus the key handling and row drawing they share.

pub mod artist_album;
pub mod bars;
pub mod database;
pub mod help;
pub mod info;
pub mod lyrics;
pub mod output;
pub mod queue;
pub mod search;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::action::{Action, PromptKind};
use crate::keymap::KeyAction;
use crate::panel::{Input, TickContext};
use crate::search::{self as finder, Seek};
use crate::theme::{style_default, style_playing, style_selected, style_selected_playing};
use crate::widgets::scrollable_list::{CursorList, ScrollList};

/// Cursor movement keys. Returns true when the input was one of them.
pub(crate) fn move_cursor(list: &mut CursorList, input: Option<&Input>, ctx: &TickContext) -> bool {
    let moves: [(KeyAction, fn(&mut CursorList)); 9] = [
        (KeyAction::LineDn, CursorList::line_down),
        (KeyAction::LineUp, CursorList::line_up),
        (KeyAction::PageDn, CursorList::page_down),
        (KeyAction::PageUp, CursorList::page_up),
        (KeyAction::Top, CursorList::select_top),
        (KeyAction::Middle, CursorList::select_middle),
        (KeyAction::Bottom, CursorList::select_bottom),
        (KeyAction::First, CursorList::to_first),
        (KeyAction::Last, CursorList::to_last),
    ];
    for (action, apply) in moves {
        if ctx.pressed(input, action) {
            apply(list);
            return true;
        }
    }
    false
}

/// Viewport keys for read-only panes.
pub(crate) fn scroll(list: &mut ScrollList, input: Option<&Input>, ctx: &TickContext) -> bool {
    let moves: [(KeyAction, fn(&mut ScrollList)); 6] = [
        (KeyAction::LineDn, ScrollList::line_down),
        (KeyAction::LineUp, ScrollList::line_up),
        (KeyAction::PageDn, ScrollList::page_down),
        (KeyAction::PageUp, ScrollList::page_up),
        (KeyAction::First, ScrollList::to_first),
        (KeyAction::Last, ScrollList::to_last),
    ];
    for (action, apply) in moves {
        if ctx.pressed(input, action) {
            apply(list);
            return true;
        }
    }
    false
}

/// Find keys. Opening a prompt is the controller's job; repeats and a
/// submitted term run the search here. `None` when the input was not a
/// find key; `titles` is only built when it was.
pub(crate) fn find<S: AsRef<str>>(
    list: &mut CursorList,
    titles: impl FnOnce() -> Vec<S>,
    input: Option<&Input>,
    ctx: &mut TickContext,
) -> Option<Vec<Action>> {
    let seek = match input {
        Some(Input::Submit(PromptKind::FindDown | PromptKind::FindUp, _)) => Seek::Repeat,
        _ if ctx.pressed(input, KeyAction::SearchDn) => {
            return Some(vec![Action::Prompt(PromptKind::FindDown)])
        }
        _ if ctx.pressed(input, KeyAction::SearchUp) => {
            return Some(vec![Action::Prompt(PromptKind::FindUp)])
        }
        _ if ctx.pressed(input, KeyAction::SearchNext) => Seek::Repeat,
        _ if ctx.pressed(input, KeyAction::SearchPrev) => Seek::Reverse,
        _ => return None,
    };
    let state = ctx.search;
    finder::find(list, &titles(), &state.term, state.direction, seek, ctx.mailbox);
    Some(Vec::new())
}

/// Truncate to `width` columns.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// `left` and `right` on one row of `width` columns, right flush.
pub(crate) fn spread(left: &str, right: &str, width: usize) -> String {
    let rw = right.width();
    let left = fit(left, width.saturating_sub(rw + 1));
    let gap = width.saturating_sub(left.width() + rw);
    format!("{left}{}{right}", " ".repeat(gap))
}

/// Style of a cursor-list row.
pub(crate) fn row_style(selected: bool, playing: bool) -> Style {
    match (selected, playing) {
        (true, true) => style_selected_playing(),
        (true, false) => style_selected(),
        (false, true) => style_playing(),
        (false, false) => style_default(),
    }
}

/// Draw the visible rows of `list`; `row` builds the content of item `i`.
pub(crate) fn draw_rows<'a>(
    frame: &mut Frame,
    area: Rect,
    list: &CursorList,
    mut row: impl FnMut(usize, usize) -> Vec<Span<'a>>,
) {
    let width = area.width as usize;
    let lines: Vec<Line> = list
        .visible()
        .map(|i| {
            let style = row_style(i == list.selected(), list.playing == Some(i));
            let mut spans = row(i, width);
            let used: usize = spans.iter().map(|s| s.content.width()).sum();
            if used < width {
                spans.push(Span::raw(" ".repeat(width - used)));
            }
            Line::from(spans).style(style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
