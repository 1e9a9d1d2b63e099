//! Help panel, generated from the live keymap.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::{Action, PanelId};
use crate::keymap::{KeyAction, Keymap};
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{fit, scroll};
use crate::theme::{style_default, style_heading, style_muted};
use crate::widgets::scrollable_list::ScrollList;

use KeyAction as A;

const SECTIONS: &[(&str, &[KeyAction])] = &[
    (
        "Global",
        &[
            A::VolDn, A::VolUp, A::Pause, A::Stop, A::Next, A::Prev, A::SeekB, A::SeekF,
            A::SeekBp, A::SeekFp, A::Consume, A::Random, A::Repeat, A::Single, A::SavePl,
            A::LoadPl, A::Quit,
        ],
    ),
    (
        "Panes",
        &[
            A::PaneHelp, A::PaneQueue, A::PaneDatabase, A::PaneLyrics, A::PaneArtistAlbum,
            A::PaneSearch, A::PaneInfo, A::PaneOutput,
        ],
    ),
    (
        "Movement",
        &[
            A::LineDn, A::LineUp, A::PageDn, A::PageUp, A::Top, A::Middle, A::Bottom, A::First,
            A::Last,
        ],
    ),
    (
        "Find",
        &[A::SearchDn, A::SearchUp, A::SearchNext, A::SearchPrev],
    ),
    (
        "Queue",
        &[
            A::Play, A::Locate, A::Lock, A::Add, A::Clear, A::Delete, A::SwapDn, A::SwapUp,
            A::Shuffle, A::DbLocate, A::Rate0, A::Rate1, A::Rate2, A::Rate3, A::Rate4, A::Rate5,
        ],
    ),
    (
        "Database",
        &[A::Play, A::Parent, A::Root, A::Add, A::Delete, A::Update, A::DbLocate],
    ),
    ("Lyrics", &[A::Locate, A::Lock, A::SaveLyrics]),
    ("Search", &[A::Search, A::Play, A::Add, A::DbLocate]),
    ("Output", &[A::Toggle]),
];

const KEY_WIDTH: usize = 16;

enum Row {
    Head(&'static str),
    Rule,
    Binding(String, &'static str),
    Blank,
}

pub struct HelpPanel {
    scroll: ScrollList,
    rows: Vec<Row>,
}

impl HelpPanel {
    pub fn new(keymap: &Keymap, height: usize) -> Self {
        let mut rows = Vec::new();
        for (i, (head, actions)) in SECTIONS.iter().enumerate() {
            if i > 0 {
                rows.push(Row::Blank);
            }
            rows.push(Row::Head(head));
            rows.push(Row::Rule);
            for action in actions.iter() {
                if let Some(key) = keymap.key(*action) {
                    rows.push(Row::Binding(key.to_string(), action.help()));
                }
            }
        }
        let mut scroll = ScrollList::new(height);
        scroll.rebuild(rows.len());
        Self { scroll, rows }
    }

    #[cfg(test)]
    fn bindings(&self) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .filter_map(|r| match r {
                Row::Binding(k, h) => Some((k.as_str(), *h)),
                _ => None,
            })
            .collect()
    }
}

impl Panel for HelpPanel {
    fn id(&self) -> PanelId {
        PanelId::Help
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        scroll(&mut self.scroll, input, ctx);
        vec![]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let width = area.width as usize;
        let lines: Vec<Line> = self
            .scroll
            .visible()
            .map(|i| match &self.rows[i] {
                Row::Head(text) => Line::from(Span::styled(fit(text, width), style_heading())),
                Row::Rule => Line::from(Span::styled("─".repeat(width), style_muted())),
                Row::Binding(key, help) => {
                    let text = format!("{key:>w$} : {help}", w = KEY_WIDTH);
                    Line::from(Span::styled(fit(&text, width), style_default()))
                }
                Row::Blank => Line::default(),
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn resize(&mut self, height: usize) {
        self.scroll.resize(height);
    }
}
