//! Database search panel: `tag=value` queries.

use ratatui::{layout::Rect, text::Span, Frame};

use tonearm_proto::protocol::{Command, Song};

use crate::action::{Action, PanelId, PromptKind};
use crate::keymap::KeyAction;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{draw_rows, find, move_cursor};
use crate::remote::{Reply, Request};
use crate::widgets::scrollable_list::CursorList;

const QUERY_FORMAT: &str = "Search query format: {key}={value}";

/// Split `artist=blur` into its tag and value.
fn parse_query(query: &str) -> Option<(String, String)> {
    let (tag, value) = query.split_once('=')?;
    let tag = tag.trim();
    if tag.is_empty() {
        return None;
    }
    Some((tag.to_string(), value.trim().to_string()))
}

pub struct SearchPanel {
    list: CursorList,
    songs: Vec<Song>,
}

impl SearchPanel {
    pub fn new(height: usize) -> Self {
        Self {
            list: CursorList::new(height),
            songs: Vec::new(),
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    fn set_songs(&mut self, songs: Vec<Song>) {
        self.songs = songs;
        self.list.rebuild(self.songs.len());
        self.list.to_first();
    }

    fn selected(&self) -> Option<&Song> {
        self.songs.get(self.list.selected())
    }
}

impl Panel for SearchPanel {
    fn id(&self) -> PanelId {
        PanelId::Search
    }

    fn on_reply(&mut self, reply: Reply, ctx: &mut TickContext) -> Vec<Action> {
        if let Reply::Songs(songs) = reply {
            ctx.mailbox.post_message(format!("Found {} results", songs.len()));
            self.set_songs(songs);
        }
        vec![]
    }

    fn on_failure(&mut self, _message: &str, ctx: &mut TickContext) {
        self.set_songs(Vec::new());
        ctx.mailbox.post_error(QUERY_FORMAT);
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        let mut actions = vec![];
        if let Some(Input::Submit(PromptKind::DatabaseSearch, query)) = input {
            match parse_query(query) {
                Some((tag, value)) => actions.push(Action::Query(Request::Search { tag, value })),
                None => {
                    self.set_songs(Vec::new());
                    ctx.mailbox.post_error(QUERY_FORMAT);
                }
            }
        } else if move_cursor(&mut self.list, input, ctx) {
        } else if let Some(found) = find(
            &mut self.list,
            || self.songs.iter().map(Song::display_title).collect::<Vec<_>>(),
            input,
            ctx,
        ) {
            actions = found;
        } else if ctx.pressed(input, KeyAction::Search) {
            actions.push(Action::Prompt(PromptKind::DatabaseSearch));
        } else if ctx.pressed(input, KeyAction::Play) {
            if let Some(song) = self.selected() {
                actions.push(Action::PlayUri(song.file.clone()));
            }
        } else if ctx.pressed(input, KeyAction::Add) {
            if let Some(song) = self.selected() {
                actions.push(Action::run(Command::Add(song.file.clone())));
            }
        } else if ctx.pressed(input, KeyAction::DbLocate) {
            match self.selected() {
                Some(song) => ctx.mailbox.queue_locate = Some(song.file.clone()),
                None => ctx.mailbox.post_message("No song selected"),
            }
        }
        actions
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let songs = &self.songs;
        draw_rows(frame, area, &self.list, |i, _width| {
            vec![Span::raw(songs[i].display_title())]
        });
    }

    fn resize(&mut self, height: usize) {
        self.list.resize(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing::Harness;

    #[test]
    fn test_query_parsing() {
        assert_eq!(
            parse_query("artist = Blur"),
            Some(("artist".into(), "Blur".into()))
        );
        assert_eq!(parse_query("any=a=b"), Some(("any".into(), "a=b".into())));
        assert_eq!(parse_query("blur"), None);
        assert_eq!(parse_query("=blur"), None);
    }

    #[test]
    fn test_submit_runs_search_and_reports_count() {
        let mut h = Harness::new();
        let mut panel = SearchPanel::new(10);
        let input = Input::Submit(PromptKind::DatabaseSearch, "title=girls".into());
        assert_eq!(
            panel.local_update(Some(&input), &mut h.ctx()),
            vec![Action::Query(Request::Search {
                tag: "title".into(),
                value: "girls".into()
            })]
        );
        panel.on_reply(
            Reply::Songs(vec![Song::new("a.flac"), Song::new("b.flac")]),
            &mut h.ctx(),
        );
        assert_eq!(h.mailbox.message.as_deref(), Some("Found 2 results"));
        assert_eq!(panel.songs().len(), 2);
    }

    #[test]
    fn test_bad_query_shows_format() {
        let mut h = Harness::new();
        let mut panel = SearchPanel::new(10);
        let input = Input::Submit(PromptKind::DatabaseSearch, "nonsense".into());
        assert!(panel.local_update(Some(&input), &mut h.ctx()).is_empty());
        assert_eq!(h.mailbox.message.as_deref(), Some(QUERY_FORMAT));
    }

    #[test]
    fn test_search_key_opens_prompt() {
        let mut h = Harness::new();
        let mut panel = SearchPanel::new(10);
        let key = h.key(KeyAction::Search);
        assert_eq!(
            panel.local_update(Some(&key), &mut h.ctx()),
            vec![Action::Prompt(PromptKind::DatabaseSearch)]
        );
    }
}
