//! Info panel: tag sheets for the playing, queue-selected and
//! database-selected songs, followed by server statistics.

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use tonearm_proto::protocol::{Song, Stats, Subsystem};

use crate::action::{Action, PanelId};
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{fit, scroll};
use crate::remote::{Reply, Request};
use crate::session::Snapshot;
use crate::theme::{style_default, style_heading, style_muted};
use crate::widgets::progress_bar::fmt_time;
use crate::widgets::scrollable_list::ScrollList;

const KEY_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Head(&'static str),
    Rule,
    Field(String, String),
    Blank,
}

fn field(key: &str, value: impl Into<String>) -> Row {
    Row::Field(key.to_string(), value.into())
}

fn song_rows(rows: &mut Vec<Row>, song: Option<&Song>) {
    let Some(song) = song else {
        rows.push(field("", "(none)"));
        return;
    };
    for (key, tag) in [
        ("Title", "title"),
        ("Artist", "artist"),
        ("Album", "album"),
        ("Track", "track"),
        ("Genre", "genre"),
        ("Date", "date"),
    ] {
        rows.push(field(key, song.tag_or_empty(tag)));
    }
    rows.push(field("Time", fmt_time(song.duration as u64)));
    // one path component per row so long uris stay readable
    for (i, part) in song.file.split('/').enumerate() {
        let key = if i == 0 { "File" } else { "" };
        rows.push(field(key, part));
    }
}

/// `db_update` as local wall-clock time.
fn fmt_update(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn stats_rows(rows: &mut Vec<Row>, stats: &Stats) {
    rows.push(field("Songs", stats.songs.to_string()));
    rows.push(field("Artists", stats.artists.to_string()));
    rows.push(field("Albums", stats.albums.to_string()));
    rows.push(field("Uptime", fmt_time(stats.uptime)));
    rows.push(field("Playtime", fmt_time(stats.playtime)));
    rows.push(field("DB Playtime", fmt_time(stats.db_playtime)));
    rows.push(field("DB Updated", fmt_update(stats.db_update)));
}

pub struct InfoPanel {
    scroll: ScrollList,
    rows: Vec<Row>,
    queue_song: Option<Song>,
    database_uri: Option<String>,
    database_song: Option<Song>,
    /// `database_song` needs fetching on the next sync tick.
    stale: bool,
}

impl InfoPanel {
    pub fn new(height: usize) -> Self {
        Self {
            scroll: ScrollList::new(height),
            rows: Vec::new(),
            queue_song: None,
            database_uri: None,
            database_song: None,
            stale: false,
        }
    }

    fn rebuild(&mut self, snapshot: &Snapshot) {
        let mut rows = Vec::new();
        let sections = [
            ("Currently Playing", snapshot.current.as_ref()),
            ("Selected in Queue", self.queue_song.as_ref()),
            ("Selected in Database", self.database_song.as_ref()),
        ];
        for (head, song) in sections {
            rows.push(Row::Head(head));
            rows.push(Row::Rule);
            song_rows(&mut rows, song);
            rows.push(Row::Blank);
        }
        rows.push(Row::Head("MPD Statistics"));
        rows.push(Row::Rule);
        stats_rows(&mut rows, &snapshot.stats);

        self.rows = rows;
        self.scroll.rebuild(self.rows.len());
    }

    #[cfg(test)]
    fn value(&self, key: &str, nth: usize) -> Option<&str> {
        self.rows
            .iter()
            .filter_map(|r| match r {
                Row::Field(k, v) if k == key => Some(v.as_str()),
                _ => None,
            })
            .nth(nth)
    }
}

impl Panel for InfoPanel {
    fn id(&self) -> PanelId {
        PanelId::Info
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        scroll(&mut self.scroll, input, ctx);
        vec![]
    }

    fn settle(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        self.queue_song = ctx.mailbox.queue_selected.clone();
        let uri = ctx.mailbox.database_selected.clone();
        if uri != self.database_uri {
            self.database_uri = uri;
            self.database_song = None;
            self.stale = true;
        }
        if ctx.mailbox.changed(&Subsystem::Database) {
            self.stale = true;
        }

        let mut actions = vec![];
        if self.stale && ctx.syncing {
            self.stale = false;
            if let Some(uri) = &self.database_uri {
                actions.push(Action::Query(Request::ListAllInfo(uri.clone())));
            }
        }
        self.rebuild(ctx.snapshot);
        actions
    }

    fn on_reply(&mut self, reply: Reply, ctx: &mut TickContext) -> Vec<Action> {
        if let Reply::Songs(songs) = reply {
            self.database_song = songs.into_iter().next();
            self.rebuild(ctx.snapshot);
        }
        vec![]
    }

    fn on_failure(&mut self, _message: &str, _ctx: &mut TickContext) {
        self.database_song = None;
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let width = area.width as usize;
        let lines: Vec<Line> = self
            .scroll
            .visible()
            .map(|i| match &self.rows[i] {
                Row::Head(text) => Line::from(Span::styled(fit(text, width), style_heading())),
                Row::Rule => Line::from(Span::styled("─".repeat(width), style_muted())),
                Row::Field(key, value) => {
                    let text = format!("{key:>w$} : {value}", w = KEY_WIDTH);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing::Harness;

    fn tagged(file: &str, title: &str) -> Song {
        let mut s = Song::new(file);
        s.tags.insert("title".into(), vec![title.into()]);
        s.duration = 185;
        s
    }

    #[test]
    fn test_sections_follow_snapshot_and_mailbox() {
        let mut h = Harness::new();
        let mut info = InfoPanel::new(10);
        h.snapshot.current = Some(tagged("rock/blur/girls.flac", "Girls"));
        h.snapshot.stats.songs = 42;
        h.mailbox.queue_selected = Some(tagged("pop/b.flac", "Bee"));
        info.settle(&mut h.ctx());

        assert_eq!(info.value("Title", 0), Some("Girls"));
        assert_eq!(info.value("Time", 0), Some("3:05"));
        assert_eq!(info.value("File", 0), Some("rock"));
        assert_eq!(info.value("", 0), Some("blur"));
        assert_eq!(info.value("Title", 1), Some("Bee"));
        assert_eq!(info.value("Songs", 0), Some("42"));
    }

    #[test]
    fn test_database_song_fetched_once_per_selection() {
        let mut h = Harness::new();
        let mut info = InfoPanel::new(10);
        h.mailbox.database_selected = Some("rock/x.flac".into());
        assert_eq!(
            info.settle(&mut h.ctx()),
            vec![Action::Query(Request::ListAllInfo("rock/x.flac".into()))]
        );
        info.on_reply(Reply::Songs(vec![tagged("rock/x.flac", "Ex")]), &mut h.ctx());
        assert_eq!(info.value("Title", 0), Some("Ex"));
        assert!(info.settle(&mut h.ctx()).is_empty());
        assert_eq!(info.value("Title", 0), Some("Ex"));
    }

    #[test]
    fn test_selection_change_waits_for_sync_tick() {
        let mut h = Harness::new();
        let mut info = InfoPanel::new(10);
        h.syncing = false;
        h.mailbox.database_selected = Some("a.flac".into());
        assert!(info.settle(&mut h.ctx()).is_empty());
        h.syncing = true;
        assert_eq!(info.settle(&mut h.ctx()).len(), 1);
    }

    #[test]
    fn test_update_time_format() {
        assert_eq!(fmt_update(1_700_000_000).len(), "2023-11-14 22:13:20".len());
    }
}
