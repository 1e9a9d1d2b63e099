//! Queue panel — the server's current playlist.

use ratatui::{layout::Rect, style::Style, text::Span, Frame};
use unicode_width::UnicodeWidthStr;

use tonearm_proto::protocol::{Command, Song};

use crate::action::{Action, PanelId};
use crate::keymap::KeyAction;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{draw_rows, find, fit, move_cursor};
use crate::remote::{Reply, Request};
use crate::theme::C_STARS;
use crate::widgets::progress_bar::fmt_time;
use crate::widgets::scrollable_list::CursorList;

pub struct QueuePanel {
    list: CursorList,
    songs: Vec<Song>,
    /// Playlist version the songs were fetched for.
    version: Option<u32>,
    /// Version of the listing in flight; becomes `version` on reply.
    requested: Option<u32>,
    auto_center: bool,
}

fn titles(songs: &[Song]) -> Vec<String> {
    songs.iter().map(Song::display_title).collect()
}

impl QueuePanel {
    pub fn new(height: usize) -> Self {
        Self {
            list: CursorList::new(height),
            songs: Vec::new(),
            version: None,
            requested: None,
            auto_center: false,
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[cfg(test)]
    pub fn list(&self) -> &CursorList {
        &self.list
    }

    fn set_playing(&mut self, pos: Option<usize>) {
        self.list.playing = pos.filter(|&p| p < self.songs.len());
    }

    fn delete_selected(&mut self) -> Vec<Action> {
        let sel = self.list.selected();
        if sel >= self.songs.len() {
            return vec![];
        }
        let song = self.songs.remove(sel);
        let playing = match self.list.playing {
            Some(p) if sel < p => Some(p - 1),
            Some(p) if sel == p => None,
            other => other,
        };
        self.list.rebuild(self.songs.len());
        self.list.playing = playing;
        song.id.map(|id| vec![Action::Defer(Command::DeleteId(id))]).unwrap_or_default()
    }

    fn swap_down(&mut self) -> Vec<Action> {
        let sel = self.list.selected();
        if sel + 1 >= self.songs.len() {
            return vec![];
        }
        self.songs.swap(sel, sel + 1);
        self.list.playing = match self.list.playing {
            Some(p) if p == sel => Some(sel + 1),
            Some(p) if p == sel + 1 => Some(sel),
            other => other,
        };
        self.list.line_down();
        vec![Action::Defer(Command::Swap(sel, sel + 1))]
    }

    fn swap_up(&mut self) -> Vec<Action> {
        let sel = self.list.selected();
        if sel == 0 || sel >= self.songs.len() {
            return vec![];
        }
        self.songs.swap(sel - 1, sel);
        self.list.playing = match self.list.playing {
            Some(p) if p == sel - 1 => Some(sel),
            Some(p) if p == sel => Some(sel - 1),
            other => other,
        };
        self.list.line_up();
        vec![Action::Defer(Command::Swap(sel, sel - 1))]
    }

    /// Rate the playing song. 0 removes the rating.
    fn rate(&mut self, rating: u8) -> Vec<Action> {
        let Some(song) = self.list.playing.and_then(|p| self.songs.get_mut(p)) else {
            return vec![];
        };
        song.rating = rating;
        let uri = song.file.clone();
        let name = "rating".to_string();
        let cmd = if rating == 0 {
            Command::StickerDelete { uri, name }
        } else {
            Command::StickerSet {
                uri,
                name,
                value: rating.to_string(),
            }
        };
        vec![Action::run(cmd)]
    }
}

impl Panel for QueuePanel {
    fn id(&self) -> PanelId {
        PanelId::Queue
    }

    fn sync(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        let status = &ctx.snapshot.status;
        self.set_playing(status.song);
        if self.version == Some(status.playlist) {
            return vec![];
        }
        self.requested = Some(status.playlist);
        vec![Action::Query(Request::PlaylistInfo)]
    }

    fn on_reply(&mut self, reply: Reply, ctx: &mut TickContext) -> Vec<Action> {
        match reply {
            Reply::Songs(songs) => {
                self.version = self.requested.take();
                self.songs = songs;
                self.list.rebuild(self.songs.len());
                self.set_playing(ctx.snapshot.status.song);
                if ctx.rate_songs && !self.songs.is_empty() {
                    let uris = self.songs.iter().map(|s| s.file.clone()).collect();
                    return vec![Action::Query(Request::Ratings(uris))];
                }
            }
            Reply::Ratings(ratings) if ratings.len() == self.songs.len() => {
                for (song, rating) in self.songs.iter_mut().zip(ratings) {
                    song.rating = rating;
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_failure(&mut self, message: &str, ctx: &mut TickContext) {
        self.requested = None;
        ctx.mailbox.post_error(message);
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        let mut actions = vec![];
        if move_cursor(&mut self.list, input, ctx) {
        } else if let Some(found) = find(&mut self.list, || titles(&self.songs), input, ctx) {
            actions = found;
        } else if ctx.pressed(input, KeyAction::Locate) {
            if let Some(p) = self.list.playing {
                self.list.locate(p);
            }
        } else if ctx.pressed(input, KeyAction::Lock) {
            self.auto_center = !self.auto_center;
        } else if ctx.pressed(input, KeyAction::Play) {
            if let Some(id) = self.songs.get(self.list.selected()).and_then(|s| s.id) {
                actions.push(Action::run(Command::PlayId(id)));
            }
        } else if ctx.pressed(input, KeyAction::Add) {
            actions.push(Action::run(Command::Add(String::new())));
        } else if ctx.pressed(input, KeyAction::Clear) {
            self.songs.clear();
            self.list.rebuild(0);
            actions.push(Action::run(Command::Clear));
        } else if ctx.pressed(input, KeyAction::Delete) {
            actions = self.delete_selected();
        } else if ctx.pressed(input, KeyAction::SwapDn) {
            actions = self.swap_down();
        } else if ctx.pressed(input, KeyAction::SwapUp) {
            actions = self.swap_up();
        } else if ctx.pressed(input, KeyAction::Shuffle) {
            actions.push(Action::run(Command::Shuffle));
        } else if ctx.pressed(input, KeyAction::DbLocate) {
            if let Some(song) = self.songs.get(self.list.selected()) {
                ctx.mailbox.database_locate = Some(song.file.clone());
            }
        } else if let Some(rating) = input
            .and_then(Input::key)
            .and_then(|k| ctx.keymap.actions_for(k).find_map(KeyAction::rating))
        {
            if ctx.rate_songs {
                actions = self.rate(rating);
            }
        }

        ctx.mailbox.queue_selected = self.songs.get(self.list.selected()).cloned();
        actions
    }

    fn settle(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        if let Some(uri) = ctx.mailbox.queue_locate.as_deref() {
            match self.songs.iter().position(|s| s.file == uri) {
                Some(i) => self.list.locate(i),
                None => ctx.mailbox.post_message("Not found in playlist"),
            }
        }
        if self.auto_center {
            if let Some(p) = self.list.playing {
                self.list.locate(p);
            }
        }
        vec![]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let songs = &self.songs;
        draw_rows(frame, area, &self.list, |i, width| {
            let song = &songs[i];
            let title = fit(&song.display_title(), width.saturating_sub(18));
            let pad = width.saturating_sub(16).saturating_sub(title.width());
            let stars = format!("{:<5}", "*".repeat(song.rating as usize));
            let time = fmt_time(song.duration as u64);
            let tail = " ".repeat(11usize.saturating_sub(time.len()));
            vec![
                Span::raw(title),
                Span::raw(" ".repeat(pad)),
                Span::styled(stars, Style::default().fg(C_STARS)),
                Span::raw(tail),
                Span::raw(time),
            ]
        });
    }

    fn resize(&mut self, height: usize) {
        self.list.resize(height);
    }
}
