//! Artist → album → song drill-down.

use ratatui::{layout::Rect, style::Style, text::Span, Frame};

use tonearm_proto::protocol::{Command, Song, Subsystem};

use crate::action::{Action, PanelId};
use crate::keymap::KeyAction;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{draw_rows, find, move_cursor};
use crate::remote::{Reply, Request};
use crate::theme::{C_DIRECTORY, C_PLAYLIST};
use crate::widgets::scrollable_list::CursorList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Artist,
    Album,
    Song,
}

fn titles(level: Level, names: &[String], songs: &[Song]) -> Vec<String> {
    match level {
        Level::Song => songs.iter().map(Song::display_title).collect(),
        _ => names.to_vec(),
    }
}

/// A drill step waiting for its listing. Nothing about the shown level
/// changes until the reply arrives.
#[derive(Debug, Clone)]
struct Pending {
    level: Level,
    artist: String,
    album: String,
    /// Name to put the cursor on once the listing arrives.
    landing: Option<String>,
}

pub struct ArtistAlbumPanel {
    list: CursorList,
    level: Level,
    artist: String,
    album: String,
    /// Artist or album names, depending on `level`.
    names: Vec<String>,
    songs: Vec<Song>,
    pending: Option<Pending>,
    loaded: bool,
}

impl ArtistAlbumPanel {
    pub fn new(height: usize) -> Self {
        Self {
            list: CursorList::new(height),
            level: Level::Artist,
            artist: String::new(),
            album: String::new(),
            names: Vec::new(),
            songs: Vec::new(),
            pending: None,
            loaded: false,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    #[cfg(test)]
    pub fn list(&self) -> &CursorList {
        &self.list
    }

    fn len(&self) -> usize {
        match self.level {
            Level::Song => self.songs.len(),
            _ => self.names.len(),
        }
    }

    fn descend(
        &mut self,
        level: Level,
        artist: String,
        album: String,
        landing: Option<String>,
    ) -> Vec<Action> {
        let req = match level {
            Level::Artist => Request::List {
                tag: "artist".into(),
                filter: None,
            },
            Level::Album => Request::List {
                tag: "album".into(),
                filter: Some(("artist".into(), artist.clone())),
            },
            Level::Song => Request::Find(vec![
                ("artist".into(), artist.clone()),
                ("album".into(), album.clone()),
            ]),
        };
        self.pending = Some(Pending {
            level,
            artist,
            album,
            landing,
        });
        vec![Action::Query(req)]
    }

    fn to_root(&mut self) -> Vec<Action> {
        self.descend(Level::Artist, String::new(), String::new(), None)
    }

    fn selected_song(&self) -> Option<&Song> {
        match self.level {
            Level::Song => self.songs.get(self.list.selected()),
            _ => None,
        }
    }

    fn play_selected(&mut self) -> Vec<Action> {
        let sel = self.list.selected();
        match self.level {
            Level::Artist => {
                let Some(name) = self.names.get(sel).cloned() else {
                    return vec![];
                };
                self.descend(Level::Album, name, String::new(), None)
            }
            Level::Album => {
                let Some(name) = self.names.get(sel).cloned() else {
                    return vec![];
                };
                let artist = self.artist.clone();
                self.descend(Level::Song, artist, name, None)
            }
            Level::Song => self
                .songs
                .get(sel)
                .map(|s| vec![Action::PlayUri(s.file.clone())])
                .unwrap_or_default(),
        }
    }

    fn add_selected(&self) -> Vec<Action> {
        let sel = self.list.selected();
        let cmd = match self.level {
            Level::Artist | Level::Album => {
                let Some(value) = self.names.get(sel).cloned() else {
                    return vec![];
                };
                let tag = if self.level == Level::Artist { "artist" } else { "album" };
                Command::FindAdd {
                    tag: tag.into(),
                    value,
                }
            }
            Level::Song => match self.songs.get(sel) {
                Some(song) => Command::Add(song.file.clone()),
                None => return vec![],
            },
        };
        vec![Action::run(cmd)]
    }
}

impl Panel for ArtistAlbumPanel {
    fn id(&self) -> PanelId {
        PanelId::ArtistAlbum
    }

    fn sync(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        if self.loaded && !ctx.mailbox.changed(&Subsystem::Database) {
            return vec![];
        }
        if self.loaded {
            ctx.mailbox.post_message("Database updated.");
        }
        self.loaded = true;
        self.to_root()
    }

    fn on_reply(&mut self, reply: Reply, _ctx: &mut TickContext) -> Vec<Action> {
        let Some(pending) = self.pending.take() else {
            return vec![];
        };
        match (pending.level, reply) {
            (Level::Artist | Level::Album, Reply::Values(names)) => {
                self.names = names;
                self.songs.clear();
            }
            (Level::Song, Reply::Songs(songs)) => {
                self.songs = songs;
                self.names.clear();
            }
            _ => return vec![],
        }
        self.level = pending.level;
        self.artist = pending.artist;
        self.album = pending.album;
        self.list.rebuild(self.len());
        let hit = pending
            .landing
            .and_then(|name| self.names.iter().position(|n| *n == name));
        match hit {
            Some(i) => self.list.locate(i),
            None => self.list.to_first(),
        }
        vec![]
    }

    fn on_failure(&mut self, message: &str, ctx: &mut TickContext) {
        self.pending = None;
        ctx.mailbox.post_error(message);
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        let mut actions = vec![];
        if move_cursor(&mut self.list, input, ctx) {
        } else if let Some(found) = find(
            &mut self.list,
            || titles(self.level, &self.names, &self.songs),
            input,
            ctx,
        ) {
            actions = found;
        } else if ctx.pressed(input, KeyAction::Parent) {
            actions = match self.level {
                Level::Artist => vec![],
                Level::Album => {
                    let artist = self.artist.clone();
                    self.descend(Level::Artist, String::new(), String::new(), Some(artist))
                }
                Level::Song => {
                    let (artist, album) = (self.artist.clone(), self.album.clone());
                    self.descend(Level::Album, artist, String::new(), Some(album))
                }
            };
        } else if ctx.pressed(input, KeyAction::Root) {
            actions = self.to_root();
        } else if ctx.pressed(input, KeyAction::Play) {
            actions = self.play_selected();
        } else if ctx.pressed(input, KeyAction::Add) {
            actions = self.add_selected();
        } else if ctx.pressed(input, KeyAction::DbLocate) {
            match self.selected_song() {
                Some(song) => ctx.mailbox.queue_locate = Some(song.file.clone()),
                None => ctx.mailbox.post_message("No song selected"),
            }
        }
        actions
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let color = match self.level {
            Level::Artist => Some(C_DIRECTORY),
            Level::Album => Some(C_PLAYLIST),
            Level::Song => None,
        };
        let titles = titles(self.level, &self.names, &self.songs);
        draw_rows(frame, area, &self.list, |i, _width| {
            let title = titles.get(i).cloned().unwrap_or_default();
            vec![match color {
                Some(c) => Span::styled(title, Style::default().fg(c)),
                None => Span::raw(title),
            }]
        });
    }

    fn resize(&mut self, height: usize) {
        self.list.resize(height);
    }
}
