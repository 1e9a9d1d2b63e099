//! Database panel — directory browser over `lsinfo`.

use ratatui::{layout::Rect, style::Style, text::Span, Frame};

use tonearm_proto::protocol::{Command, DirEntry, Subsystem};

use crate::action::{Action, PanelId};
use crate::keymap::KeyAction;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{draw_rows, find, move_cursor};
use crate::remote::{Reply, Request};
use crate::theme::{C_DIRECTORY, C_PLAYLIST};
use crate::widgets::scrollable_list::CursorList;

const UP: &str = "..";

/// Where the cursor goes once a listing arrives.
#[derive(Debug, Clone, PartialEq)]
enum Landing {
    Top,
    /// Keep the cursor where it was (same directory re-read).
    Keep,
    /// On the sub-directory we just came out of.
    Directory(String),
    /// On a file, reporting when it is missing.
    File(String),
}

fn parent_of(uri: &str) -> &str {
    uri.rsplit_once('/').map_or("", |(dir, _)| dir)
}

pub struct DatabasePanel {
    list: CursorList,
    dir: String,
    /// Listing of `dir`, led by the `..` entry.
    entries: Vec<DirEntry>,
    landing: Landing,
    loaded: bool,
}

impl DatabasePanel {
    pub fn new(height: usize) -> Self {
        let mut list = CursorList::new(height);
        list.rebuild(1);
        Self {
            list,
            dir: String::new(),
            entries: vec![DirEntry::Directory(UP.into())],
            landing: Landing::Top,
            loaded: false,
        }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    #[cfg(test)]
    pub fn list(&self) -> &CursorList {
        &self.list
    }

    fn open(&mut self, dir: impl Into<String>, landing: Landing) -> Vec<Action> {
        self.dir = dir.into();
        self.landing = landing;
        vec![Action::Query(Request::LsInfo(self.dir.clone()))]
    }

    fn go_parent(&mut self) -> Vec<Action> {
        let left = self.dir.clone();
        let parent = parent_of(&left).to_string();
        self.open(parent, Landing::Directory(left))
    }

    fn selected(&self) -> Option<&DirEntry> {
        self.entries.get(self.list.selected())
    }

    fn play_selected(&mut self) -> Vec<Action> {
        match self.selected().cloned() {
            Some(DirEntry::Directory(d)) if d == UP => self.go_parent(),
            Some(DirEntry::Directory(d)) => self.open(d, Landing::Top),
            Some(DirEntry::File(song)) => vec![Action::PlayUri(song.file)],
            Some(DirEntry::Playlist(name)) => vec![Action::Run {
                ok: Some(format!("Playlist {name} loaded")),
                cmd: Command::Load(name),
            }],
            None => vec![],
        }
    }

    fn add_selected(&self) -> Vec<Action> {
        let uri = match self.selected() {
            Some(DirEntry::Directory(d)) if d == UP => parent_of(&self.dir).to_string(),
            Some(DirEntry::Directory(d)) => d.clone(),
            Some(DirEntry::File(song)) => song.file.clone(),
            Some(DirEntry::Playlist(name)) => {
                return vec![Action::run(Command::Load(name.clone()))];
            }
            None => return vec![],
        };
        vec![Action::run(Command::Add(uri))]
    }

    fn delete_selected(&mut self) -> Vec<Action> {
        let Some(DirEntry::Playlist(name)) = self.selected().cloned() else {
            return vec![];
        };
        let mut actions = vec![Action::Run {
            ok: Some(format!("Playlist {name} deleted")),
            cmd: Command::Rm(name),
        }];
        let dir = self.dir.clone();
        actions.extend(self.open(dir, Landing::Keep));
        actions
    }
}

impl Panel for DatabasePanel {
    fn id(&self) -> PanelId {
        PanelId::Database
    }

    fn sync(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        if self.loaded && !ctx.mailbox.changed(&Subsystem::Database) {
            return vec![];
        }
        if self.loaded {
            ctx.mailbox.post_message("Database updated.");
        }
        self.loaded = true;
        self.open("", Landing::Top)
    }

    fn on_reply(&mut self, reply: Reply, ctx: &mut TickContext) -> Vec<Action> {
        let Reply::Entries(entries) = reply else {
            return vec![];
        };
        self.entries = Some(DirEntry::Directory(UP.into()))
            .into_iter()
            .chain(entries)
            .collect();
        self.list.rebuild(self.entries.len());

        match std::mem::replace(&mut self.landing, Landing::Keep) {
            Landing::Top => self.list.to_first(),
            Landing::Keep => {}
            Landing::Directory(dir) => {
                let hit = self
                    .entries
                    .iter()
                    .position(|e| matches!(e, DirEntry::Directory(d) if *d == dir));
                match hit {
                    Some(i) => self.list.locate(i),
                    None => self.list.to_first(),
                }
            }
            Landing::File(uri) => {
                let hit = self
                    .entries
                    .iter()
                    .position(|e| matches!(e, DirEntry::File(s) if s.file == uri));
                match hit {
                    Some(i) => self.list.locate(i),
                    None => {
                        self.list.to_first();
                        ctx.mailbox.post_message("Not found in database");
                    }
                }
            }
        }
        vec![]
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        let mut actions = vec![];
        if move_cursor(&mut self.list, input, ctx) {
        } else if let Some(found) = find(
            &mut self.list,
            || self.entries.iter().map(|e| e.name().to_string()).collect::<Vec<_>>(),
            input,
            ctx,
        ) {
            actions = found;
        } else if ctx.pressed(input, KeyAction::Parent) {
            actions = self.go_parent();
        } else if ctx.pressed(input, KeyAction::Root) {
            actions = self.open("", Landing::Top);
        } else if ctx.pressed(input, KeyAction::Play) {
            actions = self.play_selected();
        } else if ctx.pressed(input, KeyAction::Add) {
            actions = self.add_selected();
        } else if ctx.pressed(input, KeyAction::Delete) {
            actions = self.delete_selected();
        } else if ctx.pressed(input, KeyAction::Update) {
            actions.push(Action::Run {
                cmd: Command::Update(None),
                ok: Some("Updating database...".into()),
            });
        } else if ctx.pressed(input, KeyAction::DbLocate) {
            match self.selected() {
                Some(DirEntry::File(song)) => ctx.mailbox.queue_locate = Some(song.file.clone()),
                _ => ctx.mailbox.post_message("No song selected"),
            }
        }

        ctx.mailbox.database_selected = match self.selected() {
            Some(DirEntry::File(song)) => Some(song.file.clone()),
            _ => None,
        };
        actions
    }

    fn settle(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        if let Some(uri) = ctx.mailbox.database_locate.clone() {
            let dir = parent_of(&uri).to_string();
            return self.open(dir, Landing::File(uri));
        }
        if ctx.mailbox.playlist_saved {
            let dir = self.dir.clone();
            return self.open(dir, Landing::Keep);
        }
        vec![]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let entries = &self.entries;
        draw_rows(frame, area, &self.list, |i, _width| {
            let entry = &entries[i];
            let span = match entry {
                DirEntry::Directory(_) => {
                    Span::styled(entry.name().to_string(), Style::default().fg(C_DIRECTORY))
                }
                DirEntry::Playlist(_) => {
                    Span::styled(entry.name().to_string(), Style::default().fg(C_PLAYLIST))
                }
                DirEntry::File(_) => Span::raw(entry.name().to_string()),
            };
            vec![span]
        });
    }

    fn resize(&mut self, height: usize) {
        self.list.resize(height);
    }
}
