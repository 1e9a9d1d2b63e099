//! Semantic key actions, their default keys, and the local-only table.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Context};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ── Keys ──────────────────────────────────────────────────────────────────────

/// A normalized key press. Shift is folded into the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    Ctrl(char),
    F(u8),
    Enter,
    Tab,
    Backspace,
    Esc,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

impl Key {
    pub fn from_event(ev: &KeyEvent) -> Option<Self> {
        let key = match ev.code {
            KeyCode::Char(c) if ev.modifiers.contains(KeyModifiers::CONTROL) => {
                Key::Ctrl(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::F(n) => Key::F(n),
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Esc => Key::Esc,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Insert => Key::Insert,
            KeyCode::Delete => Key::Delete,
            _ => return None,
        };
        Some(key)
    }

    /// Parse a config key name: `"left"`, `"f3"`, `"space"`, `"ctrl-l"`, `"x"`.
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }
        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "space" => Key::Char(' '),
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "backspace" => Key::Backspace,
            "esc" | "escape" => Key::Esc,
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "insert" => Key::Insert,
            "delete" => Key::Delete,
            _ => {
                if let Some(n) = lower.strip_prefix('f') {
                    let n: u8 = n.parse().with_context(|| format!("bad key name {name:?}"))?;
                    if !(1..=24).contains(&n) {
                        bail!("bad function key {name:?}");
                    }
                    Key::F(n)
                } else if let Some(c) = lower.strip_prefix("ctrl-") {
                    let mut cs = c.chars();
                    match (cs.next(), cs.next()) {
                        (Some(c), None) => Key::Ctrl(c),
                        _ => bail!("bad key name {name:?}"),
                    }
                } else {
                    bail!("bad key name {name:?}");
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => f.write_str("space"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Ctrl(c) => write!(f, "ctrl-{c}"),
            Key::F(n) => write!(f, "F{n}"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Backspace => f.write_str("backspace"),
            Key::Esc => f.write_str("esc"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Home => f.write_str("home"),
            Key::End => f.write_str("end"),
            Key::PageUp => f.write_str("pageup"),
            Key::PageDown => f.write_str("pagedown"),
            Key::Insert => f.write_str("insert"),
            Key::Delete => f.write_str("delete"),
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyAction {
    VolDn,
    VolUp,
    Pause,
    Stop,
    Next,
    Prev,
    Consume,
    Random,
    Repeat,
    Single,
    SavePl,
    LoadPl,
    SearchDn,
    SearchUp,
    SearchNext,
    SearchPrev,
    Quit,
    LineDn,
    LineUp,
    PageDn,
    PageUp,
    Top,
    Middle,
    Bottom,
    First,
    Last,
    Locate,
    Add,
    Clear,
    Delete,
    SwapDn,
    SwapUp,
    Shuffle,
    Play,
    Rate0,
    Rate1,
    Rate2,
    Rate3,
    Rate4,
    Rate5,
    Lock,
    DbLocate,
    Parent,
    Root,
    Update,
    SaveLyrics,
    Search,
    Toggle,
    SeekB,
    SeekF,
    SeekBp,
    SeekFp,
    PaneHelp,
    PaneQueue,
    PaneDatabase,
    PaneLyrics,
    PaneArtistAlbum,
    PaneSearch,
    PaneInfo,
    PaneOutput,
}

use KeyAction as A;

/// (action, config name, default key, help text)
const TABLE: &[(KeyAction, &str, Key, &str)] = &[
    (A::VolDn, "voldn", Key::Char('9'), "volume down"),
    (A::VolUp, "volup", Key::Char('0'), "volume up"),
    (A::Pause, "pause", Key::Char(' '), "pause / resume"),
    (A::Stop, "stop", Key::Char('s'), "stop"),
    (A::Next, "next", Key::Char('>'), "next song"),
    (A::Prev, "prev", Key::Char('<'), "previous song"),
    (A::Consume, "consume", Key::Char('u'), "toggle consume"),
    (A::Random, "random", Key::Char('i'), "toggle random"),
    (A::Repeat, "repeat", Key::Char('o'), "toggle repeat"),
    (A::Single, "single", Key::Char('p'), "toggle single"),
    (A::SavePl, "savepl", Key::Char('S'), "save queue as playlist"),
    (A::LoadPl, "loadpl", Key::Char('O'), "load playlist"),
    (A::SearchDn, "searchdn", Key::Char('/'), "find forward"),
    (A::SearchUp, "searchup", Key::Char('?'), "find backward"),
    (A::SearchNext, "searchnext", Key::Char('n'), "find next"),
    (A::SearchPrev, "searchprev", Key::Char('N'), "find previous"),
    (A::Quit, "quit", Key::Char('q'), "quit"),
    (A::LineDn, "linedn", Key::Char('j'), "one line down"),
    (A::LineUp, "lineup", Key::Char('k'), "one line up"),
    (A::PageDn, "pagedn", Key::Char('f'), "one page down"),
    (A::PageUp, "pageup", Key::Char('b'), "one page up"),
    (A::Top, "top", Key::Char('H'), "select top of screen"),
    (A::Middle, "middle", Key::Char('M'), "select middle of screen"),
    (A::Bottom, "bottom", Key::Char('L'), "select bottom of screen"),
    (A::First, "first", Key::Char('g'), "go to first item"),
    (A::Last, "last", Key::Char('G'), "go to last item"),
    (A::Locate, "locate", Key::Char('l'), "locate current song"),
    (A::Add, "add", Key::Char('a'), "add to queue"),
    (A::Clear, "clear", Key::Char('c'), "clear queue"),
    (A::Delete, "delete", Key::Char('d'), "delete item"),
    (A::SwapDn, "swapdn", Key::Char('J'), "move song down"),
    (A::SwapUp, "swapup", Key::Char('K'), "move song up"),
    (A::Shuffle, "shuffle", Key::Char('e'), "shuffle queue"),
    (A::Play, "play", Key::Enter, "play / open"),
    (A::Rate0, "rate0", Key::Char('x'), "clear rating"),
    (A::Rate1, "rate1", Key::Char('1'), "rate 1 star"),
    (A::Rate2, "rate2", Key::Char('2'), "rate 2 stars"),
    (A::Rate3, "rate3", Key::Char('3'), "rate 3 stars"),
    (A::Rate4, "rate4", Key::Char('4'), "rate 4 stars"),
    (A::Rate5, "rate5", Key::Char('5'), "rate 5 stars"),
    (A::Lock, "lock", Key::Char('\''), "toggle auto-center"),
    (A::DbLocate, "dblocate", Key::Char(';'), "locate in other pane"),
    (A::Parent, "parent", Key::Backspace, "parent directory"),
    (A::Root, "root", Key::Char('"'), "root directory"),
    (A::Update, "update", Key::Char('U'), "update database"),
    (A::SaveLyrics, "savelyrics", Key::Char('W'), "save lyrics"),
    (A::Search, "search", Key::Char('B'), "database search"),
    (A::Toggle, "toggle", Key::Char('t'), "toggle output"),
    (A::SeekB, "seekb", Key::Left, "seek back 1s"),
    (A::SeekF, "seekf", Key::Right, "seek forward 1s"),
    (A::SeekBp, "seekbp", Key::Down, "seek back 1%"),
    (A::SeekFp, "seekfp", Key::Up, "seek forward 1%"),
    (A::PaneHelp, "panehelp", Key::F(1), "help pane"),
    (A::PaneQueue, "panequeue", Key::F(2), "queue pane"),
    (A::PaneDatabase, "panedatabase", Key::F(3), "database pane"),
    (A::PaneLyrics, "panelyrics", Key::F(4), "lyrics pane"),
    (A::PaneArtistAlbum, "paneartistalbum", Key::F(5), "artist-album pane"),
    (A::PaneSearch, "panesearch", Key::F(6), "search pane"),
    (A::PaneInfo, "paneinfo", Key::F(7), "info pane"),
    (A::PaneOutput, "paneoutput", Key::F(8), "output pane"),
];

impl KeyAction {
    pub fn help(self) -> &'static str {
        TABLE
            .iter()
            .find(|(a, ..)| *a == self)
            .map_or("", |(.., help)| help)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TABLE.iter().find(|(_, n, ..)| *n == name).map(|(a, ..)| *a)
    }

    /// Never needs the server: pure cursor/viewport work, seek
    /// accumulation, deferred queue reordering, or opening a prompt.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            A::LineDn
                | A::LineUp
                | A::PageDn
                | A::PageUp
                | A::Top
                | A::Middle
                | A::Bottom
                | A::First
                | A::Last
                | A::Locate
                | A::Lock
                | A::SwapDn
                | A::SwapUp
                | A::SearchNext
                | A::SearchPrev
                | A::SeekB
                | A::SeekF
                | A::SeekBp
                | A::SeekFp
                | A::SavePl
                | A::LoadPl
                | A::SearchDn
                | A::SearchUp
                | A::Search
        )
    }

    pub fn rating(self) -> Option<u8> {
        match self {
            A::Rate0 => Some(0),
            A::Rate1 => Some(1),
            A::Rate2 => Some(2),
            A::Rate3 => Some(3),
            A::Rate4 => Some(4),
            A::Rate5 => Some(5),
            _ => None,
        }
    }
}

// ── Keymap ────────────────────────────────────────────────────────────────────

/// Action → key. Several actions may share a key; panes decide which one
/// applies to them.
#[derive(Debug, Clone)]
pub struct Keymap {
    keys: BTreeMap<KeyAction, Key>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            keys: TABLE.iter().map(|(a, _, k, _)| (*a, *k)).collect(),
        }
    }
}

impl Keymap {
    /// Defaults with `[keys]` overrides applied. Unknown action names and
    /// unparseable keys are errors.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> anyhow::Result<Self> {
        let mut map = Self::default();
        for (action, key) in overrides {
            let Some(a) = KeyAction::from_name(action) else {
                bail!("unknown key action {action:?} in [keys]");
            };
            let k = Key::parse(key).with_context(|| format!("[keys] {action}"))?;
            map.keys.insert(a, k);
        }
        Ok(map)
    }

    pub fn key(&self, action: KeyAction) -> Option<Key> {
        self.keys.get(&action).copied()
    }

    /// Does `key` trigger `action`?
    pub fn is(&self, action: KeyAction, key: Option<Key>) -> bool {
        key.is_some() && self.key(action) == key
    }

    pub fn actions_for(&self, key: Key) -> impl Iterator<Item = KeyAction> + '_ {
        self.keys
            .iter()
            .filter(move |(_, k)| **k == key)
            .map(|(a, _)| *a)
    }

    /// Local-only iff the key is bound and every action on it is local.
    pub fn is_local(&self, key: Key) -> bool {
        let mut any = false;
        for a in self.actions_for(key) {
            if !a.is_local() {
                return false;
            }
            any = true;
        }
        any
    }
}
