//! Typed view of the MPD line protocol.
//!
//! Replies arrive as `key: value` pairs terminated by `OK`; everything here
//! turns those pairs into structs, and turns [`Command`] values back into
//! request lines.

use std::collections::BTreeMap;
use std::fmt;

/// One raw reply: the `key: value` pairs in arrival order.
pub type Pairs = Vec<(String, String)>;

/// Quote an argument: wrap in `"` and escape `\` and `"`.
pub fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split a reply line at the first `": "`.
pub fn parse_pair(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(": ")?;
    Some((key.to_string(), value.to_string()))
}

/// `"12.345"` / `"12"` → whole seconds.
fn parse_secs(value: &str) -> Option<u32> {
    value.parse::<f64>().ok().map(|v| v.max(0.0) as u32)
}

fn parse_flag(value: &str) -> bool {
    value == "1"
}

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    Play,
    Pause,
    #[default]
    Stop,
}

impl PlayState {
    pub fn label(self) -> &'static str {
        match self {
            PlayState::Play => "Playing",
            PlayState::Pause => "Paused",
            PlayState::Stop => "Stopped",
        }
    }

    /// Playing or paused: there is a song with a meaningful position.
    pub fn is_active(self) -> bool {
        matches!(self, PlayState::Play | PlayState::Pause)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Status {
    pub state: PlayState,
    /// `None` when the server has no mixer (`volume: -1` or absent).
    pub volume: Option<u8>,
    pub repeat: bool,
    pub random: bool,
    pub single: bool,
    pub consume: bool,
    /// Queue version; bumps on every queue change.
    pub playlist: u32,
    pub playlist_length: usize,
    pub song: Option<usize>,
    pub song_id: Option<u32>,
    pub elapsed: u32,
    pub total: u32,
    pub updating_db: bool,
    pub error: Option<String>,
}

impl Status {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut st = Status::default();
        let mut have_time = false;
        for (key, value) in pairs {
            match key.as_str() {
                "state" => {
                    st.state = match value.as_str() {
                        "play" => PlayState::Play,
                        "pause" => PlayState::Pause,
                        _ => PlayState::Stop,
                    }
                }
                "volume" => {
                    st.volume = value
                        .parse::<i32>()
                        .ok()
                        .filter(|v| *v >= 0)
                        .map(|v| v.min(100) as u8)
                }
                "repeat" => st.repeat = parse_flag(value),
                "random" => st.random = parse_flag(value),
                // `single` may also be "oneshot"
                "single" => st.single = value != "0",
                "consume" => st.consume = value != "0",
                "playlist" => st.playlist = value.parse().unwrap_or(0),
                "playlistlength" => st.playlist_length = value.parse().unwrap_or(0),
                "song" => st.song = value.parse().ok(),
                "songid" => st.song_id = value.parse().ok(),
                "time" => {
                    if let Some((e, t)) = value.split_once(':') {
                        st.elapsed = parse_secs(e).unwrap_or(0);
                        st.total = parse_secs(t).unwrap_or(0);
                        have_time = true;
                    }
                }
                "elapsed" if !have_time => st.elapsed = parse_secs(value).unwrap_or(0),
                "duration" if !have_time => st.total = parse_secs(value).unwrap_or(0),
                "updating_db" => st.updating_db = true,
                "error" => st.error = Some(value.clone()),
                _ => {}
            }
        }
        st
    }
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
    pub uptime: u64,
    pub playtime: u64,
    pub db_playtime: u64,
    /// Unix timestamp of the last database update.
    pub db_update: i64,
}

impl Stats {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut s = Stats::default();
        for (key, value) in pairs {
            let n = value.parse::<u64>().unwrap_or(0);
            match key.as_str() {
                "artists" => s.artists = n,
                "albums" => s.albums = n,
                "songs" => s.songs = n,
                "uptime" => s.uptime = n,
                "playtime" => s.playtime = n,
                "db_playtime" => s.db_playtime = n,
                "db_update" => s.db_update = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        s
    }
}

// ── Song ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Song {
    pub file: String,
    pub pos: Option<usize>,
    pub id: Option<u32>,
    /// Whole seconds; 0 when unknown.
    pub duration: u32,
    /// Tags keyed by lowercased name; repeated tags keep every value.
    pub tags: BTreeMap<String, Vec<String>>,
    /// 0–5, from the `rating` sticker.
    pub rating: u8,
}

impl Song {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    /// Apply one reply pair to this song.
    fn absorb(&mut self, key: &str, value: &str) {
        match key {
            "file" => self.file = value.to_string(),
            "Pos" => self.pos = value.parse().ok(),
            "Id" => self.id = value.parse().ok(),
            "Time" => {
                if self.duration == 0 {
                    self.duration = parse_secs(value).unwrap_or(0);
                }
            }
            "duration" => self.duration = parse_secs(value).unwrap_or(self.duration),
            "Last-Modified" | "Added" | "Format" | "Range" => {}
            _ => self
                .tags
                .entry(key.to_ascii_lowercase())
                .or_default()
                .push(value.to_string()),
        }
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Option<Self> {
        let mut song: Option<Song> = None;
        for (key, value) in pairs {
            if key == "file" {
                song = Some(Song::new(value.as_str()));
            } else if let Some(s) = song.as_mut() {
                s.absorb(key, value);
            }
        }
        song
    }

    /// Joined value of a tag, `", "`-separated when repeated.
    pub fn tag(&self, name: &str) -> Option<String> {
        self.tags
            .get(&name.to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .map(|v| v.join(", "))
    }

    /// Like [`Song::tag`] but empty instead of `None`.
    pub fn tag_or_empty(&self, name: &str) -> String {
        self.tag(name).unwrap_or_default()
    }

    pub fn basename(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }

    pub fn display_title(&self) -> String {
        self.tag("title")
            .unwrap_or_else(|| self.basename().to_string())
    }
}

/// Split a multi-song reply (`playlistinfo`, `find`, …) on `file` keys.
pub fn songs_from_pairs(pairs: &[(String, String)]) -> Vec<Song> {
    let mut songs = Vec::new();
    let mut current: Option<Song> = None;
    for (key, value) in pairs {
        if key == "file" {
            if let Some(done) = current.take() {
                songs.push(done);
            }
            current = Some(Song::new(value.as_str()));
        } else if let Some(s) = current.as_mut() {
            s.absorb(key, value);
        }
    }
    songs.extend(current);
    songs
}

// ── Directory listing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DirEntry {
    Directory(String),
    File(Song),
    Playlist(String),
}

impl DirEntry {
    pub fn uri(&self) -> &str {
        match self {
            DirEntry::Directory(p) | DirEntry::Playlist(p) => p,
            DirEntry::File(song) => &song.file,
        }
    }

    /// Last path component, which is what the browser shows.
    pub fn name(&self) -> &str {
        let uri = self.uri();
        uri.rsplit('/').next().unwrap_or(uri)
    }
}

pub fn entries_from_pairs(pairs: &[(String, String)]) -> Vec<DirEntry> {
    let mut entries = Vec::new();
    let mut song: Option<Song> = None;
    for (key, value) in pairs {
        match key.as_str() {
            "directory" | "playlist" | "file" => {
                if let Some(done) = song.take() {
                    entries.push(DirEntry::File(done));
                }
                match key.as_str() {
                    "directory" => entries.push(DirEntry::Directory(value.clone())),
                    "playlist" => entries.push(DirEntry::Playlist(value.clone())),
                    _ => song = Some(Song::new(value.as_str())),
                }
            }
            _ => {
                if let Some(s) = song.as_mut() {
                    s.absorb(key, value);
                }
            }
        }
    }
    if let Some(done) = song {
        entries.push(DirEntry::File(done));
    }
    entries
}

/// Values of one key, in order (`list artist` → every `Artist:` line).
pub fn values_of(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.clone())
        .collect()
}

// ── Outputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub id: u32,
    pub name: String,
    pub enabled: bool,
}

pub fn outputs_from_pairs(pairs: &[(String, String)]) -> Vec<Output> {
    let mut outputs = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "outputid" => outputs.push(Output {
                id: value.parse().unwrap_or(0),
                name: String::new(),
                enabled: false,
            }),
            "outputname" => {
                if let Some(o) = outputs.last_mut() {
                    o.name = value.clone();
                }
            }
            "outputenabled" => {
                if let Some(o) = outputs.last_mut() {
                    o.enabled = parse_flag(value);
                }
            }
            _ => {}
        }
    }
    outputs
}

// ── Idle subsystems ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subsystem {
    Database,
    Update,
    StoredPlaylist,
    Playlist,
    Player,
    Mixer,
    Output,
    Options,
    Sticker,
    Other(String),
}

impl Subsystem {
    pub fn parse(name: &str) -> Self {
        match name {
            "database" => Subsystem::Database,
            "update" => Subsystem::Update,
            "stored_playlist" => Subsystem::StoredPlaylist,
            "playlist" => Subsystem::Playlist,
            "player" => Subsystem::Player,
            "mixer" => Subsystem::Mixer,
            "output" => Subsystem::Output,
            "options" => Subsystem::Options,
            "sticker" => Subsystem::Sticker,
            other => Subsystem::Other(other.to_string()),
        }
    }
}

pub fn changed_from_pairs(pairs: &[(String, String)]) -> Vec<Subsystem> {
    pairs
        .iter()
        .filter(|(k, _)| k == "changed")
        .map(|(_, v)| Subsystem::parse(v))
        .collect()
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// Every mutating request the client issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(Option<usize>),
    PlayId(u32),
    Pause(bool),
    Stop,
    Previous,
    Next,
    SetVol(u8),
    Repeat(bool),
    Random(bool),
    Single(bool),
    Consume(bool),
    SeekId { id: u32, secs: u32 },
    Save(String),
    Load(String),
    Rm(String),
    Add(String),
    /// `addid`; the reply carries the new song id.
    AddId(String),
    Clear,
    DeleteId(u32),
    Swap(usize, usize),
    Shuffle,
    FindAdd { tag: String, value: String },
    Update(Option<String>),
    EnableOutput(u32),
    DisableOutput(u32),
    StickerSet { uri: String, name: String, value: String },
    StickerDelete { uri: String, name: String },
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

impl Command {
    /// The request line, without the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Command::Play(None) => "play".into(),
            Command::Play(Some(pos)) => format!("play {pos}"),
            Command::PlayId(id) => format!("playid {id}"),
            Command::Pause(on) => format!("pause {}", flag(*on)),
            Command::Stop => "stop".into(),
            Command::Previous => "previous".into(),
            Command::Next => "next".into(),
            Command::SetVol(v) => format!("setvol {}", (*v).min(100)),
            Command::Repeat(on) => format!("repeat {}", flag(*on)),
            Command::Random(on) => format!("random {}", flag(*on)),
            Command::Single(on) => format!("single {}", flag(*on)),
            Command::Consume(on) => format!("consume {}", flag(*on)),
            Command::SeekId { id, secs } => format!("seekid {id} {secs}"),
            Command::Save(name) => format!("save {}", quote(name)),
            Command::Load(name) => format!("load {}", quote(name)),
            Command::Rm(name) => format!("rm {}", quote(name)),
            Command::Add(uri) => format!("add {}", quote(uri)),
            Command::AddId(uri) => format!("addid {}", quote(uri)),
            Command::Clear => "clear".into(),
            Command::DeleteId(id) => format!("deleteid {id}"),
            Command::Swap(a, b) => format!("swap {a} {b}"),
            Command::Shuffle => "shuffle".into(),
            Command::FindAdd { tag, value } => format!("findadd {} {}", tag, quote(value)),
            Command::Update(None) => "update".into(),
            Command::Update(Some(uri)) => format!("update {}", quote(uri)),
            Command::EnableOutput(id) => format!("enableoutput {id}"),
            Command::DisableOutput(id) => format!("disableoutput {id}"),
            Command::StickerSet { uri, name, value } => format!(
                "sticker set song {} {} {}",
                quote(uri),
                quote(name),
                quote(value)
            ),
            Command::StickerDelete { uri, name } => {
                format!("sticker delete song {} {}", quote(uri), quote(name))
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
