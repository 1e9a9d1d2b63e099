//! Action enum — what panes ask the controller to do on their behalf.

use tonearm_proto::protocol::Command;

use crate::lyrics::Subject;
use crate::remote::Request;

/// Every pane, bars included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    Menu,
    Line,
    Progress,
    Status,
    Message,
    Help,
    Queue,
    Database,
    Lyrics,
    ArtistAlbum,
    Search,
    Info,
    Output,
}

impl PanelId {
    pub fn title(self) -> &'static str {
        match self {
            PanelId::Menu => "Menu",
            PanelId::Line => "Line",
            PanelId::Progress => "Progress",
            PanelId::Status => "Status",
            PanelId::Message => "Message",
            PanelId::Help => "Help",
            PanelId::Queue => "Queue",
            PanelId::Database => "Database",
            PanelId::Lyrics => "Lyrics",
            PanelId::ArtistAlbum => "Artist-Album",
            PanelId::Search => "Search",
            PanelId::Info => "Info",
            PanelId::Output => "Output",
        }
    }
}

/// Text prompts shown on the message bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    FindDown,
    FindUp,
    Save,
    Load,
    DatabaseSearch,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::FindDown | PromptKind::FindUp => "Find",
            PromptKind::Save => "Save",
            PromptKind::Load => "Load",
            PromptKind::DatabaseSearch => "Database Search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send now. A rejection is shown on the message bar; `ok` is shown
    /// on success.
    Run { cmd: Command, ok: Option<String> },
    /// Queue for the next batched flush.
    Defer(Command),
    /// Fetch data; the reply goes back to the pane that asked.
    Query(Request),
    /// Play a library uri, adding it to the queue when missing.
    PlayUri(String),
    Prompt(PromptKind),
    /// Write lyrics text to the cache directory.
    SaveLyrics { subject: Subject, text: String },
}

impl Action {
    pub fn run(cmd: Command) -> Self {
        Action::Run { cmd, ok: None }
    }
}
