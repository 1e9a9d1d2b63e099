//! Panel trait — the unit the controller drives through each tick.
//!
//! A tick runs `sync` (server tick only), `local_update`, `settle` and
//! `render`, in that order, over every panel. Panels never touch the
//! connection: they return `Action`s and the controller carries them out.

use ratatui::{layout::Rect, Frame};

use crate::action::{Action, PanelId, PromptKind};
use crate::keymap::{Key, KeyAction, Keymap};
use crate::mailbox::Mailbox;
use crate::remote::Reply;
use crate::session::{SearchState, Snapshot};
use crate::widgets::prompt::Prompt;

/// What the active panel receives in phase 1.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Key(Key),
    /// A prompt this panel asked for was submitted.
    Submit(PromptKind, String),
}

impl Input {
    pub fn key(&self) -> Option<Key> {
        match self {
            Input::Key(k) => Some(*k),
            Input::Submit(..) => None,
        }
    }
}

/// Shared tick state handed to the update phases.
pub struct TickContext<'a> {
    pub snapshot: &'a Snapshot,
    /// Elapsed seconds with any pending local seek applied.
    pub elapsed: u32,
    pub search: &'a SearchState,
    pub mailbox: &'a mut Mailbox,
    pub keymap: &'a Keymap,
    /// The server was synchronized this tick.
    pub syncing: bool,
    pub connected: bool,
    pub rate_songs: bool,
}

impl TickContext<'_> {
    /// Does `input` carry the key bound to `action`?
    pub fn pressed(&self, input: Option<&Input>, action: KeyAction) -> bool {
        self.keymap.is(action, input.and_then(Input::key))
    }
}

/// Read-only state for drawing.
pub struct View<'a> {
    pub snapshot: &'a Snapshot,
    pub elapsed: u32,
    pub total: u32,
    pub active: PanelId,
    pub keymap: &'a Keymap,
    pub prompt: Option<&'a Prompt>,
}

pub trait Panel {
    fn id(&self) -> PanelId;

    /// A fresh snapshot arrived (server ticks only).
    fn sync(&mut self, _ctx: &mut TickContext) -> Vec<Action> {
        Vec::new()
    }

    /// Phase 1. `input` is `Some` only for the active panel.
    fn local_update(&mut self, _input: Option<&Input>, _ctx: &mut TickContext) -> Vec<Action> {
        Vec::new()
    }

    /// Phase 2: act on what phase 1 posted to the mailbox.
    fn settle(&mut self, _ctx: &mut TickContext) -> Vec<Action> {
        Vec::new()
    }

    /// Answer to a `Query` this panel returned.
    fn on_reply(&mut self, _reply: Reply, _ctx: &mut TickContext) -> Vec<Action> {
        Vec::new()
    }

    /// A `Query` this panel returned was refused or failed.
    fn on_failure(&mut self, message: &str, ctx: &mut TickContext) {
        ctx.mailbox.post_error(message);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, view: &View);

    /// New viewport height in rows.
    fn resize(&mut self, _height: usize) {}
}
