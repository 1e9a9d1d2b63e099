//! The one-row bars around the active block panel.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use tonearm_proto::protocol::PlayState;

use crate::action::{Action, PanelId};
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::spread;
use crate::theme::{style_bar, style_muted, C_PAUSED, C_PLAYING, C_PRIMARY, C_SEPARATOR};
use crate::widgets::message::MessageLine;
use crate::widgets::progress_bar::draw_progress;

const DISCONNECTED: &str = "Connection to server lost, retrying...";

/// `m:ss` with unbounded minutes.
fn clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Active pane title on the left, mode flags and volume on the right.
pub struct MenuBar;

impl MenuBar {
    fn text(view: &View, width: usize) -> String {
        let status = &view.snapshot.status;
        let flag = |on: bool, name: &str| if on { format!("[{name}]") } else { "     ".into() };
        let modes = format!(
            "{}{}{}{}",
            flag(status.consume, "con"),
            flag(status.random, "ran"),
            flag(status.repeat, "rep"),
            flag(status.single, "sin"),
        );
        let volume = match status.volume {
            Some(v) => format!("Volume: {v:3}%"),
            None => "Volume: n/a".to_string(),
        };
        spread(view.active.title(), &format!("{modes}    {volume}"), width)
    }
}

impl Panel for MenuBar {
    fn id(&self) -> PanelId {
        PanelId::Menu
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, view: &View) {
        let text = Self::text(view, area.width as usize);
        frame.render_widget(Paragraph::new(text).style(style_bar()), area);
    }
}

pub struct LineBar;

impl Panel for LineBar {
    fn id(&self) -> PanelId {
        PanelId::Line
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let rule = "─".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(Span::styled(rule, Style::default().fg(C_SEPARATOR))),
            area,
        );
    }
}

pub struct ProgressBar;

impl Panel for ProgressBar {
    fn id(&self) -> PanelId {
        PanelId::Progress
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, view: &View) {
        if view.snapshot.status.state == PlayState::Stop {
            let rule = "─".repeat(area.width as usize);
            frame.render_widget(Paragraph::new(Span::styled(rule, style_muted())), area);
        } else {
            draw_progress(frame, area, view.elapsed, view.total);
        }
    }
}

/// `Playing > title` and the `[elapsed ~ total]` clock.
pub struct StatusBar;

impl StatusBar {
    fn text(view: &View, width: usize) -> String {
        let state = view.snapshot.status.state;
        let title = view
            .snapshot
            .current
            .as_ref()
            .map(|s| s.display_title())
            .unwrap_or_default();
        let clock = format!("[{} ~ {}]", clock(view.elapsed), clock(view.total));
        spread(&format!("{} > {}", state.label(), title), &clock, width)
    }
}

impl Panel for StatusBar {
    fn id(&self) -> PanelId {
        PanelId::Status
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, view: &View) {
        let color = match view.snapshot.status.state {
            PlayState::Play => C_PLAYING,
            PlayState::Pause => C_PAUSED,
            PlayState::Stop => C_PRIMARY,
        };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        let text = Self::text(view, area.width as usize);
        frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
    }
}

/// Transient messages, the disconnected notice, or the open prompt.
#[derive(Default)]
pub struct MessageBar {
    line: MessageLine,
    lost: bool,
}

impl MessageBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.line.text()
    }
}

impl Panel for MessageBar {
    fn id(&self) -> PanelId {
        PanelId::Message
    }

    fn local_update(&mut self, _input: Option<&Input>, _ctx: &mut TickContext) -> Vec<Action> {
        self.line.tick();
        vec![]
    }

    /// Runs after every other panel, so it sees all of this tick's posts.
    fn settle(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        if !ctx.connected {
            if !self.lost {
                self.line.sticky(DISCONNECTED);
                self.lost = true;
            }
            return vec![];
        }
        if self.lost {
            self.lost = false;
            self.line.info("Reconnected.");
        }
        if let Some(text) = ctx.mailbox.message.take() {
            if ctx.mailbox.error {
                self.line.error(text);
            } else {
                self.line.info(text);
            }
        }
        vec![]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, view: &View) {
        match view.prompt {
            Some(prompt) => prompt.draw(frame, area),
            None => self.line.draw(frame, area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Keymap;
    use crate::session::Snapshot;
    use tonearm_proto::protocol::Song;

    fn view<'a>(snapshot: &'a Snapshot, keymap: &'a Keymap) -> View<'a> {
        View {
            snapshot,
            elapsed: 75,
            total: 200,
            active: PanelId::Queue,
            keymap,
            prompt: None,
        }
    }

    #[test]
    fn test_menu_shows_modes_and_volume() {
        let mut snap = Snapshot::default();
        snap.status.random = true;
        snap.status.single = true;
        snap.status.volume = Some(7);
        let keymap = Keymap::default();
        let text = MenuBar::text(&view(&snap, &keymap), 60);
        assert!(text.starts_with("Queue"));
        assert!(text.ends_with("     [ran]     [sin]    Volume:   7%"));
        assert_eq!(text.chars().count(), 60);
    }

    #[test]
    fn test_status_line() {
        let mut snap = Snapshot::default();
        snap.status.state = PlayState::Play;
        let mut song = Song::new("dir/track.flac");
        song.tags.insert("title".into(), vec!["Hello".into()]);
        snap.current = Some(song);
        let keymap = Keymap::default();
        let text = StatusBar::text(&view(&snap, &keymap), 40);
        assert!(text.starts_with("Playing > Hello"));
        assert!(text.ends_with("[1:15 ~ 3:20]"));
    }
}
