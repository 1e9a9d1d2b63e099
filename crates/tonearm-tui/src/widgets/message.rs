//! Message line — the transient status text on the bottom bar.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MSG_ERROR, C_MSG_INFO};

/// How long a transient message stays up.
pub const MESSAGE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Error,
}

struct Message {
    text: String,
    severity: Severity,
    /// `None` = stays until replaced.
    expires: Option<Instant>,
}

#[derive(Default)]
pub struct MessageLine {
    current: Option<Message>,
}

impl MessageLine {
    pub fn info(&mut self, text: impl Into<String>) {
        self.set(text.into(), Severity::Info, Some(MESSAGE_TTL));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set(text.into(), Severity::Error, Some(MESSAGE_TTL));
    }

    /// Shown until replaced; used for the disconnected notice.
    pub fn sticky(&mut self, text: impl Into<String>) {
        self.set(text.into(), Severity::Error, None);
    }

    fn set(&mut self, text: String, severity: Severity, ttl: Option<Duration>) {
        self.current = Some(Message {
            text,
            severity,
            expires: ttl.map(|d| Instant::now() + d),
        });
    }

    /// Drop an expired message. Call each tick.
    pub fn tick(&mut self) {
        self.expire_at(Instant::now());
    }

    fn expire_at(&mut self, now: Instant) {
        if self
            .current
            .as_ref()
            .and_then(|m| m.expires)
            .is_some_and(|t| t <= now)
        {
            self.current = None;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.text.as_str())
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let Some(msg) = &self.current else {
            return;
        };
        let color = match msg.severity {
            Severity::Info => C_MSG_INFO,
            Severity::Error => C_MSG_ERROR,
        };
        let line = Line::from(Span::styled(
            msg.text.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), area);
    }
}
