//! Prompt — one-line text entry on the message bar, wrapping tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_prompt, C_PROMPT_FG};

#[derive(Debug, PartialEq)]
pub enum PromptAction {
    Editing,
    Submitted(String),
    Cancelled,
}

pub struct Prompt {
    input: Input,
    label: String,
}

impl Prompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            label: label.into(),
        }
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Enter submits whatever was typed (possibly empty); Esc abandons it.
    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => PromptAction::Cancelled,
            KeyCode::Enter => PromptAction::Submitted(self.input.value().to_string()),
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptAction::Editing
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let label = format!("{}: ", self.label);
        let label_w = label.chars().count();
        let avail = (area.width as usize).saturating_sub(label_w + 1);
        let scroll = self.input.visual_scroll(avail);
        let value: String = self.input.value().chars().skip(scroll).collect();

        let line = Line::from(vec![
            Span::styled(
                label,
                Style::default().fg(C_PROMPT_FG).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value),
        ]);
        frame.render_widget(Paragraph::new(line).style(style_prompt()), area);

        if area.width > 0 {
            let cursor_x = area.x + (label_w + self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits() {
        let mut p = Prompt::new("Find");
        for c in "abc".chars() {
            assert_eq!(p.handle_key(key(KeyCode::Char(c))), PromptAction::Editing);
        }
        p.handle_key(key(KeyCode::Backspace));
        assert_eq!(p.text(), "ab");
        assert_eq!(
            p.handle_key(key(KeyCode::Enter)),
            PromptAction::Submitted("ab".into())
        );
    }

    #[test]
    fn test_esc_cancels() {
        let mut p = Prompt::new("Save");
        p.handle_key(key(KeyCode::Char('x')));
        assert_eq!(p.handle_key(key(KeyCode::Esc)), PromptAction::Cancelled);
    }
}
