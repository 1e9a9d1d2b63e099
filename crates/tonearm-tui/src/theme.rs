//! Color palette and style constants for the tonearm panes.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_PAUSED: Color = Color::Rgb(255, 184, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(44, 44, 64);
pub const C_PROMPT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_PROMPT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_DIRECTORY: Color = Color::Rgb(80, 140, 200);
pub const C_PLAYLIST: Color = Color::Rgb(180, 120, 220);
pub const C_HEADING: Color = Color::Rgb(100, 160, 130);
pub const C_MSG_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_MSG_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_STARS: Color = Color::Rgb(255, 210, 50);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_playing() -> Style {
    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

/// Row that is both selected and current.
pub fn style_selected_playing() -> Style {
    style_selected().fg(C_PLAYING)
}

pub fn style_heading() -> Style {
    Style::default().fg(C_HEADING).add_modifier(Modifier::BOLD)
}

pub fn style_prompt() -> Style {
    Style::default().fg(C_PROMPT_FG).bg(C_PROMPT_BG)
}

pub fn style_bar() -> Style {
    Style::default().fg(C_PRIMARY).add_modifier(Modifier::REVERSED)
}
