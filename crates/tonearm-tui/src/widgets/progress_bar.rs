//! Progress bar and time formatting.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PLAYING};

/// Render a smooth bar for `elapsed / total` across the full width.
pub fn draw_progress(frame: &mut Frame, area: Rect, elapsed: u32, total: u32) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let bar_w = area.width as usize;
    let progress = if total > 0 {
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // 8 eighths per cell
    let eighths = (progress * bar_w as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let mut filled = String::with_capacity(bar_w * 3);
    for _ in 0..full_blocks {
        filled.push('█');
    }
    let mut rest = String::new();
    if full_blocks < bar_w {
        filled.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..bar_w {
            rest.push('─');
        }
    }

    let line = Line::from(vec![
        Span::styled(filled, Style::default().fg(C_PLAYING)),
        Span::styled(rest, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// `m:ss`, or `h:mm:ss` from an hour up.
pub fn fmt_time(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(0), "0:00");
        assert_eq!(fmt_time(65), "1:05");
        assert_eq!(fmt_time(3 * 3600 + 2 * 60 + 9), "3:02:09");
    }
}
