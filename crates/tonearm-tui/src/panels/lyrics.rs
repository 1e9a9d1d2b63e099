//! Lyrics panel — UI side of the lyrics worker.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use tonearm_proto::lrc::{Lyrics, FETCHING, NO_LYRICS};

use crate::action::{Action, PanelId};
use crate::keymap::KeyAction;
use crate::lyrics::{LyricsExchange, Poll, Subject};
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{fit, scroll};
use crate::theme::{style_default, style_playing};
use crate::widgets::scrollable_list::ScrollList;

pub struct LyricsPanel {
    exchange: LyricsExchange,
    scroll: ScrollList,
    lyrics: Lyrics,
    /// Raw text behind `lyrics`, kept for saving.
    text: String,
    /// Subject the shown lyrics belong to.
    shown: Option<Subject>,
    /// Subject we are waiting on.
    waiting: Option<Subject>,
    current: Option<usize>,
    auto_center: bool,
}

impl LyricsPanel {
    pub fn new(exchange: LyricsExchange, height: usize) -> Self {
        let mut panel = Self {
            exchange,
            scroll: ScrollList::new(height),
            lyrics: Lyrics::default(),
            text: String::new(),
            shown: None,
            waiting: None,
            current: None,
            auto_center: true,
        };
        panel.show(NO_LYRICS.to_string());
        panel
    }

    pub fn lines(&self) -> Vec<&str> {
        self.lyrics.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    fn show(&mut self, text: String) {
        self.lyrics = Lyrics::parse(&text);
        self.text = text;
        self.scroll.rebuild(self.lyrics.lines.len());
        self.scroll.to_first();
    }

    /// Pick up finished lyrics or ask for new ones when the song changed.
    fn follow(&mut self, subject: Option<Subject>) {
        let Some(subject) = subject else {
            if self.shown.is_some() || self.waiting.is_some() {
                self.shown = None;
                self.waiting = None;
                self.show(NO_LYRICS.to_string());
            }
            return;
        };
        if self.shown.as_ref() == Some(&subject) {
            return;
        }
        match self.exchange.poll(&subject) {
            Poll::Ready(text) => {
                self.show(text);
                self.shown = Some(subject);
                self.waiting = None;
            }
            Poll::Requested | Poll::Busy => {
                if self.waiting.as_ref() != Some(&subject) {
                    self.show(FETCHING.to_string());
                    self.waiting = Some(subject);
                }
            }
        }
    }
}

impl Panel for LyricsPanel {
    fn id(&self) -> PanelId {
        PanelId::Lyrics
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        self.follow(ctx.snapshot.current.as_ref().map(Subject::of));

        if scroll(&mut self.scroll, input, ctx) {
        } else if ctx.pressed(input, KeyAction::Locate) {
            if let Some(cur) = self.current {
                self.scroll.locate(cur);
            }
        } else if ctx.pressed(input, KeyAction::Lock) {
            self.auto_center = !self.auto_center;
        } else if ctx.pressed(input, KeyAction::SaveLyrics) {
            match &self.shown {
                Some(subject) => {
                    return vec![Action::SaveLyrics {
                        subject: subject.clone(),
                        text: self.text.clone(),
                    }];
                }
                None => ctx.mailbox.post_error("Lyrics saving failed."),
            }
        }
        vec![]
    }

    fn settle(&mut self, ctx: &mut TickContext) -> Vec<Action> {
        self.current = self.lyrics.current_line(ctx.elapsed.saturating_mul(1000));
        if self.auto_center {
            if let Some(cur) = self.current {
                self.scroll.locate(cur);
            }
        }
        vec![]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let width = area.width as usize;
        let lines: Vec<Line> = self
            .scroll
            .visible()
            .map(|i| {
                let style = if Some(i) == self.current {
                    style_playing()
                } else {
                    style_default()
                };
                Line::from(Span::styled(fit(&self.lyrics.lines[i].text, width), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn resize(&mut self, height: usize) {
        self.scroll.resize(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricsResult;
    use crate::panels::testing::Harness;
    use tonearm_proto::protocol::Song;

    fn song(artist: &str, title: &str) -> Song {
        let mut s = Song::new(format!("{artist}/{title}.flac"));
        s.tags.insert("artist".into(), vec![artist.into()]);
        s.tags.insert("title".into(), vec![title.into()]);
        s
    }

    #[tokio::test]
    async fn test_stale_result_never_reaches_the_screen() {
        let ex = LyricsExchange::new();
        let mut panel = LyricsPanel::new(ex.clone(), 10);
        let mut h = Harness::new();

        h.snapshot.current = Some(song("x", "A"));
        panel.local_update(None, &mut h.ctx());
        assert_eq!(panel.lines(), vec!["Fetching..."]);
        let job_a = ex.next_job().await;

        h.snapshot.current = Some(song("x", "B"));
        panel.local_update(None, &mut h.ctx());
        ex.complete(LyricsResult {
            subject: job_a,
            text: "[00:00.00]words of A".into(),
        });
        panel.local_update(None, &mut h.ctx());
        assert_eq!(panel.lines(), vec!["Fetching..."]);

        let job_b = ex.next_job().await;
        assert_eq!(job_b.title, "B");
        ex.complete(LyricsResult {
            subject: job_b,
            text: "[00:00.00]words of B".into(),
        });
        panel.local_update(None, &mut h.ctx());
        assert_eq!(panel.lines(), vec!["words of B"]);
    }

    #[test]
    fn test_current_line_tracks_elapsed() {
        let mut panel = LyricsPanel::new(LyricsExchange::new(), 2);
        panel.show("[00:01.00]one\n[00:02.00]two\n[00:03.00]three\n[00:04.00]four\n".into());
        let mut h = Harness::new();
        h.snapshot.status.elapsed = 3;
        panel.settle(&mut h.ctx());
        assert_eq!(panel.current(), Some(2));
        assert_eq!(panel.scroll.top(), 1);
    }

    #[test]
    fn test_save_needs_loaded_lyrics() {
        let mut panel = LyricsPanel::new(LyricsExchange::new(), 10);
        let mut h = Harness::new();
        let key = h.key(KeyAction::SaveLyrics);
        assert_eq!(panel.local_update(Some(&key), &mut h.ctx()), vec![]);
        assert_eq!(h.mailbox.message.as_deref(), Some("Lyrics saving failed."));
    }
}
