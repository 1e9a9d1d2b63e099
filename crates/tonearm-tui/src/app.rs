//! Controller — owns the session and the panels and runs one tick per event.
//!
//! A tick is: classify the trigger, optionally synchronize with the server
//! (leave idle, flush deferred commands, commit a pending seek, refresh the
//! snapshot, let panels look at it), run the global keys, hand the key to
//! the active panel, switch panes, settle, render. Timer and server ticks
//! end by going back into idle; key ticks do not.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use ratatui::crossterm::event::{self, Event as TermEvent, KeyEvent, KeyEventKind};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    widgets::Clear,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tonearm_proto::config::Config;
use tonearm_proto::protocol::{Command, PlayState};
use tonearm_proto::MpdError;

use crate::action::{Action, PanelId, PromptKind};
use crate::keymap::{Key, KeyAction, Keymap};
use crate::lyrics::{save_lyrics, LyricsExchange};
use crate::mailbox::Mailbox;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::artist_album::ArtistAlbumPanel;
use crate::panels::bars::{LineBar, MenuBar, MessageBar, ProgressBar, StatusBar};
use crate::panels::database::DatabasePanel;
use crate::panels::help::HelpPanel;
use crate::panels::info::InfoPanel;
use crate::panels::lyrics::LyricsPanel;
use crate::panels::output::OutputPanel;
use crate::panels::queue::QueuePanel;
use crate::panels::search::SearchPanel;
use crate::remote::Remote;
use crate::session::{SearchState, Session};
use crate::widgets::prompt::{Prompt, PromptAction};

const RECONNECT_EVERY: Duration = Duration::from_secs(5);

/// Rows taken by the two top and the two bottom bars.
const BAR_ROWS: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    /// The poll timeout ran out.
    Timer,
    /// The idling connection has news.
    Remote,
    Resize(u16, u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What set this tick off, after prompt handling.
#[derive(Debug, Clone, PartialEq)]
enum Trigger {
    None,
    Key(Key),
    Submit(PromptKind, String),
}

/// F-key actions and the panes they open.
const PANE_KEYS: [(KeyAction, PanelId); 8] = [
    (KeyAction::PaneHelp, PanelId::Help),
    (KeyAction::PaneQueue, PanelId::Queue),
    (KeyAction::PaneDatabase, PanelId::Database),
    (KeyAction::PaneLyrics, PanelId::Lyrics),
    (KeyAction::PaneArtistAlbum, PanelId::ArtistAlbum),
    (KeyAction::PaneSearch, PanelId::Search),
    (KeyAction::PaneInfo, PanelId::Info),
    (KeyAction::PaneOutput, PanelId::Output),
];

fn tick_context<'a, R: Remote>(
    session: &'a Session<R>,
    mailbox: &'a mut Mailbox,
    keymap: &'a Keymap,
    rate_songs: bool,
) -> TickContext<'a> {
    TickContext {
        snapshot: session.snapshot(),
        elapsed: session.elapsed(),
        search: &session.search,
        mailbox,
        keymap,
        syncing: session.syncing,
        connected: session.is_connected(),
        rate_songs,
    }
}

pub struct Controller<R> {
    session: Session<R>,
    /// Blocks and the top/progress/status bars, in phase order.
    panels: Vec<Box<dyn Panel>>,
    /// Kept out of `panels` so it always settles last.
    message: MessageBar,
    mailbox: Mailbox,
    keymap: Keymap,
    active: PanelId,
    previous: Option<PanelId>,
    prompt: Option<(PromptKind, Prompt)>,
    rate_songs: bool,
    lyrics_dir: PathBuf,
    last_reconnect: Option<Instant>,
    /// An immediate command went through during this tick.
    ran: bool,
}

impl<R: Remote> Controller<R> {
    pub fn new(
        remote: R,
        keymap: Keymap,
        config: &Config,
        exchange: LyricsExchange,
        height: u16,
    ) -> Self {
        let rows = height.saturating_sub(BAR_ROWS) as usize;
        let panels: Vec<Box<dyn Panel>> = vec![
            Box::new(MenuBar),
            Box::new(LineBar),
            Box::new(ProgressBar),
            Box::new(StatusBar),
            Box::new(HelpPanel::new(&keymap, rows)),
            Box::new(QueuePanel::new(rows)),
            Box::new(DatabasePanel::new(rows)),
            Box::new(LyricsPanel::new(exchange, rows)),
            Box::new(ArtistAlbumPanel::new(rows)),
            Box::new(SearchPanel::new(rows)),
            Box::new(InfoPanel::new(rows)),
            Box::new(OutputPanel::new(rows)),
        ];
        Self {
            session: Session::new(remote),
            panels,
            message: MessageBar::new(),
            mailbox: Mailbox::default(),
            keymap,
            active: PanelId::Queue,
            previous: None,
            prompt: None,
            rate_songs: config.ui.rate_songs,
            lyrics_dir: config.lyrics.dir.clone(),
            last_reconnect: None,
            ran: false,
        }
    }

    pub fn active(&self) -> PanelId {
        self.active
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt.is_some()
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut Session<R> {
        &mut self.session
    }

    /// Run one tick for `event`.
    pub async fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Resize(_, height) => {
                self.resize(height);
            }
            Event::Key(key) => {
                let Some((trigger, syncing)) = self.classify(key) else {
                    return Flow::Quit;
                };
                self.tick(trigger, syncing).await;
            }
            Event::Timer => {
                self.maybe_reconnect().await;
                self.tick(Trigger::None, true).await;
                self.idle().await;
            }
            Event::Remote => {
                self.tick(Trigger::None, true).await;
                self.idle().await;
            }
        }
        Flow::Continue
    }

    /// Turn a key press into a trigger and decide whether it syncs.
    /// `None` means quit.
    fn classify(&mut self, ev: KeyEvent) -> Option<(Trigger, bool)> {
        if let Some((kind, prompt)) = &mut self.prompt {
            let kind = *kind;
            return Some(match prompt.handle_key(ev) {
                PromptAction::Editing => (Trigger::None, false),
                PromptAction::Cancelled => {
                    self.prompt = None;
                    (Trigger::None, false)
                }
                PromptAction::Submitted(text) => {
                    self.prompt = None;
                    (Trigger::Submit(kind, text), true)
                }
            });
        }
        let Some(key) = Key::from_event(&ev) else {
            return Some((Trigger::None, false));
        };
        if self.keymap.is(KeyAction::Quit, Some(key)) {
            return None;
        }
        Some((Trigger::Key(key), !self.keymap.is_local(key)))
    }

    async fn tick(&mut self, trigger: Trigger, syncing: bool) {
        self.mailbox.clear();
        self.ran = false;
        self.session.syncing = syncing && self.session.is_connected();

        if self.session.syncing {
            self.synchronize().await;
            for i in 0..self.panels.len() {
                let mut ctx = tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
                let actions = self.panels[i].sync(&mut ctx);
                self.dispatch(Some(i), actions).await;
            }
        }

        let input = self.round0(trigger).await;

        for i in 0..self.panels.len() {
            let given = if self.panels[i].id() == self.active {
                input.as_ref()
            } else {
                None
            };
            let mut ctx = tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
            let actions = self.panels[i].local_update(given, &mut ctx);
            self.dispatch(Some(i), actions).await;
        }
        {
            let mut ctx = tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
            self.message.local_update(None, &mut ctx);
        }

        if self.ran {
            if let Err(e) = self.session.refresh().await {
                self.report(&e);
            }
        }

        self.switch_pane(input.as_ref().and_then(Input::key));

        for i in 0..self.panels.len() {
            let mut ctx = tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
            let actions = self.panels[i].settle(&mut ctx);
            self.dispatch(Some(i), actions).await;
        }
        let mut ctx = tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
        self.message.settle(&mut ctx);
    }

    async fn synchronize(&mut self) {
        match self.session.leave_idle().await {
            Ok(changed) => self.mailbox.idle = changed,
            Err(e) => warn!("leaving idle failed: {}", e),
        }
        if let Err(e) = self.session.flush().await {
            self.report(&e);
        }
        if let Err(e) = self.session.commit_seek().await {
            self.report(&e);
        }
        if let Err(e) = self.session.refresh().await {
            self.report(&e);
        }
    }

    async fn idle(&mut self) {
        if let Err(e) = self.session.enter_idle().await {
            warn!("entering idle failed: {}", e);
        }
    }

    async fn maybe_reconnect(&mut self) {
        if self.session.is_connected() {
            return;
        }
        if self
            .last_reconnect
            .is_some_and(|t| t.elapsed() < RECONNECT_EVERY)
        {
            return;
        }
        self.last_reconnect = Some(Instant::now());
        match self.session.reconnect().await {
            Ok(()) => info!("reconnected to server"),
            Err(e) => debug!("reconnect failed: {}", e),
        }
    }

    /// Surface a failed command. Connection loss is shown by the message
    /// bar on its own.
    fn report(&mut self, e: &MpdError) {
        warn!("command failed: {}", e);
        if !e.is_fatal() {
            self.mailbox.post_error(e.to_string());
        }
    }

    // ── global keys ──────────────────────────────────────────────────────────

    /// Controller-level handling of the trigger. Returns what the active
    /// panel gets to see.
    async fn round0(&mut self, trigger: Trigger) -> Option<Input> {
        match trigger {
            Trigger::None => None,
            Trigger::Submit(kind, text) => self.submit(kind, text).await,
            Trigger::Key(key) => {
                let actions: Vec<KeyAction> = self.keymap.actions_for(key).collect();
                for action in actions {
                    self.global_key(action).await;
                }
                Some(Input::Key(key))
            }
        }
    }

    async fn global_key(&mut self, action: KeyAction) {
        let status = self.session.snapshot().status.clone();
        let cmd = match action {
            KeyAction::SeekB | KeyAction::SeekF | KeyAction::SeekBp | KeyAction::SeekFp => {
                let step = i64::from((status.total / 100).max(1));
                let delta = match action {
                    KeyAction::SeekB => -1,
                    KeyAction::SeekF => 1,
                    KeyAction::SeekBp => -step,
                    _ => step,
                };
                self.session.seek_by(delta);
                return;
            }
            KeyAction::VolDn | KeyAction::VolUp => {
                let Some(vol) = status.volume else {
                    return;
                };
                let vol = if action == KeyAction::VolDn {
                    vol.saturating_sub(1)
                } else {
                    vol.saturating_add(1).min(100)
                };
                Command::SetVol(vol)
            }
            KeyAction::Pause => Command::Pause(status.state == PlayState::Play),
            KeyAction::Stop => Command::Stop,
            KeyAction::Prev => Command::Previous,
            KeyAction::Next => Command::Next,
            KeyAction::Consume => Command::Consume(!status.consume),
            KeyAction::Random => Command::Random(!status.random),
            KeyAction::Repeat => Command::Repeat(!status.repeat),
            KeyAction::Single => Command::Single(!status.single),
            KeyAction::SavePl => return self.open_prompt(PromptKind::Save),
            KeyAction::LoadPl => return self.open_prompt(PromptKind::Load),
            _ => return,
        };
        self.dispatch(None, vec![Action::run(cmd)]).await;
    }

    async fn submit(&mut self, kind: PromptKind, text: String) -> Option<Input> {
        match kind {
            PromptKind::Save if !text.is_empty() => {
                match self.session.run(&Command::Save(text.clone())).await {
                    Ok(()) => {
                        self.mailbox.post_message(format!("Playlist {text} saved"));
                        self.mailbox.playlist_saved = true;
                    }
                    Err(e) => self.report(&e),
                }
                None
            }
            PromptKind::Load if !text.is_empty() => {
                self.dispatch(
                    None,
                    vec![Action::Run {
                        ok: Some(format!("Playlist {text} loaded")),
                        cmd: Command::Load(text),
                    }],
                )
                .await;
                None
            }
            PromptKind::FindDown | PromptKind::FindUp if !text.is_empty() => {
                self.session.search = SearchState {
                    term: text.clone(),
                    direction: if kind == PromptKind::FindDown { 1 } else { -1 },
                };
                Some(Input::Submit(kind, text))
            }
            PromptKind::DatabaseSearch => Some(Input::Submit(kind, text)),
            _ => None,
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some((kind, Prompt::new(kind.label())));
    }

    fn switch_pane(&mut self, key: Option<Key>) {
        let target = PANE_KEYS
            .iter()
            .find(|(action, _)| self.keymap.is(*action, key))
            .map(|(_, id)| *id);
        match target {
            Some(PanelId::Info) if self.active == PanelId::Info => {
                if let Some(prev) = self.previous {
                    self.previous = Some(self.active);
                    self.active = prev;
                }
            }
            Some(id) => {
                self.previous = Some(self.active);
                self.active = id;
            }
            None if self.mailbox.database_locate.is_some() => self.active = PanelId::Database,
            None if self.mailbox.queue_locate.is_some() => self.active = PanelId::Queue,
            None => {}
        }
    }

    // ── actions ──────────────────────────────────────────────────────────────

    /// Carry out panel actions. Query replies go back to the panel at
    /// `from`; whatever that returns is carried out in turn.
    async fn dispatch(&mut self, from: Option<usize>, actions: Vec<Action>) {
        let mut work: VecDeque<Action> = actions.into();
        while let Some(action) = work.pop_front() {
            debug!("dispatch: {:?}", action);
            match action {
                Action::Run { cmd, ok } => match self.session.run(&cmd).await {
                    Ok(()) => {
                        self.ran = true;
                        if let Some(text) = ok {
                            self.mailbox.post_message(text);
                        }
                    }
                    Err(e) => self.report(&e),
                },
                Action::Defer(cmd) => self.session.defer(cmd),
                Action::Query(req) => {
                    let Some(i) = from else {
                        continue;
                    };
                    let res = self.session.query(&req).await;
                    let mut ctx =
                        tick_context(&self.session, &mut self.mailbox, &self.keymap, self.rate_songs);
                    match res {
                        Ok(reply) => work.extend(self.panels[i].on_reply(reply, &mut ctx)),
                        Err(e) if e.is_fatal() => warn!("query failed: {}", e),
                        Err(e) => {
                            warn!("query {:?} rejected: {}", req, e);
                            self.panels[i].on_failure(&e.to_string(), &mut ctx);
                        }
                    }
                }
                Action::PlayUri(uri) => match self.session.play_uri(&uri).await {
                    Ok(()) => self.ran = true,
                    Err(e) => self.report(&e),
                },
                Action::Prompt(kind) => self.open_prompt(kind),
                Action::SaveLyrics { subject, text } => {
                    match save_lyrics(&self.lyrics_dir, &subject, &text).await {
                        Ok(path) => {
                            info!("saved lyrics to {}", path.display());
                            self.mailbox
                                .post_message(format!("Lyrics {} saved.", subject.cache_name()));
                        }
                        Err(e) => {
                            warn!("saving lyrics failed: {:#}", e);
                            self.mailbox.post_error("Lyrics saving failed.");
                        }
                    }
                }
            }
        }
    }

    // ── drawing ──────────────────────────────────────────────────────────────

    pub fn resize(&mut self, height: u16) {
        let rows = height.saturating_sub(BAR_ROWS) as usize;
        for panel in &mut self.panels {
            panel.resize(rows);
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

        let snapshot = self.session.snapshot();
        let total = self
            .session
            .seek_override()
            .map_or(snapshot.status.total, |s| s.total);
        let view = View {
            snapshot,
            elapsed: self.session.elapsed(),
            total,
            active: self.active,
            keymap: &self.keymap,
            prompt: self.prompt.as_ref().map(|(_, p)| p),
        };

        for panel in &mut self.panels {
            let area: Rect = match panel.id() {
                PanelId::Menu => rows[0],
                PanelId::Line => rows[1],
                PanelId::Progress => rows[3],
                PanelId::Status => rows[4],
                id if id == self.active => rows[2],
                _ => continue,
            };
            panel.render(frame, area, &view);
        }
        // message and prompt share the status row
        if view.prompt.is_some() || self.message.text().is_some() {
            frame.render_widget(Clear, rows[4]);
            self.message.render(frame, rows[4], &view);
        }
    }
}

// ── terminal loop ────────────────────────────────────────────────────────────

/// Leaves raw mode and the alternate screen however `run` exits.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Forward terminal events until the receiver goes away.
fn spawn_input(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("terminal poll failed: {}", e);
                    break;
                }
            }
            let ev = match event::read() {
                Ok(TermEvent::Key(k)) if k.kind == KeyEventKind::Press => Event::Key(k),
                Ok(TermEvent::Resize(w, h)) => Event::Resize(w, h),
                Ok(_) => continue,
                Err(e) => {
                    warn!("terminal read failed: {}", e);
                    break;
                }
            };
            if tx.blocking_send(ev).is_err() {
                break;
            }
        }
    });
}

/// Take over the terminal and run ticks until the quit key.
pub async fn run<R: Remote>(
    remote: R,
    keymap: Keymap,
    config: &Config,
    exchange: LyricsExchange,
) -> anyhow::Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let _guard = TerminalGuard;
    execute!(io::stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("Failed to set up terminal")?;
    let size = terminal.size()?;
    debug!("terminal size {}x{}", size.width, size.height);

    let mut controller = Controller::new(remote, keymap, config, exchange, size.height);
    let poll = Duration::from_millis(config.ui.poll_ms.max(10));

    let (tx, mut rx) = mpsc::channel::<Event>(1024);
    spawn_input(tx);

    // initial sync and draw
    controller.handle(Event::Timer).await;
    terminal.draw(|f| controller.render(f))?;

    loop {
        let event = tokio::select! {
            ev = rx.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
            res = controller.session.wait_remote() => match res {
                Ok(()) => Event::Remote,
                Err(e) => {
                    warn!("lost server while idling: {}", e);
                    Event::Timer
                }
            },
            _ = tokio::time::sleep(poll) => Event::Timer,
        };

        let typed = matches!(event, Event::Key(_));
        if controller.handle(event).await == Flow::Quit {
            break;
        }

        // drop typeahead that piled up during a slow tick
        if typed && !controller.prompt_open() {
            while let Ok(ev) = rx.try_recv() {
                if let Event::Resize(..) = ev {
                    controller.handle(ev).await;
                }
            }
        }

        if let Err(e) = terminal.draw(|f| controller.render(f)) {
            warn!("draw failed: {}", e);
        }
    }

    info!("quitting");
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{Call, MockRemote};
    use ratatui::backend::TestBackend;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use tonearm_proto::protocol::Song;

    fn controller() -> Controller<MockRemote> {
        Controller::new(
            MockRemote::new(),
            Keymap::default(),
            &Config::default(),
            LyricsExchange::new(),
            24,
        )
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn handshake(c: &Controller<MockRemote>) -> Vec<Call> {
        c.session()
            .remote()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Idle | Call::NoIdle))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_idle_alternates_across_tick_kinds() {
        let mut c = controller();
        c.handle(Event::Timer).await;
        c.handle(Event::Remote).await;
        assert_eq!(handshake(&c), vec![Call::Idle, Call::NoIdle, Call::Idle]);

        // a key tick leaves idle and stays out of it
        c.handle(key(KeyCode::Char('s'))).await;
        assert_eq!(
            handshake(&c),
            vec![Call::Idle, Call::NoIdle, Call::Idle, Call::NoIdle]
        );
        assert!(c.session().remote().calls.contains(&Call::Run(Command::Stop)));

        c.handle(Event::Timer).await;
        assert_eq!(handshake(&c).last(), Some(&Call::Idle));
        assert!(c.session().is_idling());
    }

    #[tokio::test]
    async fn test_local_key_never_touches_the_server() {
        let mut c = controller();
        c.handle(Event::Timer).await;
        let before = c.session().remote().calls.len();
        c.handle(key(KeyCode::Char('j'))).await;
        c.handle(key(KeyCode::Char('G'))).await;
        assert_eq!(c.session().remote().calls.len(), before);
        assert!(c.session().is_idling());
    }

    #[tokio::test]
    async fn test_seek_presses_coalesce_into_one_command() {
        let mut c = controller();
        {
            let st = &mut c.session_mut().remote_mut().status;
            st.state = PlayState::Play;
            st.elapsed = 10;
            st.total = 300;
            st.song_id = Some(4);
        }
        c.handle(Event::Timer).await;
        for _ in 0..3 {
            c.handle(key(KeyCode::Right)).await;
        }
        assert_eq!(c.session().elapsed(), 13);
        assert!(c.session().remote().seeks().is_empty());

        c.handle(key(KeyCode::Char('s'))).await;
        assert_eq!(
            c.session().remote().seeks(),
            vec![Command::SeekId { id: 4, secs: 13 }]
        );
    }

    #[tokio::test]
    async fn test_deferred_delete_flushed_on_next_sync() {
        let mut c = controller();
        c.session_mut().remote_mut().queue = (0..3)
            .map(|i| Song {
                id: Some(10 + i),
                ..Song::new(format!("{i}.flac"))
            })
            .collect();
        c.handle(Event::Timer).await;

        c.handle(key(KeyCode::Char('d'))).await;
        assert_eq!(c.session().pending(), &[Command::DeleteId(10)]);
        c.handle(key(KeyCode::Char('j'))).await;
        assert_eq!(c.session().pending(), &[Command::DeleteId(10)]);

        c.handle(Event::Timer).await;
        assert!(c.session().pending().is_empty());
        let calls = c.session().remote().protocol_calls();
        let flush = calls
            .iter()
            .position(|call| *call == Call::Batch(vec![Command::DeleteId(10)]));
        let noidle = calls.iter().rposition(|call| *call == Call::NoIdle);
        assert!(flush.is_some() && noidle < flush);
    }

    #[tokio::test]
    async fn test_reorders_over_local_ticks_flush_as_one_batch() {
        let mut c = controller();
        c.session_mut().remote_mut().queue = (0..3)
            .map(|i| Song {
                id: Some(10 + i),
                ..Song::new(format!("{i}.flac"))
            })
            .collect();
        c.handle(Event::Timer).await;
        let before = c.session().remote().calls.len();

        for ch in ['J', 'J', 'K'] {
            c.handle(key(KeyCode::Char(ch))).await;
        }
        assert_eq!(c.session().remote().calls.len(), before);
        assert_eq!(
            c.session().pending(),
            &[Command::Swap(0, 1), Command::Swap(1, 2), Command::Swap(2, 1)]
        );

        c.handle(Event::Timer).await;
        assert!(c.session().pending().is_empty());
        let tick = &c.session().remote().calls[before..];
        let batches: Vec<usize> = tick
            .iter()
            .enumerate()
            .filter(|(_, call)| matches!(call, Call::Batch(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(batches.len(), 1);
        let flush = batches[0];
        assert_eq!(
            tick[flush],
            Call::Batch(vec![Command::Swap(0, 1), Command::Swap(1, 2), Command::Swap(2, 1)])
        );
        // out of idle first, then the batch, then the fresh snapshot
        assert_eq!(tick[0], Call::NoIdle);
        let status = tick.iter().position(|call| *call == Call::Status);
        assert!(status.is_some_and(|s| flush < s));
    }

    #[tokio::test]
    async fn test_volume_rejection_shows_server_text() {
        let mut c = controller();
        c.session_mut().remote_mut().status.volume = Some(50);
        c.session_mut().remote_mut().reject = vec!["setvol"];
        c.handle(Event::Timer).await;
        c.handle(key(KeyCode::Char('9'))).await;
        assert!(c
            .session()
            .remote()
            .calls
            .contains(&Call::Run(Command::SetVol(49))));
        assert_eq!(c.message.text(), Some("setvol rejected"));
    }

    #[tokio::test]
    async fn test_save_prompt_runs_save() {
        let mut c = controller();
        c.handle(Event::Timer).await;
        c.handle(key(KeyCode::Char('S'))).await;
        assert!(c.prompt_open());
        for ch in "mix".chars() {
            c.handle(key(KeyCode::Char(ch))).await;
        }
        c.handle(key(KeyCode::Enter)).await;
        assert!(!c.prompt_open());
        assert!(c
            .session()
            .remote()
            .calls
            .contains(&Call::Run(Command::Save("mix".into()))));
        assert_eq!(c.message.text(), Some("Playlist mix saved"));
    }

    #[tokio::test]
    async fn test_pane_keys_and_info_toggle() {
        let mut c = controller();
        c.handle(Event::Timer).await;
        assert_eq!(c.active(), PanelId::Queue);
        c.handle(key(KeyCode::F(3))).await;
        assert_eq!(c.active(), PanelId::Database);
        c.handle(key(KeyCode::F(7))).await;
        assert_eq!(c.active(), PanelId::Info);
        c.handle(key(KeyCode::F(7))).await;
        assert_eq!(c.active(), PanelId::Database);
    }

    #[tokio::test]
    async fn test_quit_key() {
        let mut c = controller();
        assert_eq!(c.handle(key(KeyCode::Char('q'))).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_lost_connection_shows_notice_and_retries() {
        let mut c = controller();
        c.handle(Event::Timer).await;
        c.session_mut().remote_mut().dead = true;
        c.handle(key(KeyCode::Char('s'))).await;
        assert!(!c.session().is_connected());
        assert_eq!(
            c.message.text(),
            Some("Connection to server lost, retrying...")
        );

        c.session_mut().remote_mut().dead = false;
        c.handle(Event::Timer).await;
        assert!(c.session().is_connected());
        assert_eq!(c.message.text(), Some("Reconnected."));
    }

    #[tokio::test]
    async fn test_render_draws_bars_and_active_pane() {
        let mut c = controller();
        c.session_mut().remote_mut().status.volume = Some(70);
        c.handle(Event::Timer).await;
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| c.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let row = |y: u16| -> String {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(0).starts_with("Queue"));
        assert!(row(0).trim_end().ends_with("Volume:  70%"));
        assert!(row(11).starts_with("Stopped"));
    }
}
