//! Session — connection state and the idle/noidle handshake.
//!
//! The server accepts normal commands only when we are not idling, and
//! `idle` / `noidle` must strictly alternate. Every method that talks to the
//! server goes through `ensure_active()`, so no caller can send a command
//! into an idling connection or send `noidle` twice.

use tonearm_proto::protocol::{Command, Song, Stats, Status, Subsystem};
use tonearm_proto::MpdError;
use tracing::debug;

use crate::remote::{Remote, Reply, Request};

/// Immutable per-tick copy of the server state, replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub status: Status,
    pub stats: Stats,
    pub current: Option<Song>,
}

/// An uncommitted local seek position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekOverride {
    pub elapsed: u32,
    pub total: u32,
}

/// Last find term and its direction (+1 down, -1 up).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub term: String,
    pub direction: i8,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            term: String::new(),
            direction: 1,
        }
    }
}

pub struct Session<R> {
    remote: R,
    idling: bool,
    /// Server synchronized during the current tick.
    pub syncing: bool,
    pending: Vec<Command>,
    seek: Option<SeekOverride>,
    pub search: SearchState,
    snapshot: Snapshot,
    /// Changes collected by an implicit `noidle`, handed out by the next
    /// explicit `leave_idle`.
    missed: Vec<Subsystem>,
    connected: bool,
}

impl<R: Remote> Session<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            idling: false,
            syncing: false,
            pending: Vec::new(),
            seek: None,
            search: SearchState::default(),
            snapshot: Snapshot::default(),
            missed: Vec::new(),
            connected: true,
        }
    }

    pub fn is_idling(&self) -> bool {
        self.idling
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn pending(&self) -> &[Command] {
        &self.pending
    }

    #[cfg(test)]
    pub fn remote(&self) -> &R {
        &self.remote
    }

    #[cfg(test)]
    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    // ── idle handshake ───────────────────────────────────────────────────────

    /// Send `idle`. No-op when already idling.
    pub async fn enter_idle(&mut self) -> Result<(), MpdError> {
        if self.idling || !self.connected {
            return Ok(());
        }
        let res = self.remote.send_idle().await;
        self.note(res)?;
        self.idling = true;
        Ok(())
    }

    /// Send `noidle` and return what changed, including anything an implicit
    /// leave collected earlier. No-op (apart from draining that backlog)
    /// when not idling.
    pub async fn leave_idle(&mut self) -> Result<Vec<Subsystem>, MpdError> {
        self.ensure_active().await?;
        Ok(std::mem::take(&mut self.missed))
    }

    async fn ensure_active(&mut self) -> Result<(), MpdError> {
        if !self.connected {
            return Err(MpdError::Closed);
        }
        if self.idling {
            // clear first: a failed noidle leaves the socket unusable anyway
            self.idling = false;
            let res = self.remote.noidle().await;
            let changed = self.note(res)?;
            debug!("left idle: {:?}", changed);
            self.missed.extend(changed);
        }
        Ok(())
    }

    /// Resolves when the idling connection has something to report.
    /// Pending forever when not idling.
    pub async fn wait_remote(&mut self) -> Result<(), MpdError> {
        if !self.idling {
            return std::future::pending().await;
        }
        let res = self.remote.wait_readable().await;
        self.note(res)
    }

    /// Pass a remote result through, flagging the connection as lost on
    /// fatal errors.
    fn note<T>(&mut self, res: Result<T, MpdError>) -> Result<T, MpdError> {
        if let Err(e) = &res {
            if e.is_fatal() {
                self.mark_lost();
            }
        }
        res
    }

    fn mark_lost(&mut self) {
        if self.connected {
            tracing::error!("connection to server lost");
        }
        self.connected = false;
        self.idling = false;
    }

    pub async fn reconnect(&mut self) -> Result<(), MpdError> {
        self.remote.reconnect().await?;
        self.connected = true;
        self.idling = false;
        Ok(())
    }

    // ── commands ─────────────────────────────────────────────────────────────

    /// Queue a command for the next flush.
    pub fn defer(&mut self, cmd: Command) {
        debug!("deferred: {}", cmd);
        self.pending.push(cmd);
    }

    /// Send every deferred command as one command list, in issue order.
    pub async fn flush(&mut self) -> Result<(), MpdError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.ensure_active().await?;
        let batch = std::mem::take(&mut self.pending);
        let res = self.remote.command_list(&batch).await;
        self.note(res)
    }

    pub async fn run(&mut self, cmd: &Command) -> Result<(), MpdError> {
        self.ensure_active().await?;
        let res = self.remote.run(cmd).await;
        self.note(res)
    }

    pub async fn query(&mut self, req: &Request) -> Result<Reply, MpdError> {
        self.ensure_active().await?;
        let res = self.remote.query(req).await;
        self.note(res)
    }

    /// Play `uri`, adding it to the queue first if it is not there.
    pub async fn play_uri(&mut self, uri: &str) -> Result<(), MpdError> {
        self.ensure_active().await?;
        let res = self.remote.find_in_queue(uri).await;
        let id = match self.note(res)? {
            Some(id) => id,
            None => {
                let res = self.remote.add_id(uri).await;
                self.note(res)?
            }
        };
        let res = self.remote.run(&Command::PlayId(id)).await;
        self.note(res)
    }

    /// Fetch status, stats and current song into a fresh snapshot.
    pub async fn refresh(&mut self) -> Result<(), MpdError> {
        self.ensure_active().await?;
        let res = self.remote.status().await;
        let status = self.note(res)?;
        let res = self.remote.stats().await;
        let stats = self.note(res)?;
        let res = self.remote.currentsong().await;
        let current = self.note(res)?;
        self.snapshot = Snapshot {
            status,
            stats,
            current,
        };
        Ok(())
    }

    // ── seek coalescing ──────────────────────────────────────────────────────

    /// Step the local seek position by `delta` seconds. Starts from the
    /// snapshot position; ignored unless playing or paused.
    pub fn seek_by(&mut self, delta: i64) {
        let status = &self.snapshot.status;
        if !status.state.is_active() {
            return;
        }
        let cur = self.seek.unwrap_or(SeekOverride {
            elapsed: status.elapsed,
            total: status.total,
        });
        let elapsed = (cur.elapsed as i64 + delta).clamp(0, cur.total as i64) as u32;
        self.seek = Some(SeekOverride {
            elapsed,
            total: cur.total,
        });
    }

    pub fn seek_override(&self) -> Option<SeekOverride> {
        self.seek
    }

    /// Elapsed seconds to display: the local seek if one is pending.
    pub fn elapsed(&self) -> u32 {
        self.seek
            .map_or(self.snapshot.status.elapsed, |s| s.elapsed)
    }

    /// Send the pending seek, if any, as a single `seekid`.
    pub async fn commit_seek(&mut self) -> Result<(), MpdError> {
        let Some(seek) = self.seek.take() else {
            return Ok(());
        };
        let status = &self.snapshot.status;
        if !status.state.is_active() {
            return Ok(());
        }
        let Some(id) = status.song_id else {
            return Ok(());
        };
        self.run(&Command::SeekId {
            id,
            secs: seek.elapsed,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{Call, MockRemote};
    use tonearm_proto::protocol::PlayState;

    fn session() -> Session<MockRemote> {
        Session::new(MockRemote::new())
    }

    #[tokio::test]
    async fn test_enter_idle_twice_sends_once() {
        let mut s = session();
        s.enter_idle().await.unwrap();
        s.enter_idle().await.unwrap();
        assert!(s.is_idling());
        assert_eq!(s.remote().protocol_calls(), vec![Call::Idle]);
    }

    #[tokio::test]
    async fn test_leave_idle_twice_sends_once() {
        let mut s = session();
        s.enter_idle().await.unwrap();
        s.remote_mut().changes.push_back(vec![Subsystem::Player]);
        assert_eq!(s.leave_idle().await.unwrap(), vec![Subsystem::Player]);
        assert_eq!(s.leave_idle().await.unwrap(), vec![]);
        assert_eq!(s.remote().protocol_calls(), vec![Call::Idle, Call::NoIdle]);
    }

    #[tokio::test]
    async fn test_command_while_idling_leaves_first() {
        let mut s = session();
        s.enter_idle().await.unwrap();
        s.remote_mut().changes.push_back(vec![Subsystem::Mixer]);
        s.run(&Command::Stop).await.unwrap();
        assert_eq!(
            s.remote().protocol_calls(),
            vec![Call::Idle, Call::NoIdle, Call::Run(Command::Stop)]
        );
        // the implicit leave kept its notifications
        assert_eq!(s.leave_idle().await.unwrap(), vec![Subsystem::Mixer]);
    }

    #[tokio::test]
    async fn test_flush_preserves_order_and_clears() {
        let mut s = session();
        s.defer(Command::DeleteId(7));
        s.defer(Command::Swap(2, 3));
        s.defer(Command::DeleteId(1));
        s.flush().await.unwrap();
        s.flush().await.unwrap();
        assert!(s.pending().is_empty());
        assert_eq!(
            s.remote().protocol_calls(),
            vec![Call::Batch(vec![
                Command::DeleteId(7),
                Command::Swap(2, 3),
                Command::DeleteId(1)
            ])]
        );
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let mut s = session();
        s.remote_mut().status.volume = Some(40);
        s.refresh().await.unwrap();
        assert_eq!(s.snapshot().status.volume, Some(40));
        s.remote_mut().status = Status::default();
        s.refresh().await.unwrap();
        assert_eq!(s.snapshot().status.volume, None);
    }

    #[tokio::test]
    async fn test_seek_clamps_and_commits_once() {
        let mut s = session();
        {
            let st = &mut s.remote_mut().status;
            st.state = PlayState::Play;
            st.elapsed = 8;
            st.total = 10;
            st.song_id = Some(3);
        }
        s.refresh().await.unwrap();
        s.seek_by(1);
        s.seek_by(5);
        assert_eq!(s.elapsed(), 10);
        s.seek_by(-20);
        assert_eq!(s.elapsed(), 0);
        s.commit_seek().await.unwrap();
        s.commit_seek().await.unwrap();
        assert_eq!(s.remote().seeks(), vec![Command::SeekId { id: 3, secs: 0 }]);
        assert_eq!(s.elapsed(), 8);
    }

    #[tokio::test]
    async fn test_seek_ignored_when_stopped() {
        let mut s = session();
        s.refresh().await.unwrap();
        s.seek_by(1);
        assert_eq!(s.seek_override(), None);
    }

    #[tokio::test]
    async fn test_play_uri_adds_when_missing() {
        let mut s = session();
        s.remote_mut().queue = vec![Song {
            id: Some(9),
            ..Song::new("there.flac")
        }];
        s.play_uri("there.flac").await.unwrap();
        s.play_uri("new.flac").await.unwrap();
        let calls = s.remote().protocol_calls();
        assert!(calls.contains(&Call::Run(Command::PlayId(9))));
        assert!(calls.contains(&Call::AddId("new.flac".into())));
        assert!(calls.contains(&Call::Run(Command::PlayId(101))));
    }

    #[tokio::test]
    async fn test_lost_connection_is_flagged() {
        let mut s = session();
        s.remote_mut().dead = true;
        assert!(s.refresh().await.unwrap_err().is_fatal());
        assert!(!s.is_connected());
        assert!(s.enter_idle().await.is_ok());
        assert!(!s.is_idling());
        assert!(s.reconnect().await.is_err());
        s.remote_mut().dead = false;
        s.reconnect().await.unwrap();
        assert!(s.is_connected());
    }
}
