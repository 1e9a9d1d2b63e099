//! Background lyrics lookup.
//!
//! The UI and the worker share one slot holding at most one job and one
//! result. The UI side only ever `try_lock`s it, so a slow fetch can never
//! stall a frame; the worker blocks on a `Notify` until a job shows up.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use tonearm_proto::config::LyricsConfig;
use tonearm_proto::lrc::NO_LYRICS;
use tonearm_proto::protocol::Song;

/// Who the lyrics are for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub artist: String,
    pub title: String,
}

impl Subject {
    pub fn of(song: &Song) -> Self {
        Self {
            artist: song.tag_or_empty("artist"),
            title: song.tag_or_empty("title"),
        }
    }

    /// `Artist - Title.lrc`, with path separators neutralised.
    pub fn cache_name(&self) -> String {
        format!(
            "{} - {}.lrc",
            self.artist.replace('/', "_"),
            self.title.replace('/', "_")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricsResult {
    pub subject: Subject,
    pub text: String,
}

#[derive(Default)]
struct Slot {
    /// Set while a lookup is wanted or in flight.
    job: Option<Subject>,
    result: Option<LyricsResult>,
}

/// What a non-blocking poll found.
#[derive(Debug, PartialEq)]
pub enum Poll {
    /// Lyrics for the asked subject.
    Ready(String),
    /// A lookup for the asked subject was just handed to the worker.
    Requested,
    /// Slot contended, or the worker is still on some job.
    Busy,
}

#[derive(Clone, Default)]
pub struct LyricsExchange {
    slot: Arc<Mutex<Slot>>,
    wake: Arc<Notify>,
}

impl LyricsExchange {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// UI side. Takes a matching result, or posts a job for `subject` when
    /// the worker is free. A result for any other subject is stale and
    /// dropped at that point.
    pub fn poll(&self, subject: &Subject) -> Poll {
        let Ok(mut slot) = self.slot.try_lock() else {
            return Poll::Busy;
        };
        if slot.result.as_ref().is_some_and(|r| &r.subject == subject) {
            return match slot.result.take() {
                Some(r) => Poll::Ready(r.text),
                None => Poll::Busy,
            };
        }
        if slot.job.is_some() {
            return Poll::Busy;
        }
        slot.result = None;
        slot.job = Some(subject.clone());
        drop(slot);
        self.wake.notify_one();
        Poll::Requested
    }

    /// Worker side. Waits until a job is posted; the job stays in the slot
    /// until `complete`.
    pub async fn next_job(&self) -> Subject {
        loop {
            let notified = self.wake.notified();
            if let Some(job) = self.lock().job.clone() {
                return job;
            }
            notified.await;
        }
    }

    pub fn complete(&self, result: LyricsResult) {
        let mut slot = self.lock();
        slot.job = None;
        slot.result = Some(result);
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// `Ok(None)` when the source simply has nothing for `subject`.
    async fn fetch(&self, subject: &Subject) -> Result<Option<String>>;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// The worker handles one lookup at a time; a hung request would block
/// every later one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// lrclib.net: synced lyrics when available, plain text otherwise.
pub struct LrcLib {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrcLibTrack {
    synced_lyrics: Option<String>,
    plain_lyrics: Option<String>,
}

impl LrcLib {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tonearm/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .context("Failed to build lyrics HTTP client")?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }
}

impl Fetch for LrcLib {
    async fn fetch(&self, subject: &Subject) -> Result<Option<String>> {
        let url = format!("{}/api/get", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("artist_name", subject.artist.as_str()),
                ("track_name", subject.title.as_str()),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to reach lyrics server")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("lyrics server returned status: {}", response.status());
        }

        let track: LrcLibTrack = response
            .json()
            .await
            .context("Failed to parse lyrics response")?;
        Ok(track
            .synced_lyrics
            .or(track.plain_lyrics)
            .filter(|t| !t.trim().is_empty()))
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

pub struct LyricsWorker<F> {
    exchange: LyricsExchange,
    remote: Option<F>,
    dir: PathBuf,
    cache_fetched: bool,
}

impl<F: Fetch> LyricsWorker<F> {
    pub fn new(exchange: LyricsExchange, remote: Option<F>, config: &LyricsConfig) -> Self {
        Self {
            exchange,
            remote,
            dir: config.dir.clone(),
            cache_fetched: config.cache_fetched,
        }
    }

    pub async fn run(self) {
        loop {
            let subject = self.exchange.next_job().await;
            let text = self.lookup(&subject).await;
            self.exchange.complete(LyricsResult { subject, text });
        }
    }

    /// Cache, then network, then the placeholder.
    pub async fn lookup(&self, subject: &Subject) -> String {
        if subject.title.is_empty() {
            return NO_LYRICS.to_string();
        }

        let path = self.dir.join(subject.cache_name());
        if let Ok(text) = tokio::fs::read_to_string(&path).await {
            debug!("lyrics cache hit: {}", path.display());
            return text;
        }

        if let Some(remote) = &self.remote {
            match remote.fetch(subject).await {
                Ok(Some(text)) => {
                    info!("fetched lyrics for {} - {}", subject.artist, subject.title);
                    if self.cache_fetched {
                        if let Err(e) = save_lyrics(&self.dir, subject, &text).await {
                            warn!("could not cache lyrics: {:#}", e);
                        }
                    }
                    return text;
                }
                Ok(None) => debug!("no lyrics for {} - {}", subject.artist, subject.title),
                Err(e) => warn!("lyrics fetch failed: {:#}", e),
            }
        }

        NO_LYRICS.to_string()
    }
}

/// Write `text` to the cache directory; returns the file written.
pub async fn save_lyrics(dir: &Path, subject: &Subject, text: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(subject.cache_name());
    tokio::fs::write(&path, text)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn subject(artist: &str, title: &str) -> Subject {
        Subject {
            artist: artist.into(),
            title: title.into(),
        }
    }

    fn config(dir: &Path) -> LyricsConfig {
        LyricsConfig {
            dir: dir.to_path_buf(),
            remote: true,
            url: String::new(),
            cache_fetched: true,
        }
    }

    struct Canned {
        text: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Fetch for Canned {
        async fn fetch(&self, _subject: &Subject) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.map(str::to_string))
        }
    }

    #[test]
    fn test_cache_name_strips_slashes() {
        assert_eq!(subject("AC/DC", "T.N.T").cache_name(), "AC_DC - T.N.T.lrc");
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let ex = LyricsExchange::new();
        let a = subject("x", "A");
        let b = subject("x", "B");

        assert_eq!(ex.poll(&a), Poll::Requested);
        assert_eq!(ex.next_job().await, a);

        // song changed while A is in flight
        assert_eq!(ex.poll(&b), Poll::Busy);
        ex.complete(LyricsResult {
            subject: a.clone(),
            text: "lyrics of A".into(),
        });

        // A's result must not be shown for B; B gets its own job
        assert_eq!(ex.poll(&b), Poll::Requested);
        assert_eq!(ex.next_job().await, b);
        assert_eq!(ex.poll(&b), Poll::Busy);
        ex.complete(LyricsResult {
            subject: b.clone(),
            text: "lyrics of B".into(),
        });
        assert_eq!(ex.poll(&b), Poll::Ready("lyrics of B".into()));
    }

    #[tokio::test]
    async fn test_poll_never_blocks_on_held_slot() {
        let ex = LyricsExchange::new();
        let _held = ex.slot.lock().unwrap();
        assert_eq!(ex.poll(&subject("a", "b")), Poll::Busy);
    }

    #[tokio::test]
    async fn test_lookup_prefers_cache() {
        let dir = tempfile::tempdir().unwrap();
        let s = subject("Band", "Song");
        std::fs::write(dir.path().join(s.cache_name()), "[00:01.00]cached").unwrap();
        let remote = Canned {
            text: Some("[00:01.00]remote"),
            calls: AtomicUsize::new(0),
        };
        let worker = LyricsWorker::new(LyricsExchange::new(), Some(remote), &config(dir.path()));
        assert_eq!(worker.lookup(&s).await, "[00:01.00]cached");
        assert_eq!(worker.remote.as_ref().unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetched_lyrics_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let s = subject("Band", "Song");
        let remote = Canned {
            text: Some("[00:01.00]remote"),
            calls: AtomicUsize::new(0),
        };
        let worker = LyricsWorker::new(LyricsExchange::new(), Some(remote), &config(dir.path()));
        assert_eq!(worker.lookup(&s).await, "[00:01.00]remote");
        let cached = std::fs::read_to_string(dir.path().join(s.cache_name())).unwrap();
        assert_eq!(cached, "[00:01.00]remote");
    }

    #[test]
    fn test_lrclib_payload_decodes() {
        let body = r#"{"id":3396226,"trackName":"I Want to Live","artistName":"Borislav Slavov",
            "instrumental":false,"plainLyrics":"I feel your breath","syncedLyrics":null}"#;
        let track: LrcLibTrack = serde_json::from_str(body).unwrap();
        assert_eq!(track.synced_lyrics, None);
        assert_eq!(track.plain_lyrics.as_deref(), Some("I feel your breath"));
    }

    #[tokio::test]
    async fn test_hung_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            // accept and never answer
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let lrclib =
            LrcLib::with_timeout(format!("http://127.0.0.1:{port}"), Duration::from_millis(200))
                .unwrap();
        let res = tokio::time::timeout(Duration::from_secs(5), lrclib.fetch(&subject("a", "b")))
            .await
            .expect("fetch should give up on its own");
        assert!(res.is_err());
        server.abort();
    }

    #[tokio::test]
    async fn test_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Canned {
            text: None,
            calls: AtomicUsize::new(0),
        };
        let worker = LyricsWorker::new(LyricsExchange::new(), Some(remote), &config(dir.path()));
        assert_eq!(worker.lookup(&subject("a", "b")).await, NO_LYRICS);
        assert_eq!(worker.lookup(&subject("a", "")).await, NO_LYRICS);
    }

    #[tokio::test]
    async fn test_worker_answers_posted_job() {
        let dir = tempfile::tempdir().unwrap();
        let ex = LyricsExchange::new();
        let worker: LyricsWorker<Canned> = LyricsWorker::new(ex.clone(), None, &config(dir.path()));
        let handle = tokio::spawn(worker.run());

        let s = subject("a", "b");
        assert_eq!(ex.poll(&s), Poll::Requested);
        let mut got = None;
        for _ in 0..100 {
            if let Poll::Ready(text) = ex.poll(&s) {
                got = Some(text);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert_eq!(got.as_deref(), Some(NO_LYRICS));
    }
}
