/// MPD connection: one socket, strictly request/reply.
///
/// ```text
///   connect()  → read "OK MPD <version>"
///   command()  → "<line>\n"           ← pairs… "OK" | "ACK …"
///   send_idle()→ "idle\n"             (reply left unread)
///   noidle()   → "noidle\n"           ← "changed: …"… "OK"
///   command_list() → begin / cmds / end in one write ← "list_OK"… "OK"
/// ```
///
/// The reader half is a `BufReader` so `wait_readable()` can park on
/// `fill_buf()` while idling without consuming anything.
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::error::{MpdError, ACK_ERROR_NO_EXIST};
use crate::protocol::{
    changed_from_pairs, entries_from_pairs, outputs_from_pairs, parse_pair, quote,
    songs_from_pairs, values_of, Command, DirEntry, Output, Pairs, Song, Stats, Status, Subsystem,
};

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

pub struct MpdClient {
    reader: Reader,
    writer: Writer,
    timeout: Duration,
    version: String,
    host: String,
    port: u16,
}

impl MpdClient {
    /// Connect over TCP, or over a Unix socket when `host` is an absolute path.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, MpdError> {
        let (reader, writer): (Box<dyn AsyncRead + Send + Unpin>, Writer) = {
            #[cfg(unix)]
            {
                if host.starts_with('/') {
                    let stream = tokio::time::timeout(timeout, UnixStream::connect(host))
                        .await
                        .map_err(|_| MpdError::Timeout)??;
                    let (r, w) = tokio::io::split(stream);
                    (Box::new(r), Box::new(w))
                } else {
                    Self::tcp(host, port, timeout).await?
                }
            }
            #[cfg(not(unix))]
            {
                Self::tcp(host, port, timeout).await?
            }
        };

        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
            timeout,
            version: String::new(),
            host: host.to_string(),
            port,
        };

        let greeting = client.read_line_timed().await?;
        let version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| MpdError::Protocol(format!("unexpected greeting: {greeting}")))?;
        client.version = version.to_string();
        info!("Connected to MPD {} at {}:{}", client.version, host, port);
        Ok(client)
    }

    async fn tcp(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<(Box<dyn AsyncRead + Send + Unpin>, Writer), MpdError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| MpdError::Timeout)??;
        stream.set_nodelay(true)?;
        let (r, w) = stream.into_split();
        Ok((Box::new(r), Box::new(w)))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Drop the current socket and dial the same server again.
    pub async fn reconnect(&mut self) -> Result<(), MpdError> {
        let host = self.host.clone();
        *self = Self::connect(&host, self.port, self.timeout).await?;
        Ok(())
    }

    // ── raw line I/O ─────────────────────────────────────────────────────────

    async fn write_raw(&mut self, data: &str) -> Result<(), MpdError> {
        self.writer.write_all(data.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, MpdError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(MpdError::Closed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    async fn read_line_timed(&mut self) -> Result<String, MpdError> {
        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.read_line())
            .await
            .map_err(|_| MpdError::Timeout)?
    }

    /// Read pairs up to the terminating `OK`. `list_OK` separators are skipped.
    /// The whole reply is always consumed, even past a malformed line, so the
    /// next command starts on a clean stream.
    async fn read_reply(&mut self) -> Result<Pairs, MpdError> {
        let mut pairs = Vec::new();
        let mut bad: Option<String> = None;
        loop {
            let line = self.read_line_timed().await?;
            if line == "OK" {
                return match bad {
                    Some(line) => Err(MpdError::Protocol(format!("unparseable line: {line}"))),
                    None => Ok(pairs),
                };
            }
            if line == "list_OK" {
                continue;
            }
            if line.starts_with("ACK ") {
                return Err(MpdError::from_ack_line(&line));
            }
            match parse_pair(&line) {
                Some(pair) => pairs.push(pair),
                None => {
                    warn!("mpd < unparseable line: {}", line);
                    bad.get_or_insert(line);
                }
            }
        }
    }

    // ── request / reply ──────────────────────────────────────────────────────

    pub async fn command(&mut self, line: &str) -> Result<Pairs, MpdError> {
        debug!("mpd > {}", line);
        self.write_raw(&format!("{line}\n")).await?;
        self.read_reply().await
    }

    pub async fn run(&mut self, cmd: &Command) -> Result<Pairs, MpdError> {
        self.command(&cmd.to_line()).await
    }

    /// Enter idle. The reply arrives only when something changes, so it is
    /// left on the socket for [`MpdClient::noidle`].
    pub async fn send_idle(&mut self) -> Result<(), MpdError> {
        debug!("mpd > idle");
        self.write_raw("idle\n").await
    }

    /// Leave idle and collect what changed meanwhile (possibly nothing).
    pub async fn noidle(&mut self) -> Result<Vec<Subsystem>, MpdError> {
        debug!("mpd > noidle");
        self.write_raw("noidle\n").await?;
        let pairs = self.read_reply().await?;
        Ok(changed_from_pairs(&pairs))
    }

    /// Resolve once the server has bytes for us. Cancel-safe: nothing is
    /// consumed, so dropping the future mid-wait loses no data.
    pub async fn wait_readable(&mut self) -> Result<(), MpdError> {
        let buf = self.reader.fill_buf().await?;
        if buf.is_empty() {
            return Err(MpdError::Closed);
        }
        Ok(())
    }

    /// Send every command in one `command_list_ok_begin` block. The first
    /// rejection aborts the rest and is returned.
    pub async fn command_list(&mut self, cmds: &[Command]) -> Result<(), MpdError> {
        if cmds.is_empty() {
            return Ok(());
        }
        let mut block = String::from("command_list_ok_begin\n");
        for cmd in cmds {
            debug!("mpd > [list] {}", cmd);
            block.push_str(&cmd.to_line());
            block.push('\n');
        }
        block.push_str("command_list_end\n");
        self.write_raw(&block).await?;
        self.read_reply().await.map(|_| ())
    }

    // ── typed queries ────────────────────────────────────────────────────────

    pub async fn status(&mut self) -> Result<Status, MpdError> {
        Ok(Status::from_pairs(&self.command("status").await?))
    }

    pub async fn stats(&mut self) -> Result<Stats, MpdError> {
        Ok(Stats::from_pairs(&self.command("stats").await?))
    }

    pub async fn currentsong(&mut self) -> Result<Option<Song>, MpdError> {
        Ok(Song::from_pairs(&self.command("currentsong").await?))
    }

    pub async fn playlistinfo(&mut self) -> Result<Vec<Song>, MpdError> {
        Ok(songs_from_pairs(&self.command("playlistinfo").await?))
    }

    pub async fn lsinfo(&mut self, dir: &str) -> Result<Vec<DirEntry>, MpdError> {
        let line = if dir.is_empty() {
            "lsinfo".to_string()
        } else {
            format!("lsinfo {}", quote(dir))
        };
        Ok(entries_from_pairs(&self.command(&line).await?))
    }

    /// `list <tag> [<filter tag> <value>]` → distinct values.
    pub async fn list(
        &mut self,
        tag: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<String>, MpdError> {
        let line = match filter {
            Some((ftag, value)) => format!("list {} {} {}", tag, ftag, quote(value)),
            None => format!("list {tag}"),
        };
        let pairs = self.command(&line).await?;
        Ok(values_of(&pairs, tag))
    }

    /// `find` with one or more `tag value` constraints.
    pub async fn find(&mut self, filters: &[(&str, &str)]) -> Result<Vec<Song>, MpdError> {
        let mut line = String::from("find");
        for (tag, value) in filters {
            line.push(' ');
            line.push_str(tag);
            line.push(' ');
            line.push_str(&quote(value));
        }
        Ok(songs_from_pairs(&self.command(&line).await?))
    }

    /// Substring search, used by the search pane.
    pub async fn search(&mut self, tag: &str, value: &str) -> Result<Vec<Song>, MpdError> {
        let line = format!("search {} {}", tag, quote(value));
        Ok(songs_from_pairs(&self.command(&line).await?))
    }

    pub async fn playlistfind(&mut self, tag: &str, value: &str) -> Result<Vec<Song>, MpdError> {
        let line = format!("playlistfind {} {}", tag, quote(value));
        Ok(songs_from_pairs(&self.command(&line).await?))
    }

    pub async fn outputs(&mut self) -> Result<Vec<Output>, MpdError> {
        Ok(outputs_from_pairs(&self.command("outputs").await?))
    }

    pub async fn listallinfo(&mut self, uri: &str) -> Result<Vec<Song>, MpdError> {
        let line = format!("listallinfo {}", quote(uri));
        Ok(songs_from_pairs(&self.command(&line).await?))
    }

    /// Add `uri` and return the new song id.
    pub async fn addid(&mut self, uri: &str) -> Result<u32, MpdError> {
        let pairs = self.run(&Command::AddId(uri.to_string())).await?;
        values_of(&pairs, "Id")
            .first()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| MpdError::Protocol("addid reply without Id".into()))
    }

    /// `None` when the sticker is not set.
    pub async fn sticker_get(&mut self, uri: &str, name: &str) -> Result<Option<String>, MpdError> {
        let line = format!("sticker get song {} {}", quote(uri), quote(name));
        match self.command(&line).await {
            Ok(pairs) => {
                let prefix = format!("{name}=");
                Ok(values_of(&pairs, "sticker")
                    .into_iter()
                    .find_map(|v| v.strip_prefix(&prefix).map(str::to_string)))
            }
            Err(MpdError::Ack { code, .. }) if code == ACK_ERROR_NO_EXIST => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Fake server: greets, then for every request line answers with the
    /// next canned reply. Returns the request lines it saw.
    async fn fake_server(replies: Vec<&'static str>) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (r, mut w) = stream.into_split();
            let mut r = BufReader::new(r);
            w.write_all(b"OK MPD 0.23.5\n").await.unwrap();
            let mut seen = Vec::new();
            let mut replies = replies.into_iter();
            let mut in_list = false;
            loop {
                let mut line = String::new();
                if r.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let line = line.trim_end().to_string();
                seen.push(line.clone());
                if line == "command_list_ok_begin" {
                    in_list = true;
                    continue;
                }
                if in_list && line != "command_list_end" {
                    continue;
                }
                in_list = false;
                if line == "idle" {
                    continue;
                }
                match replies.next() {
                    Some(reply) => w.write_all(reply.as_bytes()).await.unwrap(),
                    None => break,
                }
            }
            seen
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_greeting_and_status() {
        let (port, server) =
            fake_server(vec!["state: play\nvolume: 30\ntime: 5:100\nsongid: 2\nOK\n"]).await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(client.version(), "0.23.5");
        let st = client.status().await.unwrap();
        assert_eq!(st.volume, Some(30));
        assert_eq!(st.elapsed, 5);
        drop(client);
        assert_eq!(server.await.unwrap(), vec!["status"]);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_drained() {
        let (port, _server) = fake_server(vec![
            "weird\nstate: play\nvolume: 30\nOK\n",
            "state: stop\nvolume: 99\nOK\n",
        ])
        .await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
        assert!(!err.is_fatal());
        let st = client.status().await.unwrap();
        assert_eq!(st.volume, Some(99));
    }

    #[tokio::test]
    async fn test_ack_surfaces_as_error() {
        let (port, _server) = fake_server(vec!["ACK [50@0] {load} No such playlist\n"]).await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        let err = client.run(&Command::Load("nope".into())).await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "No such playlist");
    }

    #[tokio::test]
    async fn test_idle_then_noidle_collects_changes() {
        let (port, server) = fake_server(vec!["changed: player\nchanged: mixer\nOK\n"]).await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        client.send_idle().await.unwrap();
        let changed = client.noidle().await.unwrap();
        assert_eq!(changed, vec![Subsystem::Player, Subsystem::Mixer]);
        drop(client);
        assert_eq!(server.await.unwrap(), vec!["idle", "noidle"]);
    }

    #[tokio::test]
    async fn test_command_list_is_one_block_in_order() {
        let (port, server) = fake_server(vec!["list_OK\nlist_OK\nOK\n"]).await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        client
            .command_list(&[Command::DeleteId(4), Command::Swap(1, 2)])
            .await
            .unwrap();
        drop(client);
        assert_eq!(
            server.await.unwrap(),
            vec![
                "command_list_ok_begin",
                "deleteid 4",
                "swap 1 2",
                "command_list_end"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_sticker_is_none() {
        let (port, _server) = fake_server(vec![
            "ACK [50@0] {sticker} no such sticker\n",
            "sticker: rating=4\nOK\n",
        ])
        .await;
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(client.sticker_get("a.flac", "rating").await.unwrap(), None);
        assert_eq!(
            client.sticker_get("a.flac", "rating").await.unwrap().as_deref(),
            Some("4")
        );
    }

    #[tokio::test]
    async fn test_eof_while_idle_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"OK MPD 0.23.5\n").await.unwrap();
        });
        let mut client = MpdClient::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        let err = client.wait_readable().await.unwrap_err();
        assert!(matches!(err, MpdError::Closed));
    }
}
