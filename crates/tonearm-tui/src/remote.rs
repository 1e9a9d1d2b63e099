//! The seam between the session and the server connection.
//!
//! `Session` only ever talks to a `Remote`; production wires in
//! `MpdClient`, tests wire in `MockRemote` and assert on what was sent.

use tonearm_proto::protocol::{Command, DirEntry, Output, Song, Stats, Status, Subsystem};
use tonearm_proto::{MpdClient, MpdError};

/// Read-only queries panes ask for. Replies are routed back to the asking pane.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    PlaylistInfo,
    /// Sticker ratings for each uri, in order.
    Ratings(Vec<String>),
    LsInfo(String),
    List {
        tag: String,
        filter: Option<(String, String)>,
    },
    Find(Vec<(String, String)>),
    Search {
        tag: String,
        value: String,
    },
    Outputs,
    ListAllInfo(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Songs(Vec<Song>),
    Ratings(Vec<u8>),
    Entries(Vec<DirEntry>),
    Values(Vec<String>),
    Outputs(Vec<Output>),
}

#[allow(async_fn_in_trait)]
pub trait Remote {
    async fn send_idle(&mut self) -> Result<(), MpdError>;
    async fn noidle(&mut self) -> Result<Vec<Subsystem>, MpdError>;
    /// Resolves when the server has something to say while idling.
    async fn wait_readable(&mut self) -> Result<(), MpdError>;
    async fn run(&mut self, cmd: &Command) -> Result<(), MpdError>;
    async fn command_list(&mut self, cmds: &[Command]) -> Result<(), MpdError>;
    async fn status(&mut self) -> Result<Status, MpdError>;
    async fn stats(&mut self) -> Result<Stats, MpdError>;
    async fn currentsong(&mut self) -> Result<Option<Song>, MpdError>;
    async fn query(&mut self, req: &Request) -> Result<Reply, MpdError>;
    /// Queue id of `uri` in the current queue, if present.
    async fn find_in_queue(&mut self, uri: &str) -> Result<Option<u32>, MpdError>;
    async fn add_id(&mut self, uri: &str) -> Result<u32, MpdError>;
    async fn reconnect(&mut self) -> Result<(), MpdError>;
}

fn parse_rating(value: Option<String>) -> u8 {
    value
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map_or(0, |r| r.min(5))
}

impl Remote for MpdClient {
    async fn send_idle(&mut self) -> Result<(), MpdError> {
        MpdClient::send_idle(self).await
    }

    async fn noidle(&mut self) -> Result<Vec<Subsystem>, MpdError> {
        MpdClient::noidle(self).await
    }

    async fn wait_readable(&mut self) -> Result<(), MpdError> {
        MpdClient::wait_readable(self).await
    }

    async fn run(&mut self, cmd: &Command) -> Result<(), MpdError> {
        MpdClient::run(self, cmd).await.map(|_| ())
    }

    async fn command_list(&mut self, cmds: &[Command]) -> Result<(), MpdError> {
        MpdClient::command_list(self, cmds).await
    }

    async fn status(&mut self) -> Result<Status, MpdError> {
        MpdClient::status(self).await
    }

    async fn stats(&mut self) -> Result<Stats, MpdError> {
        MpdClient::stats(self).await
    }

    async fn currentsong(&mut self) -> Result<Option<Song>, MpdError> {
        MpdClient::currentsong(self).await
    }

    async fn query(&mut self, req: &Request) -> Result<Reply, MpdError> {
        let reply = match req {
            Request::PlaylistInfo => Reply::Songs(self.playlistinfo().await?),
            Request::Ratings(uris) => {
                let mut ratings = Vec::with_capacity(uris.len());
                for uri in uris {
                    ratings.push(parse_rating(self.sticker_get(uri, "rating").await?));
                }
                Reply::Ratings(ratings)
            }
            Request::LsInfo(dir) => Reply::Entries(self.lsinfo(dir).await?),
            Request::List { tag, filter } => {
                let filter = filter.as_ref().map(|(t, v)| (t.as_str(), v.as_str()));
                Reply::Values(self.list(tag, filter).await?)
            }
            Request::Find(filters) => {
                let filters: Vec<(&str, &str)> = filters
                    .iter()
                    .map(|(t, v)| (t.as_str(), v.as_str()))
                    .collect();
                Reply::Songs(self.find(&filters).await?)
            }
            Request::Search { tag, value } => Reply::Songs(self.search(tag, value).await?),
            Request::Outputs => Reply::Outputs(self.outputs().await?),
            Request::ListAllInfo(uri) => Reply::Songs(self.listallinfo(uri).await?),
        };
        Ok(reply)
    }

    async fn find_in_queue(&mut self, uri: &str) -> Result<Option<u32>, MpdError> {
        let songs = self.playlistfind("file", uri).await?;
        Ok(songs.first().and_then(|s| s.id))
    }

    async fn add_id(&mut self, uri: &str) -> Result<u32, MpdError> {
        self.addid(uri).await
    }

    async fn reconnect(&mut self) -> Result<(), MpdError> {
        MpdClient::reconnect(self).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_sticker_values() {
        assert_eq!(parse_rating(None), 0);
        assert_eq!(parse_rating(Some("4".into())), 4);
        assert_eq!(parse_rating(Some("9".into())), 5);
        assert_eq!(parse_rating(Some("bogus".into())), 0);
    }
}
