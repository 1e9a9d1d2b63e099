//! Tick-scoped message board for cross-pane signals.
//!
//! Written during the local-update phase, read during settle, wiped at the
//! start of every tick.

use tonearm_proto::protocol::{Song, Subsystem};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mailbox {
    /// Text for the message bar; last writer wins.
    pub message: Option<String>,
    /// `message` reports a failure.
    pub error: bool,
    /// Subsystems reported by `noidle` this tick.
    pub idle: Vec<Subsystem>,
    /// Uri the queue pane should center on.
    pub queue_locate: Option<String>,
    /// Uri the database pane should center on.
    pub database_locate: Option<String>,
    /// Song under the queue cursor.
    pub queue_selected: Option<Song>,
    /// Uri under the database cursor.
    pub database_selected: Option<String>,
    /// A stored playlist was written this tick.
    pub playlist_saved: bool,
}

impl Mailbox {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn post_message(&mut self, text: impl Into<String>) {
        self.message = Some(text.into());
        self.error = false;
    }

    pub fn post_error(&mut self, text: impl Into<String>) {
        self.message = Some(text.into());
        self.error = true;
    }

    pub fn changed(&self, subsystem: &Subsystem) -> bool {
        self.idle.contains(subsystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_wipes_everything() {
        let mut mb = Mailbox::default();
        mb.post_error("hello");
        assert!(mb.error);
        mb.idle.push(Subsystem::Database);
        mb.queue_locate = Some("a.flac".into());
        mb.playlist_saved = true;
        assert!(mb.changed(&Subsystem::Database));
        mb.clear();
        assert_eq!(mb, Mailbox::default());
    }
}
