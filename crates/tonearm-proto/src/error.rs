use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpdError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected a command: `ACK [code@index] {command} message`.
    #[error("{message}")]
    Ack {
        code: u32,
        index: u32,
        command: String,
        message: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed by server")]
    Closed,

    #[error("timed out waiting for server")]
    Timeout,
}

/// `ACK` error codes we react to.
pub const ACK_ERROR_NO_EXIST: u32 = 50;

impl MpdError {
    /// Connection-level failure: the session must reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MpdError::Io(_) | MpdError::Closed | MpdError::Timeout)
    }

    /// Parse an `ACK [50@0] {play} No such song` line.
    pub fn from_ack_line(line: &str) -> Self {
        let malformed = || MpdError::Protocol(format!("bad ACK line: {line}"));
        let Some(rest) = line.strip_prefix("ACK [") else {
            return malformed();
        };
        let Some((codes, rest)) = rest.split_once("] {") else {
            return malformed();
        };
        let Some((command, message)) = rest.split_once('}') else {
            return malformed();
        };
        let (code, index) = codes.split_once('@').unwrap_or((codes, "0"));
        MpdError::Ack {
            code: code.parse().unwrap_or(0),
            index: index.parse().unwrap_or(0),
            command: command.to_string(),
            message: message.trim_start().to_string(),
        }
    }
}
