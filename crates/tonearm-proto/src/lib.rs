//! MPD protocol client, typed reply data, LRC parsing and the on-disk
//! configuration shared by the `tonearm` binary.

pub mod client;
pub mod config;
pub mod error;
pub mod lrc;
pub mod platform;
pub mod protocol;

pub use client::MpdClient;
pub use error::MpdError;
