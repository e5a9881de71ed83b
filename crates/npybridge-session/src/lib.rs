//! Exchange `.npy` arrays with an interactive interpreter over its text streams.
//!
//! Outbound arrays are encoded, hex-escaped and written as an assignment
//! command. Inbound, the interpreter prints the array's bytes as a quoted
//! literal on the same stdout that carries ordinary output; a
//! [`LineDemultiplexer`] picks those lines out and hands exactly one buffer at
//! a time to the waiting caller through a [`TransferChannel`].

pub mod channel;
pub mod config;
pub mod demux;
pub mod error;
pub mod escape;
pub mod process;
pub mod session;

pub use channel::TransferChannel;
pub use config::SessionConfig;
pub use demux::{classify, LineDemultiplexer, LineKind, Routed, FRAME_PREFIX};
pub use error::{Result, SessionError};
pub use escape::{escape_literal, unescape_literal};
pub use process::{spawn, ProcessSession};
pub use session::Session;
