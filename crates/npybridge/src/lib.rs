//! Move numpy arrays between Rust and an interactive Python process.
//!
//! Arrays are serialized in the `.npy` format and smuggled through the
//! interpreter's ordinary text streams as escaped byte literals.
//!
//! # Crate Structure
//!
//! - [`format`]: `.npy` header and payload codec, typed array access
//! - [`session`]: text-channel escaping, the single-slot transfer channel,
//!   output demultiplexing and interpreter sessions (behind `session` feature)

/// Re-export format types.
pub mod format {
    pub use npybridge_format::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use npybridge_session::*;
}
