//! Playback core: at most one player process, driven through its stdin.
//!
//! - `commands.rs` - command names and the key sequences the player reads
//! - `catalog.rs` - playable files of the media directory
//! - `process.rs` - spawning, signalling and stdin of the player process
//! - `outcome.rs` - result records handed to the transport adapters
//! - `session.rs` - the session actor enforcing the playback rules

pub mod catalog;
pub mod commands;
pub mod outcome;
pub mod process;
pub mod session;

pub use outcome::{Outcome, OutcomeKind};
pub use process::{ExitCallback, Launch, PlayerProcess, ProcessError, ProcessHost, SystemHost};
pub use session::{Session, SessionConfig, SessionError, SessionEvent, API_VERSION};
