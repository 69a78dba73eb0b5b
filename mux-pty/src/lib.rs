//! PTY process hosting: spawn, write, resize, kill.
//!
//! This is the source of "bytes from child" in the data flow the rest of
//! the workspace consumes (spec §2) — it owns no VT semantics of its own,
//! only the OS-level pseudo-terminal and child process.

mod env;
mod error;
mod session;

pub use env::coprocess_env;
pub use error::PtyError;
pub use session::{PtyHandle, SpawnConfig};
