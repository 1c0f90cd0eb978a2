//! External collaborators the core depends on as traits, never as a
//! concrete implementation, so tests can inject mocks. Each trait also
//! gets one filesystem-backed implementation here so the crate is usable
//! end-to-end as a CLI.

mod clock;
mod fs_refs;
mod fs_walk;

pub use clock::{Clock, FsClock};
pub use fs_refs::{FsRefStore, RefStore, RefValue};
pub use fs_walk::{FileStat, FsWorkingTree, IgnoreEngine, WorkingTreeEnumerator};
