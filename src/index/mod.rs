mod codec;
mod entry;

pub use codec::Index;
pub use entry::{IndexEntry, Timespec, WorkingStat, index_entry_cmp, is_entry_modified};
