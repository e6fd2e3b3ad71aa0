//! External reminder/note store

pub mod adapter;
pub mod applescript;
pub mod memory;

pub use adapter::{Note, Reminder, SourceAdapter};
pub use applescript::AppleScriptAdapter;
pub use memory::MemorySourceAdapter;
