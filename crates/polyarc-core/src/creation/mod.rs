//! Source walking for archive creation.
//!
//! Turns the files and directories handed to
//! [`Archiver::create`](crate::Archiver::create) into an ordered list of
//! entry descriptors, applying the filters of
//! [`ArchiverConfig`](crate::ArchiverConfig).

pub mod filters;
pub mod walker;

pub use walker::FilteredWalker;
pub use walker::collect_entries;
