//! Validated path wrappers.
//!
//! Each type checks its invariant on construction; holding one means the
//! precondition already passed.

mod access;
pub mod dest_dir;
pub mod source_path;

pub use dest_dir::DestDir;
pub use source_path::SourcePath;
