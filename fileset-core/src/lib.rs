pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod report;

pub use codec::Codec;
pub use config::{Encoding, Options};
pub use error::{FileSetError, Result};
pub use file::classify::{Classification, EntryStats, TypeFilter};
pub use file::digest::file_list_hash;
pub use file::entity::{
    Content, DirectoryEntity, Entity, FileEntity, LoadOutcome, MoveOutcome, PathNode, Processed,
};
pub use file::entry_set::{EntrySet, EntrySetBuilder, Selection};
pub use file::finder::find;
pub use report::{Reporter, SilentReporter, TracingReporter};
