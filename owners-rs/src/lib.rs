pub mod glob;
pub mod parser;

mod database;
mod error;
mod owner;
mod repo;
mod reviewer_set;
mod selector;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

pub use database::{Database, DatabaseBuilder, DEFAULT_OWNERS_FILE_NAME};
pub use error::{Error, Result};
pub use owner::{is_valid_email, Owner};
pub use repo::{FsRepo, MemoryRepo, RepoAccess};
pub use reviewer_set::{Reviewer, ReviewerSet};
pub use selector::{lowest_cost_owner, CandidateMap, SelectionStrategy};

/// Open the tree rooted at `root` on the local filesystem.
pub fn from_path(root: impl Into<PathBuf>) -> Database<FsRepo> {
    Database::new(root, FsRepo)
}
