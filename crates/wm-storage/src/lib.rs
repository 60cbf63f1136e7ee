//! Wiki file lookup for wikimark.
//!
//! This crate provides a [`Storage`] trait that abstracts where wiki files
//! live. Inclusion-style filters reach it through the renderer's file
//! resolver, so they never touch the filesystem directly. This enables:
//!
//! - **Unit testing** without touching the real filesystem
//! - **Backend flexibility** (working tree, git history, database)
//! - **Point-in-time reads**: every lookup carries an optional version
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `file()` and `exists()` methods
//! - [`FsStorage`] implementation for a wiki directory on disk
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use wm_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("wiki"));
//! let file = storage.file("docs/setup.md", None)?;
//! println!("{}", file.content);
//! ```

mod fs;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockStorage;
pub use storage::{Storage, StorageError, StorageErrorKind, WikiFile};
