// src/store/mod.rs

//! Durable, crash-consistent access to the shared JSON documents.
//!
//! - [`lock`] provides a cross-process advisory lock scoped to one document
//!   (`<document>.lock` beside it), with a bounded acquisition wait.
//! - [`json`] implements the three access paths used by the schedulers:
//!   unlocked reads, locked read-modify-write, and unconditional writes.
//!
//! Every write goes through a temporary file in the document's directory
//! followed by an atomic rename, so readers only ever observe the old or the
//! new document, never a partial one.

pub mod json;
pub mod lock;

pub use json::{JsonStore, DEFAULT_LOCK_TIMEOUT};
pub use lock::{lock_path_for, FileLock};
