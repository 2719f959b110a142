//! Path handling: pattern expansion, classification, I/O and the two
//! user-facing abstractions built on them.
//!
//! ## Architecture
//!
//! ### resolver.rs
//! Pure path arithmetic, no I/O:
//! - Expands a leading `~` to the home directory
//! - Computes move/copy destinations (a trailing separator means "into this directory")
//! - Splits file names into base name and extension chain
//!
//! ### glob.rs
//! Turns a pattern into an ordered list of paths. Relative patterns are
//! anchored on the configured working directory.
//!
//! ### classify.rs
//! One `lstat` per path. Missing paths are reported as absent rather than as
//! errors, symbolic links are never followed.
//!
//! ### access.rs
//! All reads, writes, copies, moves and deletions go through this layer;
//! nothing else uses `tokio::fs` directly. Text is decoded and encoded with
//! the configured [`Encoding`](crate::config::Encoding).
//!
//! ### entry_set.rs
//! The batch abstraction: a pattern, the members it resolved to, and
//! operations applied to every member in order.
//!
//! ### entity.rs / finder.rs
//! Single-path handles with cached stats and an in-memory text buffer, and
//! the discovery helpers that produce them from a pattern.
//!
//! ### digest.rs
//! Content-free fingerprints of path lists for change detection.

pub mod access;
pub mod classify;
pub mod digest;
pub mod entity;
pub mod entry_set;
pub mod finder;
pub mod glob;
pub mod resolver;
