//! Command-line reader for a remote book server
//!
//! Thin front end over `readmate-preload`: lists the bookshelf and chapters,
//! and reads chapters through the preloading cache.

pub mod commands;
pub mod settings;

pub use commands::{ReadOutcome, ReadRequest};
pub use settings::{PreloadOverrides, DEFAULT_SERVER_URL};
