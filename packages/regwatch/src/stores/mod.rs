//! Storage implementations for the monitoring core.
//!
//! Available backends:
//! - `MemoryStore` - In-memory storage (always available)
//! - `FilesystemStore` - One directory per URL under a base path (always available)
//! - `SqliteStore` - SQLite file-based storage (requires `sqlite` feature)
//!
//! All three enforce the same retention bound and per-URL write atomicity.

pub mod filesystem;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
