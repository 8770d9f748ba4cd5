//! Persistence for the trusted hash list: a flat file of 16-byte records,
//! oldest first, no header, fully materialized in memory.

// submodules / concrete stores live here
pub mod file_store;
pub use file_store::HashCache;
