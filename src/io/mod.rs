//! I/O operations module
//!
//! Scoped temporary files with platform page-cache hints for the storage
//! suite, and fallible buffer allocation shared by every workload.

pub mod buffer;
pub mod disk;

pub use disk::{evict_cache, open_uncached, TempFile};
