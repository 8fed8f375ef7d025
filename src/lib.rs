//! thumbor-storage - Route application file storage between Thumbor and the local filesystem
//!
//! This crate provides:
//! - Classification of stored object names into Thumbor-owned and local ones
//! - Signed public Thumbor URLs computed without contacting the service
//! - Lazily fetched, write-once file handles on Thumbor originals
//! - A migration storage that keeps serving legacy local files while new
//!   uploads go to Thumbor

pub mod config;
pub mod name;
pub mod object_store;
pub mod signing;

pub use config::Config;
pub use object_store::{
    FileSystemStorage, MigrationStorage, ObjectStoreError, OpenMode, Storage, StoredFile,
    ThumborStorage,
};
