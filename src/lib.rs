//! obsfs - A filesystem adapter for Huawei Cloud OBS
//!
//! obsfs maps filesystem operations onto an object store:
//! - Paths are normalized and placed under an optional root prefix
//! - Directories are key prefixes, optionally backed by `path/` markers
//! - Visibility is expressed through object ACLs
//! - Public and signed links, optionally served from a CDN base

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod links;
pub mod listing;
pub mod path;
pub mod types;
pub mod visibility;

pub use adapter::ObsAdapter;
pub use config::{AdapterConfig, AdapterOptions, AppConfig, SignatureScheme};
pub use error::{Error, Result};
pub use filesystem::FilesystemAdapter;
pub use types::{FileAttributes, SignMethod, StorageEntry, WriteConfig};
pub use visibility::Visibility;
