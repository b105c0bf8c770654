//! Core contracts for Stash: the in-memory store, configuration, codec and error taxonomy.
//! Nothing in this crate touches the filesystem beyond resolving paths.

pub mod codec;
pub mod config;
pub mod error;
pub mod store;

pub use codec::{Codec, CodecError, JsonCodec};
pub use config::{SerializerSettings, StorageConfig, DEFAULT_ENCRYPTION_SALT, DEFAULT_FILENAME};
pub use error::{ReadOnlyOperation, Result, StorageError};
pub use store::Store;
