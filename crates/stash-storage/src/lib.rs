//! File-backed local storage with optional encryption at rest.
//! Values are encrypted with AES-256-CBC under a key derived from a password via PBKDF2.

pub mod cipher;
pub mod local_storage;

pub use local_storage::LocalStorage;
