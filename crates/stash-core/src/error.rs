use thiserror::Error;

/// Operations refused while a storage instance is in read-only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOnlyOperation {
    Store,
    Persist,
}

impl ReadOnlyOperation {
    /// Stable message reported when the operation is refused.
    pub const fn message(self) -> &'static str {
        match self {
            ReadOnlyOperation::Store => {
                "Cannot execute Store because ReadOnly mode is explicitly enabled."
            }
            ReadOnlyOperation::Persist => {
                "Cannot execute Persist because ReadOnly mode is explicitly enabled."
            }
        }
    }
}

/// Errors produced by the local storage engine and its collaborators.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Configuration is missing or inconsistent; no instance is produced.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
    /// Caller supplied an empty key or an absent value.
    #[error("invalid argument: {reason}")]
    Validation { reason: String },
    /// A write was attempted while read-only mode is enabled.
    #[error("{}", .operation.message())]
    ReadOnly { operation: ReadOnlyOperation },
    /// Requested key does not exist.
    #[error("could not find key '{key}' in the local storage")]
    NotFound { key: String },
    /// Stored text could not be decoded into the requested type.
    /// `target` names what was being decoded (a key or the backing file).
    #[error("failed to deserialize {target}: {reason}")]
    Deserialization { target: String, reason: String },
    /// A value or the whole store could not be encoded.
    #[error("failed to serialize: {reason}")]
    Serialization { reason: String },
    /// Malformed ciphertext or a cipher failure.
    #[error("cryptography failure: {reason}")]
    Crypto { reason: String },
    /// Underlying filesystem failure, passed through untranslated.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_errors_display_fixed_messages() {
        let store = StorageError::ReadOnly {
            operation: ReadOnlyOperation::Store,
        };
        let persist = StorageError::ReadOnly {
            operation: ReadOnlyOperation::Persist,
        };

        assert_eq!(
            store.to_string(),
            "Cannot execute Store because ReadOnly mode is explicitly enabled."
        );
        assert_eq!(
            persist.to_string(),
            "Cannot execute Persist because ReadOnly mode is explicitly enabled."
        );
    }

    #[test]
    fn io_errors_pass_through() {
        let err: StorageError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(err.to_string(), "denied");
    }
}
