use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Read of `size` bytes at `offset` does not fit into a region of `len` bytes.
    pub fn out_of_range(offset: usize, size: usize, len: usize) -> Error {
        Error(ErrorKind::OutOfRange { offset, size, len }.into())
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Error {
        Error(ErrorKind::IndexOutOfRange { index, len }.into())
    }

    pub fn invalid_state(operation: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidState {
                operation: operation.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn schema_version_mismatch(
        element: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::SchemaVersionMismatch {
                element: element.into(),
                expected: expected.into(),
                found: found.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` for the failures a reader can hit on a truncated or
    /// corrupted buffer, as opposed to API misuse.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::OutOfRange { .. }
                | ErrorKind::InvalidFormat { .. }
                | ErrorKind::ChecksumMismatch { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("read of {size} bytes at offset {offset} exceeds the buffer length {len}")]
    OutOfRange {
        offset: usize,
        size: usize,
        len: usize,
    },

    #[error("index {index} is out of range for a vector of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid state for {operation}: {message}")]
    InvalidState { operation: String, message: String },

    #[error("schema version mismatch for '{element}': expected {expected}, found {found}")]
    SchemaVersionMismatch {
        element: String,
        expected: String,
        found: String,
    },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid buffer format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("checksum mismatch for '{element}'")]
    ChecksumMismatch { element: String },

    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::invalid_format("string", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        let err = Error::index_out_of_range(3, 3);
        assert!(matches!(
            err.kind(),
            ErrorKind::IndexOutOfRange { index: 3, len: 3 }
        ));
        assert!(!err.is_data_error());
        assert_eq!(
            err.to_string(),
            "index 3 is out of range for a vector of length 3"
        );
    }

    #[test]
    fn test_data_errors() {
        assert!(Error::out_of_range(10, 4, 12).is_data_error());
        assert!(Error::invalid_format("vtable", "odd size").is_data_error());
        assert!(!Error::invalid_state("finish", "no root").is_data_error());
    }

    #[test]
    fn test_utf8_conversion() {
        let bytes = [0xffu8, 0xfe];
        let err: Error = std::str::from_utf8(&bytes).unwrap_err().into();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
