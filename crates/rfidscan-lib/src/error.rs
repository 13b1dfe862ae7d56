//! Unified error type for the rfidscan-lib crate.
//!
//! [`RfidscanError`] wraps [`DeviceError`] and the I/O and parsing failures
//! of the configuration side. `From` impls let `?` cross module boundaries.

use std::fmt;

use crate::transport::DeviceError;

#[derive(Debug)]
pub enum RfidscanError {
    /// Device communication error (open, exchange, reader status).
    Device(DeviceError),
    /// Standard I/O error (config persistence, multiconf files).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Malformed user input: register address, value, LED mode, layout.
    Parse(String),
    /// The reader refused access (locked, password missing or wrong).
    Access(String),
}

impl fmt::Display for RfidscanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RfidscanError::Device(e) => write!(f, "{e}"),
            RfidscanError::Io(e) => write!(f, "I/O error: {e}"),
            RfidscanError::Config(e) => write!(f, "Config error: {e}"),
            RfidscanError::Parse(e) => write!(f, "Parse error: {e}"),
            RfidscanError::Access(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RfidscanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RfidscanError::Device(e) => Some(e),
            RfidscanError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for RfidscanError {
    fn from(e: DeviceError) -> Self {
        RfidscanError::Device(e)
    }
}

impl From<std::io::Error> for RfidscanError {
    fn from(e: std::io::Error) -> Self {
        RfidscanError::Io(e)
    }
}

/// Crate-level Result alias using [`RfidscanError`].
pub type Result<T> = std::result::Result<T, RfidscanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_device_error() {
        let e: RfidscanError = DeviceError::NotFound.into();
        assert!(matches!(e, RfidscanError::Device(DeviceError::NotFound)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: RfidscanError = io_err.into();
        assert!(matches!(e, RfidscanError::Io(_)));
    }

    #[test]
    fn display_device_error_is_transparent() {
        let e = RfidscanError::Device(DeviceError::NotFound);
        assert_eq!(e.to_string(), "RFID scanner not found");
    }

    #[test]
    fn display_string_variants() {
        assert_eq!(
            RfidscanError::Config("bad".into()).to_string(),
            "Config error: bad"
        );
        assert_eq!(
            RfidscanError::Parse("Invalid register addr".into()).to_string(),
            "Parse error: Invalid register addr"
        );
        assert_eq!(
            RfidscanError::Access("Wrong password".into()).to_string(),
            "Wrong password"
        );
    }

    #[test]
    fn source_chains_device_error() {
        let e = RfidscanError::Device(DeviceError::Transport("timeout".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = RfidscanError::Parse("x".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_device_to_rfidscan() {
        fn inner() -> crate::transport::Result<()> {
            Err(DeviceError::Device { code: 1 })
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(
            err,
            RfidscanError::Device(DeviceError::Device { code: 1 })
        ));
    }
}
