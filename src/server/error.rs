use crate::settings::SettingsError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    ConfigError(SettingsError),
    IoError(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::ConfigError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(e) => write!(f, "Config Error: {}", e),
            Error::IoError(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigError(e) => Some(e),
            Error::IoError(e) => Some(e),
        }
    }
}
