use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InvalidCoordinate { latitude: f64, longitude: f64 },
    InvalidViewport(String),
    InvalidImageUrl(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "invalid coordinate: latitude={latitude}, longitude={longitude}"
            ),
            ModelError::InvalidViewport(msg) => {
                write!(f, "invalid viewport: {msg}")
            }
            ModelError::InvalidImageUrl(msg) => {
                write!(f, "invalid image url: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
