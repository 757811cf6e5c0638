use thiserror::Error;

use super::models::Config;

pub const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("{field} must be between 1 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
    #[error("{field} must be a positive finite number of degrees, got {value}")]
    InvalidDegrees { field: &'static str, value: f64 },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Reject values the engine cannot run with and warn about ones it can run
/// with poorly.
pub fn validate(config: &Config) -> Result<ConfigWarnings, ConfigValidationError> {
    let mut warnings = ConfigWarnings::default();

    if config.album.slots_per_album == 0 {
        return Err(ConfigValidationError::Zero {
            field: "slots_per_album",
        });
    }
    if config.album.download_concurrency == 0 {
        return Err(ConfigValidationError::Zero {
            field: "download_concurrency",
        });
    }
    if config.search.per_page == 0 || config.search.per_page > MAX_PER_PAGE {
        return Err(ConfigValidationError::OutOfRange {
            field: "per_page",
            value: u64::from(config.search.per_page),
            max: u64::from(MAX_PER_PAGE),
        });
    }
    for (field, value) in [
        ("bbox_half_width", config.search.bbox_half_width),
        ("bbox_half_height", config.search.bbox_half_height),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigValidationError::InvalidDegrees { field, value });
        }
    }
    if config.search.http_timeout.is_zero() {
        return Err(ConfigValidationError::Zero {
            field: "http_timeout_secs",
        });
    }

    if config.search.api_key.is_none() {
        warnings.push_with_hint(
            "FLICKR_API_KEY not configured; photo searches will be rejected",
            "Set FLICKR_API_KEY or add api_key to the [search] section",
        );
    }

    if config.search.per_page < config.album.slots_per_album {
        warnings.push(format!(
            "per_page ({}) is smaller than slots_per_album ({}); albums will repeat photos",
            config.search.per_page, config.album.slots_per_album
        ));
    }

    Ok(warnings)
}
