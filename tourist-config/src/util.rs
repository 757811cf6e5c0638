use std::str::FromStr;

use crate::loader::error::ConfigLoadError;

/// Trimmed value of `name`, or `None` when unset or blank.
pub fn string_var<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    string_var(lookup, name)
        .map(|raw| {
            raw.parse::<T>().map_err(|err| ConfigLoadError::InvalidEnv {
                name: name.to_string(),
                value: raw.clone(),
                reason: err.to_string(),
            })
        })
        .transpose()
}
