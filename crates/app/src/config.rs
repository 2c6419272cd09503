//! Process configuration from `STOREFRONT_*` environment variables.

use thiserror::Error;

use storefront_cart::Locale;
use storefront_core::Currency;
use storefront_observability::LogFormat;

pub const CURRENCY_VAR: &str = "STOREFRONT_CURRENCY";
pub const LOCALE_VAR: &str = "STOREFRONT_LOCALE";
pub const LOG_FORMAT_VAR: &str = "STOREFRONT_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub currency: Currency,
    pub locale: Locale,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Eur,
            locale: Locale::FiFi,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            currency: parse_var(&lookup, CURRENCY_VAR)?.unwrap_or(defaults.currency),
            locale: parse_var(&lookup, LOCALE_VAR)?.unwrap_or(defaults.locale),
            log_format: parse_var(&lookup, LOG_FORMAT_VAR)?.unwrap_or(defaults.log_format),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
