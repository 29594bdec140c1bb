//! Typed error enum for the core crate.

use thiserror::Error;

/// Errors originating from core domain type parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Failed to parse an `SmsStatus` string.
    #[error("invalid sms status: {0}")]
    InvalidSmsStatus(String),
    /// Failed to parse a DLR outcome string.
    #[error("invalid dlr: {0}")]
    InvalidDlr(String),
    /// Failed to parse a provider status code.
    #[error("invalid provider status code: {0}")]
    InvalidProviderStatus(i32),
    /// Phone number failed E.164-ish normalization.
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}
