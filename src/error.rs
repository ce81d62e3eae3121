//! Errors raised by the model.
//!
//! Numeric edge cases (for instance `tmax == tmin`) are not
//! errors: they propagate as NaN / infinite pixels through
//! the rasters.

use thiserror::Error;

/// Fatal errors of a model run. A run that fails produces no
/// partial output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A required scalar is missing, malformed, or outside the
    /// domain of the formula consuming it.
    #[error("invalid parameter `{name}`: {reason}")]
    Parameter { name: &'static str, reason: String },

    /// A reduction was attempted over a raster without a single
    /// valid pixel.
    #[error("raster `{name}` contains no valid pixels")]
    EmptyField { name: &'static str },

    /// A parameter name that the model does not know about.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}

impl Error {
    pub(crate) fn parameter<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Error::Parameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
