use thiserror::Error;

/// Errors raised by curve construction and curve operations.
///
/// Fallible functions return `anyhow::Result`, so the kind of a failure can be
/// recovered with `error.downcast_ref::<NurbsError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NurbsError {
    /// Invalid input at construction time (degree, knots, weights, radius, ...)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Parameter or argument outside of the admissible range
    #[error("domain error: {0}")]
    Domain(String),

    /// An iterative procedure did not converge or a numerical step is undefined
    #[error("numerical error: {0}")]
    Numerical(String),
}

impl NurbsError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical(message.into())
    }

    /// Extract the typed error from an `anyhow::Error` raised by this crate
    pub fn of(error: &anyhow::Error) -> Option<&NurbsError> {
        error.downcast_ref::<NurbsError>()
    }
}

/// Bail out with a [`NurbsError`] unless the condition holds
macro_rules! ensure_nurbs {
    ($cond:expr, $kind:ident, $($arg:tt)+) => {
        if !($cond) {
            return Err($crate::error::NurbsError::$kind(format!($($arg)+)).into());
        }
    };
}

pub(crate) use ensure_nurbs;
