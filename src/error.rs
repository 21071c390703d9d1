//! Request-level error types.
//!
//! Validation failures are client-visible: a bad mutation request is
//! rejected with one of these and the in-memory configuration is left
//! untouched. Storage and broker failures have their own enums next to
//! the port traits in [`crate::app::ports`].

use core::fmt;

/// A mutation or query request failed validation. State is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A required request parameter was absent.
    MissingParam(&'static str),
    /// A parameter was present but not parseable as the expected type.
    BadNumber(&'static str),
    /// A pin identifier is outside the platform's GPIO range.
    PinOutOfRange(u8),
    /// A delete-by-index request addressed past the end of the button list.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParam(name) => write!(f, "missing parameter '{name}'"),
            Self::BadNumber(name) => write!(f, "parameter '{name}' is not a valid number"),
            Self::PinOutOfRange(pin) => {
                write!(
                    f,
                    "pin {pin} is outside the platform range 0-{}",
                    crate::pins::GPIO_MAX
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range (have {len} buttons)")
            }
        }
    }
}
