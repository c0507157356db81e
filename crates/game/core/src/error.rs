//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (e.g. [`OrderError`](crate::engine::OrderError),
//! [`TargetingError`](crate::ability::TargetingError)) live next to the code
//! that raises them and implement [`GameError`] for uniform classification.

/// How a caller should react to a rejected order, click or restore.
///
/// `Recoverable` rejections (another unit's turn, a card still in exile) may
/// succeed on a later pause. `Validation` means the input itself is wrong.
/// `Internal` and `Fatal` point at a broken engine or snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Implemented by every error enum in the battle crates.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable name logged alongside the message.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
