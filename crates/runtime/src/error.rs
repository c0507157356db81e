//! Error types surfaced by the transport and the session driver.

use battle_core::{EntityId, ErrorSeverity, GameError, OrderError, PlayerId, RestoreError};
use thiserror::Error;

/// Failures talking to the shared order/snapshot store.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError for TransportError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable(_) => ErrorSeverity::Recoverable,
            Self::LockPoisoned => ErrorSeverity::Fatal,
            Self::Serialization(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "TRANSPORT_UNAVAILABLE",
            Self::LockPoisoned => "TRANSPORT_LOCK_POISONED",
            Self::Serialization(_) => "TRANSPORT_SERIALIZATION",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Restore(#[from] RestoreError),

    #[error("battle setup failed: {0}")]
    Setup(String),

    #[error("session has been stopped")]
    Stopped,

    #[error("player {player} cannot act: the battle waits on {waiting:?}")]
    NotLocalTurn {
        player: PlayerId,
        waiting: Option<EntityId>,
    },

    #[error("local state diverged and has not been reloaded yet")]
    ReconcileRequired,
}

impl GameError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport(error) => error.severity(),
            Self::Order(error) => error.severity(),
            Self::Restore(_) | Self::Setup(_) => ErrorSeverity::Internal,
            Self::Stopped => ErrorSeverity::Fatal,
            Self::NotLocalTurn { .. } | Self::ReconcileRequired => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(error) => error.error_code(),
            Self::Order(error) => error.error_code(),
            Self::Restore(_) => "SESSION_RESTORE",
            Self::Setup(_) => "SESSION_SETUP",
            Self::Stopped => "SESSION_STOPPED",
            Self::NotLocalTurn { .. } => "SESSION_NOT_LOCAL_TURN",
            Self::ReconcileRequired => "SESSION_RECONCILE_REQUIRED",
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
