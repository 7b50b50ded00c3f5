use std::fmt;

use umbra_scene::DocId;

/// Why a plan or a door sequence stopped. `reason()` is the stable string
/// callers switch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    NoPath,
    Cancelled,
    MaxIterations,
    DoorRevisionMismatch { planned: u64, current: u64 },
    PermissionDenied { wall: DocId },
    Locked { wall: DocId },
    PlayerAutoDoorDisabled { wall: DocId },
    DoorOpenTimeout { wall: DocId },
    MissingDocument(DocId),
    /// A plain move would cross a blocking wall.
    Blocked { token: DocId },
    Host(String),
}

impl MoveError {
    pub fn reason(&self) -> &'static str {
        match self {
            MoveError::NoPath => "no-path",
            MoveError::Cancelled => "cancelled",
            MoveError::MaxIterations => "max-iterations",
            MoveError::DoorRevisionMismatch { .. } => "door-revision-mismatch",
            MoveError::PermissionDenied { .. } => "permission-denied",
            MoveError::Locked { .. } => "locked",
            MoveError::PlayerAutoDoorDisabled { .. } => "player-auto-door-disabled",
            MoveError::DoorOpenTimeout { .. } => "door-open-timeout",
            MoveError::MissingDocument(_) => "missing-document",
            MoveError::Blocked { .. } => "collision",
            MoveError::Host(_) => "host-error",
        }
    }

    /// Errors after which the caller should plan again.
    pub fn wants_replan(&self) -> bool {
        matches!(
            self,
            MoveError::DoorRevisionMismatch { .. } | MoveError::Cancelled
        )
    }
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NoPath => write!(f, "no admissible path"),
            MoveError::Cancelled => write!(f, "search cancelled"),
            MoveError::MaxIterations => write!(f, "search iteration cap reached"),
            MoveError::DoorRevisionMismatch { planned, current } => write!(
                f,
                "door state changed since planning (revision {planned} -> {current})"
            ),
            MoveError::PermissionDenied { wall } => write!(f, "not allowed to operate door {wall}"),
            MoveError::Locked { wall } => write!(f, "door {wall} is locked"),
            MoveError::PlayerAutoDoorDisabled { wall } => {
                write!(f, "automatic doors disabled for players (door {wall})")
            }
            MoveError::DoorOpenTimeout { wall } => write!(f, "door {wall} did not open in time"),
            MoveError::MissingDocument(id) => write!(f, "no document for {id}"),
            MoveError::Blocked { token } => write!(f, "move of {token} blocked by a wall"),
            MoveError::Host(msg) => write!(f, "host rejected update: {msg}"),
        }
    }
}

impl std::error::Error for MoveError {}
