use thiserror::Error;

use crate::wire::MessageKind;
use crate::Float;

#[derive(Debug, Error, PartialEq)]
pub enum VortexError {
    #[error("vortex intensity must be non-zero")]
    ZeroIntensity,
    #[error("vortex center and intensity must be finite")]
    NotFinite,
}

/// Payload that does not match the layout both peers agreed on.
#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("{kind:?} payload holds {found} values, expected {expected}")]
    LengthMismatch {
        kind: MessageKind,
        expected: usize,
        found: usize,
    },
    #[error("unknown control event byte {0}")]
    UnknownEvent(u8),
    #[error("invalid vortex record {index} with intensity {intensity}")]
    InvalidVortex { index: usize, intensity: Float },
}

#[derive(Debug, Error, PartialEq)]
pub enum CommError {
    #[error("peer {0} disconnected")]
    Disconnected(usize),
    #[error("expected a {expected:?} message, received {found:?}")]
    UnexpectedMessage {
        expected: MessageKind,
        found: MessageKind,
    },
    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("the program must be launched on two peers, got {0}")]
    PeerCount(usize),
    #[error("vortex {index}: {source}")]
    Vortex { index: usize, source: VortexError },
}
