//! Engine-level error type.
//!
//! [`StarError`] folds every failure the bookkeeping can report into one
//! enum. [`is_fatal`](StarError::is_fatal) separates broken invariants,
//! which must end the run, from collaborator failures, which abort only
//! the enclosing sub-phase.

use std::error::Error;
use std::fmt;

use starlist_arena::ArenaError;
use starlist_codec::CodecError;
use starlist_core::{InvariantViolation, PhotonRateError, UnitsError};

use crate::config::ConfigError;
use crate::exchange::ExchangeError;

/// Errors from star bookkeeping operations.
#[derive(Debug)]
pub enum StarError {
    /// A bookkeeping invariant is broken. Fatal.
    Invariant(InvariantViolation),
    /// A list handle did not resolve. Fatal: the population is desynchronized.
    Arena(ArenaError),
    /// The unit system failed.
    Units(UnitsError),
    /// The radiation tables failed.
    PhotonRate(PhotonRateError),
    /// A transfer buffer could not be encoded or decoded.
    Codec(CodecError),
    /// The cross-process exchange failed.
    Exchange(ExchangeError),
    /// The configuration is invalid.
    Config(ConfigError),
}

impl StarError {
    /// Whether the run must terminate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::Arena(_))
    }
}

impl fmt::Display for StarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invariant(e) => write!(f, "invariant violation: {e}"),
            Self::Arena(e) => write!(f, "star list: {e}"),
            Self::Units(e) => write!(f, "units: {e}"),
            Self::PhotonRate(e) => write!(f, "radiation: {e}"),
            Self::Codec(e) => write!(f, "transfer buffer: {e}"),
            Self::Exchange(e) => write!(f, "exchange: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl Error for StarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invariant(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::Units(e) => Some(e),
            Self::PhotonRate(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Exchange(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<InvariantViolation> for StarError {
    fn from(e: InvariantViolation) -> Self {
        Self::Invariant(e)
    }
}

impl From<ArenaError> for StarError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<UnitsError> for StarError {
    fn from(e: UnitsError) -> Self {
        Self::Units(e)
    }
}

impl From<PhotonRateError> for StarError {
    fn from(e: PhotonRateError) -> Self {
        Self::PhotonRate(e)
    }
}

impl From<CodecError> for StarError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ExchangeError> for StarError {
    fn from(e: ExchangeError) -> Self {
        Self::Exchange(e)
    }
}

impl From<ConfigError> for StarError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlist_core::{GridId, StarId};

    #[test]
    fn invariant_is_fatal() {
        let e: StarError = InvariantViolation::MirrorCopyMissing {
            star: StarId(1),
            grid: GridId(2),
        }
        .into();
        assert!(e.is_fatal());
        assert!(e.source().is_some());
    }

    #[test]
    fn collaborator_failure_is_not_fatal() {
        let e: StarError = UnitsError {
            time: 0.0,
            reason: "bad".into(),
        }
        .into();
        assert!(!e.is_fatal());
        assert_eq!(e.to_string(), "units: units unavailable at t=0: bad");
    }
}
