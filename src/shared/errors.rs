use thiserror::Error;

/// Opaque persistence failure reported by a store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Store operation timed out")]
    Timeout,
}

/// Failure to hand a Call to a charge station's outbound channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("Charge station {0} is not connected")]
    NotConnected(String),

    #[error("Outbound channel for {0} is closed")]
    ChannelClosed(String),

    #[error("Failed to serialize call: {0}")]
    Serialization(String),
}

/// Failure to deliver a command result to a roaming platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Could not connect to {0}")]
    Connect(String),

    #[error("Callback rejected with HTTP {0}")]
    Status(u16),

    #[error("Callback request failed: {0}")]
    Request(String),
}

impl CallbackError {
    /// Only connection failures are retried: the platform never saw the
    /// request, so sending it again cannot deliver it twice.
    pub fn is_transient(&self) -> bool {
        matches!(self, CallbackError::Connect(_))
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Malformed EVSE id: {0}")]
    MalformedEvseId(String),

    #[error("Unknown charge station: {0}")]
    UnknownChargeStation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Dispatch failure: {0}")]
    DispatchFailure(String),

    #[error("Invalid call: {0}")]
    InvalidCall(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EmitError> for BridgeError {
    fn from(e: EmitError) -> Self {
        BridgeError::DispatchFailure(e.to_string())
    }
}

impl BridgeError {
    /// Whether this error is a negative command outcome rather than a
    /// malformed request or an internal failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownChargeStation(_)
                | BridgeError::DispatchFailure(_)
                | BridgeError::InvalidCall(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_error_becomes_dispatch_failure() {
        let err: BridgeError = EmitError::NotConnected("CS01".into()).into();
        assert!(matches!(err, BridgeError::DispatchFailure(ref m) if m.contains("CS01")));
        assert!(err.is_rejection());
    }

    #[test]
    fn only_connect_failures_are_transient() {
        assert!(CallbackError::Connect("http://x".into()).is_transient());
        assert!(!CallbackError::Status(500).is_transient());
        assert!(!CallbackError::Request("timeout".into()).is_transient());
    }

    #[test]
    fn store_errors_are_not_rejections() {
        let err: BridgeError = StoreError::Timeout.into();
        assert!(!err.is_rejection());
        assert!(!BridgeError::MalformedEvseId("x".into()).is_rejection());
    }
}
