use thiserror::Error;

/// Failure taxonomy for the HTTP transport.
///
/// `Network` covers every case where no response was received (connect
/// failure, reset, timeout). `Server` is any 5xx, `Client` any 4xx. Only the
/// first two classes are retried.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("client error {status}: {message}")]
    Client { status: u16, message: String },
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Network { .. } | TransportError::Server { .. })
    }

    /// HTTP status carried by the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Network { .. } => None,
            TransportError::Server { status, .. } | TransportError::Client { status, .. } => {
                Some(*status)
            }
        }
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    (500..600).contains(&status)
}

pub fn classify_status(status: u16, message: String) -> TransportError {
    if is_retryable_status(status) {
        TransportError::Server { status, message }
    } else {
        TransportError::Client { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_and_server_retryable() {
        let net = TransportError::Network { message: "connection reset".into() };
        assert!(net.is_retryable());
        assert_eq!(net.status(), None);

        let srv = classify_status(503, "unavailable".into());
        assert!(srv.is_retryable());
        assert_eq!(srv.status(), Some(503));
    }

    #[test]
    fn test_client_errors_terminal() {
        for status in [400, 404, 422, 499] {
            let err = classify_status(status, "bad request".into());
            assert!(!err.is_retryable(), "{} must be terminal", status);
        }
    }

    #[test]
    fn test_5xx_boundary() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(599));
        assert!(!is_retryable_status(600));
        assert!(!is_retryable_status(499));
    }
}
