//! OCPP protocol version negotiation
//!
//! During the WebSocket handshake the station advertises the OCPP
//! sub-protocols it speaks in `Sec-WebSocket-Protocol`. The negotiator picks
//! the newest one both sides support.

use crate::domain::OcppVersion;

pub struct ProtocolNegotiator {
    /// Supported versions, newest first.
    supported_versions: Vec<OcppVersion>,
}

impl ProtocolNegotiator {
    pub fn new(supported_versions: Vec<OcppVersion>) -> Self {
        Self { supported_versions }
    }

    /// Negotiate from the raw `Sec-WebSocket-Protocol` header value.
    pub fn negotiate(&self, requested_protocols: &str) -> Option<OcppVersion> {
        let requested: Vec<OcppVersion> = requested_protocols
            .split(',')
            .filter_map(OcppVersion::from_subprotocol)
            .collect();

        self.supported_versions
            .iter()
            .copied()
            .find(|v| requested.contains(v))
    }

    pub fn supported_subprotocols(&self) -> Vec<&'static str> {
        self.supported_versions
            .iter()
            .map(|v| v.subprotocol())
            .collect()
    }
}

impl Default for ProtocolNegotiator {
    fn default() -> Self {
        Self::new(OcppVersion::ALL.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_single_match() {
        let negotiator = ProtocolNegotiator::new(vec![OcppVersion::V16]);
        assert_eq!(negotiator.negotiate("ocpp1.6"), Some(OcppVersion::V16));
    }

    #[test]
    fn negotiate_multiple_prefers_newest() {
        let negotiator = ProtocolNegotiator::default();
        assert_eq!(
            negotiator.negotiate("ocpp1.6, ocpp2.0.1"),
            Some(OcppVersion::V201)
        );
    }

    #[test]
    fn negotiate_no_match() {
        let negotiator = ProtocolNegotiator::new(vec![OcppVersion::V16]);
        assert_eq!(negotiator.negotiate("ocpp2.0.1"), None);
        assert_eq!(negotiator.negotiate(""), None);
        assert_eq!(ProtocolNegotiator::default().negotiate("ocpp2.1"), None);
    }
}
