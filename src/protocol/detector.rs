//! Protocol detector implementation
//!
//! Classification works on the bytes accumulated so far and never touches the
//! connection itself: the caller reads, asks for a verdict, and keeps reading
//! while the answer is `NeedMoreData`.

use log::{debug, trace};

/// Content type of a TLS handshake record
pub const TLS_HANDSHAKE: u8 = 0x16;

/// Length of a TLS record header (type, version, length)
pub const TLS_RECORD_HEADER_LEN: usize = 5;

/// Handshake message type of a ClientHello
pub const CLIENT_HELLO: u8 = 0x01;

/// Bytes needed to see the handshake type: record header plus one
pub const CLIENT_HELLO_PREFIX_LEN: usize = TLS_RECORD_HEADER_LEN + 1;

/// Smallest record that can carry a ClientHello (handshake header, version, random)
const MIN_CLIENT_HELLO_RECORD_LEN: usize = 34;

/// Protocol detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult {
    /// The bytes start a TLS handshake record
    Secure,
    /// The bytes cannot be a TLS handshake; carries the reason for logging
    Plain(String),
    /// Need more data to determine protocol
    NeedMoreData,
}

/// Protocol information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolInfo {
    /// Protocol name
    pub name: String,
    /// Record-layer version (if recognized)
    pub version: Option<String>,
}

/// Protocol detector trait
///
/// Implementations must be pure functions of the prefix they are given: the
/// same prefix always yields the same verdict, and a prefix that yields
/// `NeedMoreData` may only be resolved by appending bytes.
pub trait ProtocolDetector: Send + Sync {
    /// Classify the bytes read so far
    fn detect(&self, data: &[u8]) -> DetectionResult;

    /// Describe the detected protocol, for logging
    fn protocol_info(&self, data: &[u8]) -> Option<ProtocolInfo>;
}

/// TLS protocol detector
///
/// Looks for the start of a ClientHello: a handshake record (0x16) long
/// enough to hold one, whose first handshake message has type 0x01.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsDetector;

impl TlsDetector {
    /// Create a new TLS detector
    pub fn new() -> Self {
        Self
    }

    fn record_version(major: u8, minor: u8) -> Option<&'static str> {
        match (major, minor) {
            (0x03, 0x00) => Some("SSLv3"),
            (0x03, 0x01) => Some("TLSv1.0"),
            (0x03, 0x02) => Some("TLSv1.1"),
            (0x03, 0x03) => Some("TLSv1.2"),
            (0x03, 0x04) => Some("TLSv1.3"),
            _ => None,
        }
    }
}

impl ProtocolDetector for TlsDetector {
    fn detect(&self, data: &[u8]) -> DetectionResult {
        let Some(&first) = data.first() else {
            return DetectionResult::NeedMoreData;
        };

        // A single byte is enough to rule TLS out
        if first != TLS_HANDSHAKE {
            let reason = format!("first byte is {:#04x}, expected {:#04x}", first, TLS_HANDSHAKE);
            debug!("Non-TLS protocol detected: {}", reason);
            return DetectionResult::Plain(reason);
        }

        if data.len() < TLS_RECORD_HEADER_LEN {
            trace!("Partial TLS record header: got {} bytes, need {}", data.len(), TLS_RECORD_HEADER_LEN);
            return DetectionResult::NeedMoreData;
        }

        // The record version is not checked: clients put arbitrary values here
        let record_length = u16::from_be_bytes([data[3], data[4]]) as usize;
        if record_length < MIN_CLIENT_HELLO_RECORD_LEN {
            return DetectionResult::Plain(format!("record of {} bytes is too short for a ClientHello", record_length));
        }

        if data.len() < CLIENT_HELLO_PREFIX_LEN {
            return DetectionResult::NeedMoreData;
        }

        if data[TLS_RECORD_HEADER_LEN] != CLIENT_HELLO {
            return DetectionResult::Plain(format!("handshake type {:#04x} is not a ClientHello", data[TLS_RECORD_HEADER_LEN]));
        }

        debug!("TLS protocol detected");
        DetectionResult::Secure
    }

    fn protocol_info(&self, data: &[u8]) -> Option<ProtocolInfo> {
        if data.len() < 3 || data[0] != TLS_HANDSHAKE {
            return None;
        }

        let version = Self::record_version(data[1], data[2])
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({}.{})", data[1], data[2]));

        Some(ProtocolInfo {
            name: "TLS".to_string(),
            version: Some(version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: [u8; 11] = [
        0x16, 0x03, 0x01, 0x00, 0x31, // record header
        0x01, 0x00, 0x00, 0x2d, 0x03, 0x03, // handshake header
    ];

    #[test]
    fn test_tls_detection() {
        assert_eq!(TlsDetector::new().detect(&HELLO), DetectionResult::Secure);
    }

    #[test]
    fn test_partial_hello_needs_more_data() {
        let detector = TlsDetector::new();
        assert_eq!(detector.detect(&[]), DetectionResult::NeedMoreData);
        for n in 1..CLIENT_HELLO_PREFIX_LEN {
            assert_eq!(detector.detect(&HELLO[..n]), DetectionResult::NeedMoreData, "prefix of {} bytes", n);
        }
        assert_eq!(detector.detect(&HELLO[..CLIENT_HELLO_PREFIX_LEN]), DetectionResult::Secure);
    }

    #[test]
    fn test_http_is_plain_after_one_byte() {
        let detector = TlsDetector::new();
        assert!(matches!(detector.detect(b"G"), DetectionResult::Plain(_)));
        assert!(matches!(detector.detect(b"GET / HTTP/1.1\r\n"), DetectionResult::Plain(_)));
    }

    #[test]
    fn test_short_record_is_plain_without_handshake_type() {
        let detector = TlsDetector::new();
        assert!(matches!(detector.detect(&[0x16, 0x03, 0x01, 0x00, 0x10]), DetectionResult::Plain(_)));
        assert!(matches!(detector.detect(&[0x16, 0x03, 0x03, 0x00, 0x21, 0x01]), DetectionResult::Plain(_)));
        assert!(matches!(detector.detect(&[0x16, 0x03, 0x03, 0x00, 0x00]), DetectionResult::Plain(_)));
    }

    #[test]
    fn test_other_handshake_messages_are_plain() {
        let detector = TlsDetector::new();
        // ServerHello
        assert!(matches!(detector.detect(&[0x16, 0x03, 0x03, 0x00, 0x31, 0x02]), DetectionResult::Plain(_)));
        // Certificate
        assert!(matches!(detector.detect(&[0x16, 0x03, 0x03, 0x01, 0x00, 0x0b]), DetectionResult::Plain(_)));
    }

    #[test]
    fn test_record_version_is_not_checked() {
        let detector = TlsDetector::new();
        assert_eq!(detector.detect(&[0x16, 0x03, 0x05, 0x00, 0x31, 0x01]), DetectionResult::Secure);
        assert_eq!(detector.detect(&[0x16, 0x02, 0x00, 0x00, 0x31, 0x01]), DetectionResult::Secure);
        assert_eq!(detector.detect(&[0x16, 0x03, 0x03, 0xff, 0xff, 0x01]), DetectionResult::Secure);
    }

    #[test]
    fn test_protocol_info() {
        let detector = TlsDetector::new();
        let info = detector.protocol_info(&HELLO).unwrap();
        assert_eq!(info.name, "TLS");
        assert_eq!(info.version.as_deref(), Some("TLSv1.0"));

        assert!(detector.protocol_info(b"GET").is_none());
    }
}
