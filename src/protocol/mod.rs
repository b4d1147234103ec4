//! Protocol detection module
//!
//! Decides, from the first bytes of a connection, whether the peer is starting
//! a TLS handshake. The `ProtocolDetector` trait is the extension point for
//! classifiers that distinguish more than two protocols.

mod detector;

pub use detector::{
    DetectionResult, ProtocolDetector, ProtocolInfo, TlsDetector, CLIENT_HELLO,
    CLIENT_HELLO_PREFIX_LEN, TLS_HANDSHAKE, TLS_RECORD_HEADER_LEN,
};
