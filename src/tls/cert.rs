//! Certificate helpers
//!
//! Inspection of the configured server certificate for startup logging, and
//! generation of throwaway self-signed certificates for demos and tests.

use log::debug;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509NameBuilder, X509NameRef, X509};
use std::path::Path;

use crate::common::{check_file_exists, ProxyError, Result};

/// Load a PEM certificate from disk
pub fn load_cert(cert_path: &Path) -> Result<X509> {
    check_file_exists(cert_path)?;
    let pem = std::fs::read(cert_path)?;
    X509::from_pem(&pem)
        .map_err(|e| ProxyError::Certificate(format!("Failed to parse certificate: {}", e)))
}

fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = entry.data().to_string().unwrap_or_default();
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Get the subject of a certificate file as `CN=..., O=...`
pub fn get_cert_subject(cert_path: &Path) -> Result<String> {
    let cert = load_cert(cert_path)?;
    Ok(format_name(cert.subject_name()))
}

/// Get the SHA-256 fingerprint of a certificate file as colon-separated hex
pub fn get_cert_fingerprint(cert_path: &Path) -> Result<String> {
    let cert = load_cert(cert_path)?;
    let digest = cert.digest(MessageDigest::sha256())
        .map_err(|e| ProxyError::Certificate(format!("Failed to calculate certificate fingerprint: {}", e)))?;

    Ok(digest.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<String>>()
        .join(":"))
}

/// Generate a self-signed P-256 certificate valid for one year
pub fn self_signed(common_name: &str) -> Result<(X509, PKey<Private>)> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let key = PKey::from_ec_key(EcKey::generate(&group)?)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
    let name = name.build();

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(365)?;
    builder.set_not_after(&not_after)?;
    builder.sign(&key, MessageDigest::sha256())?;

    debug!("Generated self-signed certificate for {}", common_name);
    Ok((builder.build(), key))
}
