//! Output encoding for signed certificates.
//!
//! The broker returns certificates as base64-encoded DER. [`SignOptions`] selects
//! whether the client hands that string back unchanged or re-wraps it as a PEM
//! `CERTIFICATE` block.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use snafu::ResultExt;

use crate::error::{CertificateDecodeSnafu, ConfigSnafu, Result, SdkError};

/// PEM label for X.509 certificates.
const PEM_LABEL: &str = "CERTIFICATE";

/// Base64 characters per PEM body line.
const PEM_LINE_WIDTH: usize = 64;

/// Encoding applied to the signed certificate before it is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CertificateEncoding {
    /// PEM block labelled `CERTIFICATE`.
    #[default]
    Pem,
    /// Base64-encoded DER, exactly as produced by the broker.
    Base64,
}

impl fmt::Display for CertificateEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pem => write!(f, "PEM"),
            Self::Base64 => write!(f, "B64"),
        }
    }
}

impl FromStr for CertificateEncoding {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pem" => Ok(Self::Pem),
            "b64" | "base64" => Ok(Self::Base64),
            other => ConfigSnafu {
                message: format!("unknown certificate encoding '{other}', expected PEM or B64"),
            }
            .fail(),
        }
    }
}

/// Options for [`CryptoBrokerClient::sign_with_options`](crate::CryptoBrokerClient::sign_with_options).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Encoding of the returned certificate. Defaults to PEM.
    pub output_encoding: CertificateEncoding,
}

impl SignOptions {
    /// Options returning a PEM block.
    #[must_use]
    pub const fn pem() -> Self {
        Self { output_encoding: CertificateEncoding::Pem }
    }

    /// Options returning the broker's base64 DER unchanged.
    #[must_use]
    pub const fn base64() -> Self {
        Self { output_encoding: CertificateEncoding::Base64 }
    }
}

/// Applies `encoding` to a base64 DER certificate returned by the broker.
pub(crate) fn encode_certificate(
    base64_der: String,
    encoding: CertificateEncoding,
) -> Result<String> {
    match encoding {
        CertificateEncoding::Base64 => Ok(base64_der),
        CertificateEncoding::Pem => {
            let der = STANDARD.decode(base64_der.as_bytes()).context(CertificateDecodeSnafu)?;
            Ok(pem_encode(PEM_LABEL, &der))
        },
    }
}

/// Encodes `der` as a PEM block with 64-character lines and a trailing newline.
fn pem_encode(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN ");
    pem.push_str(label);
    pem.push_str("-----\n");
    // Base64 output is ASCII, so byte chunks are valid line boundaries
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.extend(line.iter().map(|&b| char::from(b)));
        pem.push('\n');
    }
    pem.push_str("-----END ");
    pem.push_str(label);
    pem.push_str("-----\n");
    pem
}
