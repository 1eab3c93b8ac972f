//! HMAC-SHA256 signature verification for inbound webhooks.
//!
//! A signature is the standard base64 encoding (padded) of
//! `HMAC-SHA256(secret, signed_bytes)`. The signed bytes are either the request
//! body exactly as received or the compact re-serialization of its parsed
//! JSON, depending on the provider's [`SigningInput`].

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Which bytes a provider signs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningInput {
    /// The request body exactly as received.
    #[default]
    #[serde(rename = "raw")]
    RawBody,
    /// The parsed payload re-serialized as compact JSON.
    ///
    /// Only matches senders that sign the same canonical form; any difference
    /// in key order or whitespace fails verification. Keys come out sorted and
    /// `<`, `>` and `&` are written literally, so senders that escape them as
    /// `\u003c`, `\u003e` and `\u0026` before signing will not verify.
    Reserialized,
}

impl SigningInput {
    /// Returns the bytes to sign for a request with `raw` body and parsed `payload`.
    #[must_use]
    pub fn signed_bytes<'a>(self, raw: &'a [u8], payload: &Value) -> Cow<'a, [u8]> {
        match self {
            Self::RawBody => Cow::Borrowed(raw),
            // Serializing a Value cannot fail: keys are always strings.
            Self::Reserialized => Cow::Owned(serde_json::to_vec(payload).unwrap_or_default()),
        }
    }
}

/// Computes the base64-encoded HMAC-SHA256 of `message` under `secret`.
#[must_use]
pub fn compute_signature(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Checks `signature_header` against the signature of `signed_bytes`.
///
/// Returns false without computing anything when the header is absent. The
/// comparison runs in constant time over the encoded strings.
#[must_use]
pub fn verify_signature(
    secret: &[u8],
    signature_header: Option<&str>,
    signed_bytes: &[u8],
) -> bool {
    let Some(provided) = signature_header else {
        return false;
    };

    let expected = compute_signature(secret, signed_bytes);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

/// Length is compared first; only the contents are compared in constant time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
