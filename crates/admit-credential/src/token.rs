//! Signed token encoding.
//!
//! A token is `base64url(payload_json) "." base64url(hmac_sha256(payload_json))`,
//! both parts unpadded. The payload JSON keeps the field order of
//! [`CredentialPayload`], so identical claims always produce identical bytes.

use admit_core::credential::CredentialPayload;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64URL};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

fn mac(key: &[u8], payload: &[u8]) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::InvalidKey)?;
  mac.update(payload);
  Ok(mac)
}

/// Serialize a payload into its canonical byte form.
pub fn canonical_bytes(payload: &CredentialPayload) -> Result<Vec<u8>> {
  Ok(serde_json::to_vec(payload)?)
}

pub fn sign(key: &[u8], payload: &CredentialPayload) -> Result<String> {
  let bytes = canonical_bytes(payload)?;
  let tag = mac(key, &bytes)?.finalize().into_bytes();
  Ok(format!("{}.{}", B64URL.encode(&bytes), B64URL.encode(tag)))
}

pub fn verify(key: &[u8], token: &str) -> Result<CredentialPayload> {
  let (body, sig) = token
    .trim()
    .split_once('.')
    .ok_or_else(|| Error::Malformed("missing signature separator".into()))?;

  let bytes = B64URL
    .decode(body)
    .map_err(|e| Error::Malformed(format!("payload: {e}")))?;
  let sig = B64URL
    .decode(sig)
    .map_err(|e| Error::Malformed(format!("signature: {e}")))?;

  mac(key, &bytes)?
    .verify_slice(&sig)
    .map_err(|_| Error::BadSignature)?;

  Ok(serde_json::from_slice(&bytes)?)
}
