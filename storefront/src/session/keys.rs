// storefront/src/session/keys.rs

use actix_web::cookie::Key;
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

const KEY_HALF_LEN: usize = 32;

/// Normalises a configured secret into 32 key bytes.
///
/// A value that base64-decodes to at least 32 bytes is used directly (first 32
/// bytes); anything else is hashed with SHA-256.
pub fn key_material(raw: &str) -> [u8; KEY_HALF_LEN] {
  let mut out = [0u8; KEY_HALF_LEN];
  match STANDARD.decode(raw.trim()) {
    Ok(decoded) if decoded.len() >= KEY_HALF_LEN => out.copy_from_slice(&decoded[..KEY_HALF_LEN]),
    _ => out.copy_from_slice(&Sha256::digest(raw.as_bytes())),
  }
  out
}

/// Cookie key for the session and flash cookies: the auth secret signs, the
/// encryption secret encrypts.
pub fn cookie_key(auth_secret: &str, enc_secret: &str) -> Key {
  let mut combined = [0u8; KEY_HALF_LEN * 2];
  combined[..KEY_HALF_LEN].copy_from_slice(&key_material(auth_secret));
  combined[KEY_HALF_LEN..].copy_from_slice(&key_material(enc_secret));
  Key::from(&combined)
}

/// Signing key for the CSRF cookie, expanded from the configured secret.
pub fn csrf_key(secret: &str) -> Key {
  Key::derive_from(&Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn long_base64_secrets_are_used_verbatim() {
    let raw_bytes: Vec<u8> = (0u8..48).collect();
    let encoded = STANDARD.encode(&raw_bytes);
    assert_eq!(key_material(&encoded).to_vec(), raw_bytes[..32].to_vec());
  }

  #[test]
  fn short_or_plain_secrets_are_hashed() {
    let short = STANDARD.encode(b"too short");
    assert_eq!(key_material(&short).to_vec(), Sha256::digest(short.as_bytes()).to_vec());
    assert_eq!(
      key_material("not base64 at all!").to_vec(),
      Sha256::digest(b"not base64 at all!").to_vec()
    );
  }

  #[test]
  fn cookie_key_is_deterministic_per_secret_pair() {
    let a = cookie_key("auth-secret", "enc-secret");
    let b = cookie_key("auth-secret", "enc-secret");
    let c = cookie_key("auth-secret", "other-secret");
    assert_eq!(a.master(), b.master());
    assert_ne!(a.master(), c.master());
  }
}
