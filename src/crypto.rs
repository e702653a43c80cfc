use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{MonitorError, Result};

/// Length of a consensus address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Derive the consensus address of a validator from its base64 public key:
/// the first 20 bytes of the SHA-256 digest, as uppercase hex.
pub fn address_from_pubkey(pubkey_b64: &str) -> Result<String> {
    let key = STANDARD
        .decode(pubkey_b64.trim())
        .map_err(|e| MonitorError::InvalidPubKey(format!("{}: {}", pubkey_b64, e)))?;
    let digest = Sha256::digest(&key);
    Ok(hex::encode_upper(&digest[..ADDRESS_LEN]))
}
