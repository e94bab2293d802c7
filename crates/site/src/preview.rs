//! Signed preview tokens.
//!
//! A preview link carries `token = hex(hmac_sha256(secret, slug))`, so a
//! token grants draft access to exactly one slug and cannot be forged
//! without the secret.

use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies preview tokens.
#[derive(Clone)]
pub struct PreviewSigner {
    /// Keyed MAC, cloned per token.
    keyed: HmacSha256,
}

impl PreviewSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| anyhow::anyhow!("invalid preview secret: {e}"))?;
        Ok(Self { keyed })
    }

    /// Hex token for `slug`.
    pub fn sign(&self, slug: &str) -> String {
        let mut mac = self.keyed.clone();
        mac.update(slug.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a token in constant time. Malformed hex is rejected.
    pub fn verify(&self, slug: &str, token: &str) -> bool {
        let Ok(provided) = hex::decode(token.trim()) else {
            return false;
        };
        let mut mac = self.keyed.clone();
        mac.update(slug.as_bytes());
        let expected = mac.finalize().into_bytes();
        expected.as_slice().ct_eq(&provided).into()
    }
}

impl std::fmt::Debug for PreviewSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSigner")
            .field("keyed", &"[redacted]")
            .finish()
    }
}
