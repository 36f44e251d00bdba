//! Random signing secrets for the access and refresh token domains.
//!
//! Secrets are drawn from the OS RNG and rendered as unpadded URL-safe
//! base64, ready to drop into `passgate.toml` or `JWT_SECRET`.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// 48 random bytes, 64 characters once encoded
pub const DEFAULT_SECRET_BYTES: usize = 48;

pub fn generate_secret() -> String {
    generate_secret_with_size(DEFAULT_SECRET_BYTES)
}

/// Secret built from `bytes` random bytes
pub fn generate_secret_with_size(bytes: usize) -> String {
    let mut raw = vec![0u8; bytes];
    OsRng.fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}
