use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_BYTES: usize = 64;
const RESET_TOKEN_BYTES: usize = 32;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Opaque refresh token: 64 random bytes, base64.
pub fn generate_refresh_token() -> String {
    STANDARD.encode(random_bytes::<REFRESH_TOKEN_BYTES>())
}

/// A freshly minted password reset token.
pub struct ResetToken {
    /// URL-safe form mailed to the user.
    pub encoded: String,
    /// Digest stored on the account.
    pub digest: String,
}

pub fn generate_reset_token() -> ResetToken {
    let raw = random_bytes::<RESET_TOKEN_BYTES>();
    ResetToken {
        encoded: URL_SAFE_NO_PAD.encode(raw),
        digest: digest(&raw),
    }
}

/// Digest of a token as received back from the user, or `None` if it is not
/// a token this service could have issued.
pub fn reset_token_digest(encoded: &str) -> Option<String> {
    let raw = URL_SAFE_NO_PAD.decode(encoded.trim()).ok()?;
    (raw.len() == RESET_TOKEN_BYTES).then(|| digest(&raw))
}

fn digest(raw: &[u8]) -> String {
    hex::encode(Sha256::digest(raw))
}
