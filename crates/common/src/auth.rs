use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const NONCE_LEN: usize = 32;

/// Generates a fresh random nonce for the server to issue at the start of a
/// connection's authentication handshake.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Computes `HMAC-SHA256(authkey, nonce)`, the value a client must present
/// to prove it holds the pre-shared key without ever sending the key itself.
pub fn compute_response(authkey: &[u8], nonce: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(authkey).expect("HMAC accepts keys of any length");
    mac.update(nonce);
    mac.finalize().into_bytes().to_vec()
}

/// Verifies a client's HMAC response against the expected value in constant
/// time (via `hmac`'s built-in fixed-time comparison).
pub fn verify_response(authkey: &[u8], nonce: &[u8], response: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(authkey).expect("HMAC accepts keys of any length");
    mac.update(nonce);
    mac.verify_slice(response).is_ok()
}
