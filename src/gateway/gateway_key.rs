//! Gateway key verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the shared gateway key.
pub const GATEWAY_KEY_HEADER: &str = "x-api-gateway-key";

/// The configured gateway key, held only as a MAC tag.
///
/// Presented keys are MACed under the same per-process random key and
/// compared with [`Mac::verify_slice`], which runs in constant time, so
/// response timing leaks nothing about how much of a guess was right.
#[derive(Clone)]
pub struct GatewayKey {
    mac_key: [u8; 32],
    expected_tag: Vec<u8>,
}

impl GatewayKey {
    pub fn new(key: &str) -> Self {
        let mac_key: [u8; 32] = rand::random();
        let expected_tag = Self::mac(&mac_key, key.as_bytes())
            .finalize()
            .into_bytes()
            .to_vec();

        Self {
            mac_key,
            expected_tag,
        }
    }

    /// True when `presented` equals the configured key byte for byte.
    /// A missing header never matches.
    pub fn matches(&self, presented: Option<&[u8]>) -> bool {
        let Some(presented) = presented else {
            return false;
        };

        Self::mac(&self.mac_key, presented)
            .verify_slice(&self.expected_tag)
            .is_ok()
    }

    fn mac(mac_key: &[u8; 32], message: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(mac_key).expect("HMAC accepts any key length");
        mac.update(message);
        mac
    }
}

impl std::fmt::Debug for GatewayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GatewayKey(***)")
    }
}
