use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const DIGEST_CONTEXT: &[u8] = b"arx:payment-verification";

/// key: billing-authorizer -> operator credential check
///
/// The ledger asks this capability whether the presented credential may verify payments.
/// Swapping the implementation (e.g. per-operator accounts) leaves the ledger untouched.
#[async_trait]
pub trait VerificationAuthorizer: Send + Sync {
    async fn authorize(&self, credential: Option<&str>) -> AppResult<()>;
}

/// Single trusted operator identified by a shared secret.
pub struct SharedSecretAuthorizer {
    expected: Option<Vec<u8>>,
}

impl SharedSecretAuthorizer {
    pub fn new(secret: Option<String>) -> Self {
        let expected = secret
            .filter(|value| !value.is_empty())
            .and_then(|value| digest(value.as_bytes()));
        Self { expected }
    }
}

// The context is the HMAC key and the secret is the message, so two inputs only share a
// digest when they are byte-for-byte equal.
fn keyed_mac(input: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(DIGEST_CONTEXT).ok()?;
    mac.update(input);
    Some(mac)
}

fn digest(secret: &[u8]) -> Option<Vec<u8>> {
    keyed_mac(secret).map(|mac| mac.finalize().into_bytes().to_vec())
}

#[async_trait]
impl VerificationAuthorizer for SharedSecretAuthorizer {
    async fn authorize(&self, credential: Option<&str>) -> AppResult<()> {
        let (Some(expected), Some(candidate)) = (self.expected.as_ref(), credential) else {
            return Err(AppError::Unauthorized);
        };
        let mac = keyed_mac(candidate.as_bytes()).ok_or(AppError::Unauthorized)?;
        // verify_slice compares in constant time
        mac.verify_slice(expected)
            .map_err(|_| AppError::Unauthorized)
    }
}
