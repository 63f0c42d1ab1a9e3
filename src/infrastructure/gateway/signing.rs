//! Request authentication for the payment gateway (`IYZWSv2` scheme).
//!
//! ```text
//! payload       = random_key + path + body
//! signature     = hex(HMAC-SHA256(secret_key, payload))
//! Authorization = "IYZWSv2 " + base64("apiKey:" + api_key
//!                                      + "&randomKey:" + random_key
//!                                      + "&signature:" + signature)
//! ```
//! `body` must be the exact bytes sent on the wire; the gateway recomputes the
//! signature from what it receives.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_SCHEME: &str = "IYZWSv2";

#[derive(Clone)]
pub struct RequestSigner {
    api_key: String,
    secret_key: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn signature(&self, random_key: &str, path: &str, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(random_key.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn authorization(&self, random_key: &str, path: &str, body: &str) -> String {
        let signature = self.signature(random_key, path, body);
        let params = format!(
            "apiKey:{}&randomKey:{}&signature:{}",
            self.api_key, random_key, signature
        );
        format!("{} {}", AUTH_SCHEME, STANDARD.encode(params))
    }
}

/// Per-request nonce: milliseconds since the epoch followed by random digits.
pub fn random_key() -> String {
    format!(
        "{}{:09}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>() % 1_000_000_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"locale":"tr","conversationId":"ORD-240517-3F9A0C11D2","binNumber":"552879"}"#;

    fn signer() -> RequestSigner {
        RequestSigner::new("sandbox-api-key", "sandbox-secret-key")
    }

    #[test]
    fn authorization_is_reproducible() {
        let a = signer().authorization("1715939400000123456789", "/payment/bin/check", BODY);
        let b = signer().authorization("1715939400000123456789", "/payment/bin/check", BODY);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_is_hmac_of_concatenated_payload() {
        let mut mac = HmacSha256::new_from_slice(b"sandbox-secret-key").unwrap();
        mac.update(format!("{}{}{}", "rk", "/payment/detail", BODY).as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(signer().signature("rk", "/payment/detail", BODY), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn authorization_header_layout() {
        let header = signer().authorization("rk", "/payment/auth", BODY);
        let encoded = header.strip_prefix("IYZWSv2 ").expect("scheme prefix");
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        let signature = signer().signature("rk", "/payment/auth", BODY);
        assert_eq!(
            decoded,
            format!("apiKey:sandbox-api-key&randomKey:rk&signature:{signature}")
        );
    }

    #[test]
    fn any_change_to_the_signed_input_changes_the_signature() {
        let base = signer().signature("rk", "/payment/auth", BODY);
        assert_ne!(base, signer().signature("rk2", "/payment/auth", BODY));
        assert_ne!(base, signer().signature("rk", "/payment/detail", BODY));
        assert_ne!(base, signer().signature("rk", "/payment/auth", &BODY.replace("tr", "en")));
        assert_ne!(
            base,
            RequestSigner::new("sandbox-api-key", "other").signature("rk", "/payment/auth", BODY)
        );
    }

    #[test]
    fn random_keys_are_numeric_and_fresh() {
        let a = random_key();
        let b = random_key();
        assert!(a.chars().all(|c| c.is_ascii_digit()), "{a}");
        assert!(a.len() >= 22);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_the_secret() {
        assert!(!format!("{:?}", signer()).contains("sandbox-secret-key"));
    }
}
