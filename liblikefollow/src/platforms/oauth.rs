//! OAuth 1.0a request signing (HMAC-SHA1, user context)

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::config::TwitterCredentials;
use crate::error::PlatformError;

type HmacSha1 = Hmac<Sha1>;

/// Signs requests on behalf of one user
#[derive(Debug)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: SecretString,
    token: String,
    token_secret: SecretString,
}

impl OAuthSigner {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self {
            consumer_key: credentials.api_key,
            consumer_secret: credentials.api_secret,
            token: credentials.access_token,
            token_secret: credentials.access_token_secret,
        }
    }

    /// Build the `Authorization` header for a request
    ///
    /// `url` must not contain a query string; query parameters go in `params`.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PlatformError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, params, &nonce, &timestamp)
    }

    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, PlatformError> {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let signature = self.signature(method, url, params, &oauth_params)?;

        let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
        header_params.push(("oauth_signature", signature.as_str()));
        header_params.sort();

        let fields: Vec<String> = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();

        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String, PlatformError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.extend_from_slice(oauth_params);

        let base = signature_base_string(method, url, &all_params);
        let key = format!(
            "{}&{}",
            encode(self.consumer_secret.expose_secret()),
            encode(self.token_secret.expose_secret())
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| PlatformError::Authentication(format!("Invalid signing key: {}", e)))?;
        mac.update(base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&parameter_string)
    )
}

/// RFC 3986 percent-encoding (everything except unreserved characters)
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
