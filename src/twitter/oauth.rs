//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;

/// User-context OAuth credentials.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuthCredentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Builds the `Authorization` header value for a request.
    ///
    /// `params` are the query (or form) parameters of the request, unencoded.
    pub fn authorization_header(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, &nonce, &timestamp)
    }

    /// Same as [`authorization_header`](Self::authorization_header) with a
    /// fixed nonce and timestamp.
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let oauth_params = self.oauth_params(nonce, timestamp);
        let signature = self.signature(method, url, params, &oauth_params);

        let mut fields: Vec<(String, String)> = oauth_params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.push(("oauth_signature".to_string(), signature));
        fields.sort();

        let joined = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {joined}")
    }

    fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(&'static str, String)> {
        vec![
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", self.token.clone()),
            ("oauth_version", "1.0".to_string()),
        ]
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        oauth_params: &[(&'static str, String)],
    ) -> String {
        let base = signature_base_string(method, url, params, oauth_params);
        let signing_key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
        STANDARD.encode(hmac::sign(&key, base.as_bytes()).as_ref())
    }
}

/// RFC 3986 percent-encoding as required by OAuth 1.0a.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    oauth_params: &[(&'static str, String)],
) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let parameter_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&parameter_string)
    )
}
