//! Stream Video API client.
//!
//! The core consumes a narrow slice of the video provider: issuing
//! short-lived user tokens for joining calls, and creating the call a
//! meeting's webhooks will later reference by call ID. Recording and
//! transcription artifacts arrive via webhook, not through this client.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims for a user call token
#[derive(Debug, Serialize, Deserialize)]
pub struct UserTokenClaims {
    pub user_id: String,
    pub iat: u64,
    pub exp: u64,
}

/// Claims for the server-to-server API token
#[derive(Debug, Serialize, Deserialize)]
struct ServerTokenClaims {
    server: bool,
    iat: u64,
}

/// Request body for creating or fetching a call
#[derive(Debug, Serialize)]
struct CreateCallBody {
    data: CreateCallData,
}

#[derive(Debug, Serialize)]
struct CreateCallData {
    created_by_id: String,
}

/// Response from call creation
#[derive(Debug, Deserialize)]
pub struct CreateCallResponse {
    #[serde(default)]
    pub call: Option<CallInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CallInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub cid: Option<String>,
}

/// Stream Video API client
pub struct StreamVideoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl StreamVideoClient {
    /// Create a new Stream Video client with the given credentials and base URL
    pub fn new(api_key: &str, api_secret: &str, base_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Issue a signed user token for joining calls, valid for `validity`.
    pub fn issue_user_token(&self, user_id: &str, validity: Duration) -> Result<String, Error> {
        let iat = Self::unix_now();
        let claims = UserTokenClaims {
            user_id: user_id.to_string(),
            iat,
            exp: iat + validity.as_secs(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Server-side token used to authorize API calls to the provider.
    fn server_token(&self) -> Result<String, Error> {
        let claims = ServerTokenClaims {
            server: true,
            iat: Self::unix_now(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?)
    }

    /// Create (or get) a call with the given type and ID. The returned call ID
    /// is what subsequent webhook events will be matched against.
    pub async fn create_call(
        &self,
        call_type: &str,
        call_id: &str,
        created_by: &str,
    ) -> Result<String, Error> {
        let url = format!(
            "{}/video/call/{}/{}?api_key={}",
            self.base_url, call_type, call_id, self.api_key
        );

        debug!("Creating video call: {call_type}:{call_id}");

        let body = CreateCallBody {
            data: CreateCallData {
                created_by_id: created_by.to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("stream-auth-type", "jwt")
            .header(reqwest::header::AUTHORIZATION, self.server_token()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to create video call: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            let created: CreateCallResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse call creation response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Stream Video".to_string(),
                    )),
                }
            })?;

            // The provider echoes the id back; fall back to what we asked for.
            let id = created
                .call
                .and_then(|call| call.id)
                .unwrap_or_else(|| call_id.to_string());

            info!("Created video call with ID: {id}");
            Ok(id)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Stream Video API error: {}", error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(error_text)),
            })
        }
    }
}

/// Build a client from optional credentials, failing with a config error
/// when either is missing.
pub fn client_from_credentials(
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: &str,
) -> Result<StreamVideoClient, Error> {
    match (api_key, api_secret) {
        (Some(key), Some(secret)) => StreamVideoClient::new(&key, &secret, base_url),
        _ => {
            warn!("Stream Video credentials are not configured");
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn issued_user_tokens_carry_bounded_expiry() {
        let client =
            StreamVideoClient::new("key", "super-secret", "https://video.example.com").unwrap();

        let token = client
            .issue_user_token("user-42", Duration::from_secs(3600))
            .unwrap();

        let mut validation = Validation::default();
        validation.validate_exp = false;
        let decoded = decode::<UserTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"super-secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.user_id, "user-42");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }

    #[test]
    fn tokens_signed_with_another_secret_fail_validation() {
        let client =
            StreamVideoClient::new("key", "super-secret", "https://video.example.com").unwrap();
        let token = client
            .issue_user_token("user-42", Duration::from_secs(60))
            .unwrap();

        let mut validation = Validation::default();
        validation.validate_exp = false;
        let result = decode::<UserTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"a-different-secret"),
            &validation,
        );

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_call_posts_to_typed_call_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/video/call/default/abc123")
            .match_query(mockito::Matcher::UrlEncoded(
                "api_key".into(),
                "key".into(),
            ))
            .with_status(201)
            .with_body(r#"{"call": {"id": "abc123", "cid": "default:abc123"}}"#)
            .create_async()
            .await;

        let client = StreamVideoClient::new("key", "secret", &server.url()).unwrap();
        let call_id = client.create_call("default", "abc123", "user-1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(call_id, "abc123");
    }

    #[test]
    fn missing_credentials_produce_config_error() {
        let result = client_from_credentials(Some("key".to_string()), None, "https://x");
        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        ));
    }
}
