//! HTTP implementation of `AuthBackend`.
//!
//! Every request carries `Content-Type: application/json`; the verify call
//! sends the stored token verbatim as its `Authorization` header.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{BearerToken, Credentials, Identity, RegistrationData};

use super::{ApiError, AuthBackend};

// ============================================================================
// Constants
// ============================================================================

/// Session verification endpoint
const VERIFY_PATH: &str = "/user/me";

/// Credential exchange endpoints
const LOGIN_PATH: &str = "/login";
const REGISTER_PATH: &str = "/register";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: Option<Identity>,
}

/// API client for the authentication backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning a rejection with the
    /// server's message if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %ApiError::truncate_body(&body), "Request rejected");
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a success body. A body that does not match is a malformed
    /// response rather than a network failure.
    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&body)))
        })
    }
}

impl AuthBackend for ApiClient {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, ApiError> {
        let url = self.url(VERIFY_PATH);
        debug!(%url, "Verifying session token");

        let response = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, token.as_header_value())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let me: MeResponse = Self::parse_json(response).await?;

        me.user
            .ok_or_else(|| ApiError::InvalidResponse("verify response has no user".to_string()))
    }

    async fn exchange_login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(%url, "Exchanging credentials");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password(),
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let auth: TokenResponse = Self::parse_json(response).await?;

        match auth.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::InvalidResponse(
                "login response has no token".to_string(),
            )),
        }
    }

    async fn exchange_register(&self, data: &RegistrationData) -> Result<(), ApiError> {
        let url = self.url(REGISTER_PATH);
        debug!(%url, ?data, "Submitting registration");

        let response = self.client.post(&url).json(data).send().await?;

        Self::check_response(response).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_verify_sends_stored_token_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .and(header("Authorization", "Bearer abc"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": { "id": 1, "name": "alice" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let identity = client
            .verify(&BearerToken::from_stored("Bearer abc"))
            .await
            .unwrap();
        assert_eq!(identity.as_value(), &json!({ "id": 1, "name": "alice" }));
    }

    #[tokio::test]
    async fn test_verify_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .verify(&BearerToken::from_raw("expired"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status, .. } if status.as_u16() == 401));
    }

    #[tokio::test]
    async fn test_verify_null_user_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": null })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .verify(&BearerToken::from_raw("abc"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_exchange_login_posts_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({ "username": "alice", "password": "rightpass" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "xyz" })))
            .expect(1)
            .mount(&server)
            .await;

        // Trailing slash on the base URL must not double up in the path
        let client = ApiClient::new(&format!("{}/", server.uri())).unwrap();
        let token = client
            .exchange_login(&Credentials::new("alice", "rightpass"))
            .await
            .unwrap();
        assert_eq!(token, "xyz");
    }

    #[tokio::test]
    async fn test_exchange_login_rejection_keeps_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "invalid credentials"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .exchange_login(&Credentials::new("alice", "wrongpass"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message("Login failed"), "invalid credentials");
    }

    #[tokio::test]
    async fn test_exchange_login_without_token_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .exchange_login(&Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_exchange_register_ignores_success_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_json(json!({ "username": "bob", "password": "p" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let data = RegistrationData::new()
            .with_field("username", "bob")
            .with_field("password", "p");
        client.exchange_register(&data).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is not expected to be listening
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client
            .verify(&BearerToken::from_raw("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
    }
}
