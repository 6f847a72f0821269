//! HTTP client for the hosted backend.
//!
//! Speaks the two APIs the dashboard uses: the auth API under `/auth/v1`
//! and the table API under `/rest/v1`. Every request carries the public
//! `apikey` header; `Authorization` carries the signed-in user's access token
//! when there is one, the public key otherwise.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use studyhub_core::config::BackendConfig;
use studyhub_core::error::{Result, StudyhubError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `Accept` value asking the table API for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Error code the table API returns when a single-object read matched no rows.
const NO_ROWS_CODE: &str = "PGRST116";

/// Error code for a row-level security violation.
const INSUFFICIENT_PRIVILEGE_CODE: &str = "42501";

/// Error payload shared (loosely) by both APIs.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ApiErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            Some(serde_json::Value::Number(code)) => Some(code.to_string()),
            _ => None,
        }
    }

    fn message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// What a failed request was about, for `NotFound` errors.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub entity_type: &'static str,
    pub id: &'a str,
}

/// Whether a request asked for exactly one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rows,
    /// Sent with the single-object `Accept`; 406 means "not exactly one row".
    SingleRow,
}

/// Maps a non-success response to a domain error.
///
/// # Mapping
///
/// - code `PGRST116`, HTTP 404, or HTTP 406 on a single-row request ⇒ `NotFound`
/// - code `42501`, HTTP 401, or HTTP 403 ⇒ `Permission`
/// - HTTP 400 / 422 ⇒ `Validation`
/// - anything else ⇒ `Network` with the status attached
pub fn map_error_response(
    status: StatusCode,
    body: &str,
    target: Target<'_>,
    shape: Shape,
) -> StudyhubError {
    let parsed = ApiErrorBody::parse(body);
    let code = parsed.code();
    let message = parsed.message(status.canonical_reason().unwrap_or("request failed"));

    if code.as_deref() == Some(NO_ROWS_CODE)
        || status == StatusCode::NOT_FOUND
        || (shape == Shape::SingleRow && status == StatusCode::NOT_ACCEPTABLE)
    {
        return StudyhubError::not_found(target.entity_type, target.id);
    }
    if code.as_deref() == Some(INSUFFICIENT_PRIVILEGE_CODE)
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return StudyhubError::permission(message);
    }
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        return StudyhubError::validation(message);
    }
    StudyhubError::network(format!("HTTP {}: {}", status.as_u16(), message))
}

/// Transport failures (DNS, connect, TLS, timeouts, bad bodies).
pub fn map_transport_error(e: reqwest::Error) -> StudyhubError {
    if e.is_decode() {
        return StudyhubError::Serialization {
            format: "JSON".to_string(),
            message: e.to_string(),
        };
    }
    StudyhubError::network(e.to_string())
}

/// Shared client for both APIs.
#[derive(Debug)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.require()?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StudyhubError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token used for `Authorization` from now on; `None` falls back to the public key.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Request with `apikey` and `Authorization` set.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
    }

    /// Sends `request` and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: Target<'_>,
    ) -> Result<T> {
        self.exchange(request, target, Shape::Rows).await
    }

    /// Sends `request`, turning non-success statuses into domain errors.
    pub async fn send(&self, request: RequestBuilder, target: Target<'_>) -> Result<Response> {
        self.dispatch(request, target, Shape::Rows).await
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: Target<'_>,
        shape: Shape,
    ) -> Result<T> {
        let response = self.dispatch(request, target, shape).await?;
        response.json::<T>().await.map_err(map_transport_error)
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        target: Target<'_>,
        shape: Shape,
    ) -> Result<Response> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = map_error_response(status, &body, target, shape);
        tracing::debug!("[Backend] {} {} -> {}", target.entity_type, target.id, error);
        Err(error)
    }

    /// `GET /rest/v1/{table}` returning all matching rows.
    pub async fn select_many<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
        entity_type: &'static str,
    ) -> Result<Vec<T>> {
        let request = self.request(Method::GET, &self.rest_url(table)).query(params);
        self.send_json(
            request,
            Target {
                entity_type,
                id: "*",
            },
        )
        .await
    }

    /// `GET /rest/v1/{table}` expecting exactly one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
        target: Target<'_>,
    ) -> Result<T> {
        let request = self
            .request(Method::GET, &self.rest_url(table))
            .query(params)
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT));
        self.exchange(request, target, Shape::SingleRow).await
    }

    /// `POST` or `PATCH` with `Prefer: return=representation`, returning the stored row.
    pub async fn write_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        table: &str,
        params: &[(String, String)],
        body: &B,
        target: Target<'_>,
    ) -> Result<T> {
        let request = self
            .request(method, &self.rest_url(table))
            .query(params)
            .header("Prefer", "return=representation")
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .json(body);
        self.exchange(request, target, Shape::SingleRow).await
    }

    /// `DELETE /rest/v1/{table}` for the matching rows.
    pub async fn delete(
        &self,
        table: &str,
        params: &[(String, String)],
        target: Target<'_>,
    ) -> Result<()> {
        let request = self.request(Method::DELETE, &self.rest_url(table)).query(params);
        self.send(request, target).await?;
        Ok(())
    }
}

/// `column=eq.value` filter pair.
pub fn eq_param(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Target<'static> = Target {
        entity_type: "profile",
        id: "42",
    };

    fn config() -> BackendConfig {
        BackendConfig {
            url: "https://example.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
        }
    }

    #[test]
    fn test_no_rows_code_maps_to_not_found() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","message":"JSON object requested, multiple (or no) rows returned"}"#;
        let error = map_error_response(StatusCode::NOT_ACCEPTABLE, body, TARGET, Shape::Rows);
        assert_eq!(error, StudyhubError::not_found("profile", "42"));

        let error = map_error_response(StatusCode::NOT_FOUND, "", TARGET, Shape::Rows);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_not_acceptable_is_not_found_only_for_single_rows() {
        let error = map_error_response(StatusCode::NOT_ACCEPTABLE, "", TARGET, Shape::SingleRow);
        assert_eq!(error, StudyhubError::not_found("profile", "42"));

        let error = map_error_response(StatusCode::NOT_ACCEPTABLE, "", TARGET, Shape::Rows);
        assert!(error.is_network());
        assert!(error.to_string().contains("406"));
    }

    #[test]
    fn test_rls_violation_maps_to_permission() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        let error = map_error_response(StatusCode::BAD_REQUEST, body, TARGET, Shape::Rows);
        assert_eq!(
            error,
            StudyhubError::permission("new row violates row-level security policy")
        );

        assert!(map_error_response(StatusCode::UNAUTHORIZED, "", TARGET, Shape::Rows).is_permission());
    }

    #[test]
    fn test_auth_api_message_is_kept() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let error = map_error_response(StatusCode::BAD_REQUEST, body, TARGET, Shape::Rows);
        assert_eq!(error, StudyhubError::validation("Invalid login credentials"));
    }

    #[test]
    fn test_server_error_maps_to_network() {
        let error = map_error_response(StatusCode::BAD_GATEWAY, "<html>", TARGET, Shape::Rows);
        assert!(error.is_network());
        assert!(error.to_string().contains("502"));
    }

    #[test]
    fn test_urls() {
        let client = BackendClient::new(&config()).unwrap();
        assert_eq!(client.base_url(), "https://example.supabase.co");
        assert_eq!(
            client.auth_url("token?grant_type=password"),
            "https://example.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(client.rest_url("polls"), "https://example.supabase.co/rest/v1/polls");
    }

    #[test]
    fn test_missing_backend_is_config_error() {
        let error = BackendClient::new(&BackendConfig::default()).unwrap_err();
        assert!(error.is_config());
    }

    #[test]
    fn test_access_token_swap() {
        let client = BackendClient::new(&config()).unwrap();
        assert_eq!(client.access_token(), None);
        client.set_access_token(Some("jwt".to_string()));
        assert_eq!(client.access_token().as_deref(), Some("jwt"));
    }
}
