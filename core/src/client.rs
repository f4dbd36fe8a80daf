//! Stateless HTTP request builder and response parser for the tutoring API.
//!
//! # Design
//! `TutorClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! session token is passed into every `build_*` call, so the token lifecycle
//! stays with the caller (see `ApiService`).
//!
//! Every non-2xx response is normalized by `error_from_response` into
//! `ApiError::Request`, carrying the backend's `detail` message when the
//! body has one and `HTTP error! status: <code>` otherwise.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthResponse, ContentRecord, GenerateContentRequest, LoginRequest, RegisterRequest,
    UpdateContent, User,
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Method, body and extra headers for the generic request primitive.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn method(method: HttpMethod) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    pub fn json<T: Serialize>(method: HttpMethod, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            method: Some(method),
            body: Some(body),
            headers: Vec::new(),
        })
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Synchronous, stateless client for the tutoring API.
#[derive(Debug, Clone)]
pub struct TutorClient {
    base_url: String,
}

impl TutorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scheme and authority of the base URL, without any path prefix.
    pub fn origin(&self) -> &str {
        let after_scheme = self.base_url.find("://").map(|i| i + 3).unwrap_or(0);
        match self.base_url[after_scheme..].find('/') {
            Some(i) => &self.base_url[..after_scheme + i],
            None => &self.base_url,
        }
    }

    /// The generic request primitive. `endpoint` is relative to the base URL.
    ///
    /// Always sends `Content-Type: application/json`, adds a bearer
    /// `Authorization` header when `token` is present, then applies
    /// `options.headers`, replacing any default header of the same name.
    pub fn build_request(&self, endpoint: &str, options: RequestOptions, token: Option<&str>) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        for (name, value) in options.headers {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }
        HttpRequest {
            method: options.method.unwrap_or(HttpMethod::Get),
            url: format!("{}{endpoint}", self.base_url),
            headers,
            body: options.body,
        }
    }

    // ---------------------------------------------------------------------
    // Authentication
    // ---------------------------------------------------------------------

    pub fn build_register(&self, input: &RegisterRequest, token: Option<&str>) -> Result<HttpRequest, ApiError> {
        let options = RequestOptions::json(HttpMethod::Post, input)?;
        Ok(self.build_request("/auth/register", options, token))
    }

    pub fn build_login(&self, input: &LoginRequest, token: Option<&str>) -> Result<HttpRequest, ApiError> {
        let options = RequestOptions::json(HttpMethod::Post, input)?;
        Ok(self.build_request("/auth/login", options, token))
    }

    pub fn build_current_user(&self, token: Option<&str>) -> HttpRequest {
        self.build_request("/auth/me", RequestOptions::method(HttpMethod::Get), token)
    }

    pub fn build_logout(&self, token: Option<&str>) -> HttpRequest {
        self.build_request("/auth/logout", RequestOptions::method(HttpMethod::Post), token)
    }

    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // ---------------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------------

    pub fn build_generate_content(
        &self,
        input: &GenerateContentRequest,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let options = RequestOptions::json(HttpMethod::Post, input)?;
        Ok(self.build_request("/content/generate", options, token))
    }

    pub fn build_content_history(&self, limit: u32, token: Option<&str>) -> HttpRequest {
        self.build_request(
            &format!("/content/history?limit={limit}"),
            RequestOptions::method(HttpMethod::Get),
            token,
        )
    }

    pub fn build_get_content(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.build_request(&content_path(id, ""), RequestOptions::method(HttpMethod::Get), token)
    }

    pub fn build_update_content(
        &self,
        id: &str,
        input: &UpdateContent,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let options = RequestOptions::json(HttpMethod::Put, input)?;
        Ok(self.build_request(&content_path(id, ""), options, token))
    }

    pub fn build_delete_content(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.build_request(&content_path(id, ""), RequestOptions::method(HttpMethod::Delete), token)
    }

    pub fn build_regenerate_content(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.build_request(
            &content_path(id, "/regenerate"),
            RequestOptions::method(HttpMethod::Post),
            token,
        )
    }

    pub fn parse_content(&self, response: HttpResponse) -> Result<ContentRecord, ApiError> {
        parse_json(response)
    }

    pub fn parse_content_history(&self, response: HttpResponse) -> Result<Vec<ContentRecord>, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_content(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // ---------------------------------------------------------------------
    // Health
    // ---------------------------------------------------------------------

    /// `GET {origin}/health`. Plain request: no JSON content type, no token.
    pub fn build_health_check(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/health", self.origin()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_health_check(&self, response: &HttpResponse) -> bool {
        response.is_success()
    }
}

/// `/content/{id}{suffix}` with `id` percent-encoded as one path segment.
fn content_path(id: &str, suffix: &str) -> String {
    let mut path = String::from("/content/");
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            path.push(byte as char);
        } else {
            path.push_str(&format!("%{byte:02X}"));
        }
    }
    path.push_str(suffix);
    path
}

/// Deserialize a 2xx body into `T`, or normalize the failure.
pub fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(error_from_response(&response));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Accept any 2xx and ignore its body (which may be empty, e.g. 204).
pub fn parse_empty(response: HttpResponse) -> Result<(), ApiError> {
    if !response.is_success() {
        return Err(error_from_response(&response));
    }
    Ok(())
}

/// Build the `ApiError::Request` for a non-2xx response.
pub fn error_from_response(response: &HttpResponse) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
    ApiError::Request {
        message,
        status: Some(response.status),
    }
}

/// Extract a human-readable message from a JSON error body.
///
/// Accepts `{"detail": "..."}`, `{"message": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}` used for request validation failures.
fn error_message(body: &serde_json::Value) -> Option<String> {
    for key in ["detail", "message"] {
        match body.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, DifficultyLevel};

    fn client() -> TutorClient {
        TutorClient::new("http://localhost:8000/api/v1")
    }

    #[test]
    fn content_id_is_one_path_segment() {
        let c = client();
        assert_eq!(
            c.build_get_content("a/regenerate", None).url,
            "http://localhost:8000/api/v1/content/a%2Fregenerate"
        );
        assert_eq!(
            c.build_regenerate_content("my id", None).url,
            "http://localhost:8000/api/v1/content/my%20id/regenerate"
        );
        assert_eq!(
            c.build_delete_content("65f1c0de-9a_b.c~", None).url,
            "http://localhost:8000/api/v1/content/65f1c0de-9a_b.c~"
        );
        assert_eq!(c.build_get_content("é", None).url, "http://localhost:8000/api/v1/content/%C3%A9");
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn request_without_token_has_no_authorization() {
        let req = client().build_current_user(None);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/v1/auth/me");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn request_with_token_carries_bearer() {
        let req = client().build_current_user(Some("tok123"));
        assert_eq!(req.header("Authorization"), Some("Bearer tok123"));
    }

    #[test]
    fn caller_headers_override_defaults() {
        let options = RequestOptions::method(HttpMethod::Get)
            .header("content-type", "text/plain")
            .header("X-Trace", "1");
        let req = client().build_request("/auth/me", options, Some("t"));
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.header("x-trace"), Some("1"));
        assert_eq!(
            req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("content-type")).count(),
            1
        );
    }

    #[test]
    fn build_generate_content_body() {
        let input = GenerateContentRequest {
            topic: "Calculus".to_string(),
            difficulty_level: DifficultyLevel::Beginner,
            content_type: ContentType::StudyNotes,
        };
        let req = client().build_generate_content(&input, Some("t")).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/v1/content/generate");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "topic": "Calculus",
                "difficulty_level": "beginner",
                "content_type": "study-notes"
            })
        );
    }

    #[test]
    fn content_paths() {
        let c = client();
        assert_eq!(
            c.build_content_history(DEFAULT_HISTORY_LIMIT, None).url,
            "http://localhost:8000/api/v1/content/history?limit=20"
        );
        assert_eq!(c.build_get_content("abc", None).url, "http://localhost:8000/api/v1/content/abc");
        let del = c.build_delete_content("abc", None);
        assert_eq!(del.method, HttpMethod::Delete);
        assert!(del.body.is_none());
        let regen = c.build_regenerate_content("abc", None);
        assert_eq!(regen.method, HttpMethod::Post);
        assert_eq!(regen.url, "http://localhost:8000/api/v1/content/abc/regenerate");
    }

    #[test]
    fn health_check_targets_origin() {
        let req = client().build_health_check();
        assert_eq!(req.url, "http://localhost:8000/health");
        assert!(req.headers.is_empty());

        let bare = TutorClient::new("https://tutor.example.com/");
        assert_eq!(bare.build_health_check().url, "https://tutor.example.com/health");
    }

    #[test]
    fn detail_field_becomes_message() {
        let err = error_from_response(&response(401, r#"{"detail":"Incorrect email or password"}"#));
        assert_eq!(err.to_string(), "Incorrect email or password");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let err = error_from_response(&response(
            422,
            r#"{"detail":[{"loc":["body","topic"],"msg":"field required"},{"msg":"too short"}]}"#,
        ));
        assert_eq!(err.to_string(), "field required; too short");
    }

    #[test]
    fn unparsable_error_body_falls_back_to_status() {
        let err = error_from_response(&response(502, "<html>Bad Gateway</html>"));
        assert_eq!(err.to_string(), "HTTP error! status: 502");
        let err = error_from_response(&response(500, r#"{"error":"x"}"#));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn malformed_success_body_is_an_error() {
        let err = client().parse_current_user(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn empty_success_body_accepted_for_delete() {
        assert!(client().parse_delete_content(response(204, "")).is_ok());
        let err = client()
            .parse_delete_content(response(404, r#"{"detail":"Content not found"}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Content not found");
    }
}
