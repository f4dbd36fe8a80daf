//! The API service: `TutorClient` + `Transport` + `Session`.
//!
//! # Design
//! `ApiService` is the single point of contact for callers. Each method
//! reads the session token, builds the request, runs it through the
//! transport and parses the response. Failures of any kind are logged at
//! `error` level before they are returned. `health_check` is the exception:
//! it is a liveness probe and reports `false` instead of failing.
//!
//! There is no retry, deduplication or cancellation. Two concurrent calls
//! are two independent backend requests.

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::client::{parse_json, RequestOptions, TutorClient, DEFAULT_HISTORY_LIMIT};
use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AuthResponse, ContentRecord, GenerateContentRequest, LoginRequest, RegisterRequest,
    UpdateContent, User,
};
use crate::validation::{validate_generate_request, validate_register_request};

pub struct ApiService<T> {
    client: TutorClient,
    transport: T,
    session: Session,
}

impl ApiService<UreqTransport> {
    /// Service talking to `config.base_url` over `ureq`.
    pub fn from_config(config: &Config, session: Session) -> Self {
        Self::new(TutorClient::new(&config.base_url), UreqTransport::new(), session)
    }
}

impl<T: Transport> ApiService<T> {
    pub fn new(client: TutorClient, transport: T, session: Session) -> Self {
        Self {
            client,
            transport,
            session,
        }
    }

    pub fn client(&self) -> &TutorClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Generic request primitive: `endpoint` is relative to the base URL and
    /// the 2xx body is deserialized into `R`.
    pub fn request<R: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<R, ApiError> {
        self.call(endpoint, |token| {
            let request = self.client.build_request(endpoint, options, token);
            parse_json(self.send(request)?)
        })
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "API request");
        self.transport
            .execute(request)
            .map_err(|e| ApiError::transport(e.0))
    }

    /// Read the token, run `f` with it, and log any failure.
    fn call<R>(
        &self,
        endpoint: &str,
        f: impl FnOnce(Option<&str>) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let result = self.session.token().and_then(|token| f(token.as_deref()));
        logged(endpoint, result)
    }

    // ---------------------------------------------------------------------
    // Authentication
    // ---------------------------------------------------------------------

    /// Create an account. The returned token becomes the session token.
    pub fn register(&self, input: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.call("/auth/register", |token| {
            validate_register_request(input)?;
            let request = self.client.build_register(input, token)?;
            let auth = self.client.parse_auth(self.send(request)?)?;
            self.session.set_token(&auth.access_token)?;
            info!(user_id = %auth.user.id, "registered");
            Ok(auth)
        })
    }

    /// Log in. The returned token becomes the session token.
    pub fn login(&self, input: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.call("/auth/login", |token| {
            let request = self.client.build_login(input, token)?;
            let auth = self.client.parse_auth(self.send(request)?)?;
            self.session.set_token(&auth.access_token)?;
            info!(user_id = %auth.user.id, "logged in");
            Ok(auth)
        })
    }

    pub fn get_current_user(&self) -> Result<User, ApiError> {
        self.call("/auth/me", |token| {
            let request = self.client.build_current_user(token);
            self.client.parse_current_user(self.send(request)?)
        })
    }

    /// Invalidate the session on the server. The local token is cleared
    /// whatever the server call returns; the server's outcome is still
    /// reported.
    pub fn logout(&self) -> Result<(), ApiError> {
        let outcome = self.call("/auth/logout", |token| {
            let request = self.client.build_logout(token);
            self.client.parse_logout(self.send(request)?)
        });
        let cleared = logged("/auth/logout", self.session.clear());
        if cleared.is_ok() {
            info!("session token cleared");
        }
        cleared.and(outcome)
    }

    // ---------------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------------

    /// Submit a generation request. The record usually comes back `pending`.
    pub fn generate_content(&self, input: &GenerateContentRequest) -> Result<ContentRecord, ApiError> {
        self.call("/content/generate", |token| {
            validate_generate_request(input)?;
            let request = self.client.build_generate_content(input, token)?;
            let record = self.client.parse_content(self.send(request)?)?;
            info!(id = %record.id, status = %record.status, "content requested");
            Ok(record)
        })
    }

    /// Most recent records of the current user; `None` asks for 20.
    pub fn get_content_history(&self, limit: Option<u32>) -> Result<Vec<ContentRecord>, ApiError> {
        self.call("/content/history", |token| {
            let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
            let request = self.client.build_content_history(limit, token);
            self.client.parse_content_history(self.send(request)?)
        })
    }

    pub fn get_content_by_id(&self, id: &str) -> Result<ContentRecord, ApiError> {
        self.call("/content/{id}", |token| {
            let request = self.client.build_get_content(id, token);
            self.client.parse_content(self.send(request)?)
        })
    }

    pub fn update_content(&self, id: &str, input: &UpdateContent) -> Result<ContentRecord, ApiError> {
        self.call("/content/{id}", |token| {
            let request = self.client.build_update_content(id, input, token)?;
            self.client.parse_content(self.send(request)?)
        })
    }

    pub fn delete_content(&self, id: &str) -> Result<(), ApiError> {
        self.call("/content/{id}", |token| {
            let request = self.client.build_delete_content(id, token);
            self.client.parse_delete_content(self.send(request)?)
        })
    }

    pub fn regenerate_content(&self, id: &str) -> Result<ContentRecord, ApiError> {
        self.call("/content/{id}/regenerate", |token| {
            let request = self.client.build_regenerate_content(id, token);
            self.client.parse_content(self.send(request)?)
        })
    }

    // ---------------------------------------------------------------------
    // Health
    // ---------------------------------------------------------------------

    /// `true` only for a 2xx from `{origin}/health`. Never fails.
    pub fn health_check(&self) -> bool {
        match self.transport.execute(self.client.build_health_check()) {
            Ok(response) => self.client.parse_health_check(&response),
            Err(e) => {
                warn!(error = %e, "health check failed");
                false
            }
        }
    }
}

fn logged<R>(endpoint: &str, result: Result<R, ApiError>) -> Result<R, ApiError> {
    if let Err(e) = &result {
        error!(endpoint, status = ?e.status(), error = %e, "API request failed");
    }
    result
}
