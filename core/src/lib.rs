//! Client core for the AI tutoring backend.
//!
//! # Overview
//! Typed request/response records, a sans-IO request builder and response
//! parser, a pluggable transport, and an `ApiService` that ties them to an
//! explicit session token. Form validation and the session-local content
//! history live here too so any front end can share them.
//!
//! # Design
//! - `TutorClient` is stateless: it holds only `base_url`. Each endpoint is
//!   split into `build_*` (produces request) and `parse_*` (consumes
//!   response), so the I/O boundary is explicit and testable.
//! - `ApiService` owns a `Transport` and a `Session`. The token is read from
//!   the session for every request and written only by register, login and
//!   logout.
//! - Every failure except `health_check` surfaces as an `ApiError`; transport
//!   failures and non-2xx statuses share the `Request` variant.
//! - Records are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod logging;
pub mod service;
pub mod session;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{RequestOptions, TutorClient, DEFAULT_HISTORY_LIMIT};
pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use history::{ContentHistory, HistoryEntry};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::ApiService;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    AuthResponse, ContentRecord, ContentStatus, ContentType, DifficultyLevel,
    GenerateContentRequest, LoginRequest, RegisterRequest, UpdateContent, User,
};
pub use validation::{ContentForm, PasswordStrength, RegistrationForm, ValidationErrors};
