use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

const DIFFICULTY_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const STATUSES: [&str; 4] = ["pending", "processing", "completed", "failed"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub difficulty_level: String,
    pub content_type: String,
    pub status: String,
    pub generated_content: Option<String>,
    pub request_timestamp: String,
    pub completion_timestamp: Option<String>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GenerateInput {
    pub topic: String,
    pub difficulty_level: String,
    pub content_type: String,
}

#[derive(Deserialize)]
pub struct UpdateInput {
    pub status: Option<String>,
    pub generated_content: Option<String>,
    pub completion_timestamp: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    contents: Vec<Content>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in the backend's `{"detail": ...}` shape.
pub struct Failure(StatusCode, String);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "detail": self.1 }))).into_response()
    }
}

fn not_found() -> Failure {
    Failure(StatusCode::NOT_FOUND, "Content not found".to_string())
}

fn now() -> String {
    // Naive UTC, the way the backend serializes its datetimes.
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/content/generate", post(generate))
        .route("/content/history", get(history))
        .route("/content/{id}", get(get_content).put(update_content).delete(delete_content))
        .route("/content/{id}/regenerate", post(regenerate));
    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "message": "API is running" }))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(store: &Store, headers: &HeaderMap) -> Result<User, Failure> {
    let unauthorized = || Failure(StatusCode::UNAUTHORIZED, "Could not validate credentials".to_string());
    let token = bearer(headers).ok_or_else(unauthorized)?;
    let email = store.sessions.get(token).ok_or_else(unauthorized)?;
    store
        .accounts
        .get(email)
        .map(|a| a.user.clone())
        .ok_or_else(|| Failure(StatusCode::UNAUTHORIZED, "User not found".to_string()))
}

fn owned<'a>(store: &'a mut Store, id: &str, user: &User) -> Result<&'a mut Content, Failure> {
    let content = store.contents.iter_mut().find(|c| c.id == id).ok_or_else(not_found)?;
    if content.user_id != user.id {
        return Err(Failure(StatusCode::FORBIDDEN, "Access denied to this content".to_string()));
    }
    Ok(content)
}

fn issue_token(store: &mut Store, user: User) -> Token {
    let access_token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(access_token.clone(), user.email.clone());
    Token {
        access_token,
        token_type: "bearer".to_string(),
        user,
    }
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<Token>), Failure> {
    if input.password.len() < 8 {
        return Err(Failure(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        ));
    }
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.email) {
        return Err(Failure(StatusCode::BAD_REQUEST, "Email already registered".to_string()));
    }
    let user = User {
        id: Uuid::new_v4().simple().to_string(),
        email: input.email.clone(),
        first_name: input.first_name,
        last_name: input.last_name,
        created_at: now(),
        is_active: true,
    };
    store.accounts.insert(
        input.email,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok((StatusCode::CREATED, Json(issue_token(&mut store, user))))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Result<Json<Token>, Failure> {
    let mut store = db.write().await;
    let user = match store.accounts.get(&input.email) {
        Some(account) if account.password == input.password => account.user.clone(),
        _ => {
            return Err(Failure(
                StatusCode::UNAUTHORIZED,
                "Incorrect email or password".to_string(),
            ))
        }
    };
    Ok(Json(issue_token(&mut store, user)))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    let store = db.read().await;
    authenticate(&store, &headers).map(Json)
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<Json<serde_json::Value>, Failure> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    if let Some(token) = bearer(&headers) {
        store.sessions.remove(token);
    }
    Ok(Json(serde_json::json!({ "message": "Successfully logged out" })))
}

async fn generate(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GenerateInput>,
) -> Result<(StatusCode, Json<Content>), Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    if input.topic.is_empty() || input.topic.chars().count() > 200 {
        return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Invalid topic".to_string()));
    }
    if !DIFFICULTY_LEVELS.contains(&input.difficulty_level.as_str()) {
        return Err(Failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid difficulty level".to_string(),
        ));
    }
    let content = Content {
        id: Uuid::new_v4().simple().to_string(),
        user_id: user.id,
        topic: input.topic,
        difficulty_level: input.difficulty_level,
        content_type: input.content_type,
        status: "pending".to_string(),
        generated_content: None,
        request_timestamp: now(),
        completion_timestamp: None,
        error_message: None,
        metadata: serde_json::json!({}),
    };
    store.contents.push(content.clone());
    Ok((StatusCode::CREATED, Json(content)))
}

async fn history(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Content>>, Failure> {
    let store = db.read().await;
    let user = authenticate(&store, &headers)?;
    let items = store
        .contents
        .iter()
        .rev()
        .filter(|c| c.user_id == user.id)
        .take(query.limit)
        .cloned()
        .collect();
    Ok(Json(items))
}

async fn get_content(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Content>, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    owned(&mut store, &id, &user).map(|c| Json(c.clone()))
}

async fn update_content(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<Content>, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    if let Some(status) = &input.status {
        if !STATUSES.contains(&status.as_str()) {
            return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Invalid status".to_string()));
        }
    }
    let content = owned(&mut store, &id, &user)?;
    if let Some(status) = input.status {
        content.status = status;
    }
    if let Some(text) = input.generated_content {
        content.generated_content = Some(text);
    }
    if let Some(ts) = input.completion_timestamp {
        content.completion_timestamp = Some(ts);
    }
    if let Some(msg) = input.error_message {
        content.error_message = Some(msg);
    }
    if let Some(metadata) = input.metadata {
        content.metadata = metadata;
    }
    Ok(Json(content.clone()))
}

async fn delete_content(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    owned(&mut store, &id, &user)?;
    store.contents.retain(|c| c.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn regenerate(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Content>, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    let content = owned(&mut store, &id, &user)?;
    content.status = "pending".to_string();
    content.generated_content = None;
    content.completion_timestamp = None;
    content.error_message = None;
    Ok(Json(content.clone()))
}
