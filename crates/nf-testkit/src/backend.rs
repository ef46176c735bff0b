//! In-process mock of the feed API.
//!
//! Serves the same routes as the real backend with in-memory state and JWT
//! bearer tokens, plus knobs for the response shapes and failures the client
//! has to cope with.

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use nf_types::api::{CreatePostRequest, Credentials};
use nf_types::models::MAX_POST_CHARS;

const JWT_SECRET: &str = "nf-testkit-secret";

/// How `/feed` (and `POST /posts`) lay out their records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    /// `{page, posts: [{id, userid, content, createdat}]}`
    Envelope,
    /// `[{id, userId, content, createdAt}]`
    BareArray,
    /// `[{id: "..", user_id: "..", content, created_at}]` with string numbers
    SnakeCase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

struct UserRow {
    id: i64,
    username: String,
    password: String,
}

#[derive(Clone)]
struct PostRow {
    id: i64,
    author_id: i64,
    content: String,
    created_at: String,
}

struct BackendState {
    users: Vec<UserRow>,
    follows: HashSet<(i64, i64)>,
    posts: Vec<PostRow>,
    shape: FeedShape,
    feed_failures: VecDeque<(StatusCode, Value)>,
    feed_requests: usize,
}

type Shared = Arc<Mutex<BackendState>>;
type Failure = (StatusCode, Json<Value>);

fn fail(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    pub base_url: String,
    state: Shared,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> anyhow::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            users: Vec::new(),
            follows: HashSet::new(),
            posts: Vec::new(),
            shape: FeedShape::Envelope,
            feed_failures: VecDeque::new(),
            feed_requests: 0,
        }));

        let public_routes = Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(state.clone());

        let protected_routes = Router::new()
            .route("/posts", post(create_post))
            .route("/follow/{user_id}", post(follow).delete(unfollow))
            .route("/feed", get(feed))
            .layer(middleware::from_fn(require_auth))
            .with_state(state.clone());

        let app = Router::new()
            .merge(public_routes)
            .merge(protected_routes)
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        info!("Mock feed backend listening on {}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        })
    }

    pub fn set_feed_shape(&self, shape: FeedShape) {
        self.state.lock().unwrap().shape = shape;
    }

    /// Make the next `/feed` request answer `status` with `body`.
    pub fn fail_next_feed(&self, status: StatusCode, body: Value) {
        self.state
            .lock()
            .unwrap()
            .feed_failures
            .push_back((status, body));
    }

    pub fn feed_requests(&self) -> usize {
        self.state.lock().unwrap().feed_requests
    }

    /// Create a user directly, bypassing `/register`. Returns its id.
    pub fn seed_user(&self, username: &str, password: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        insert_user(&mut state, username, password)
    }

    pub fn seed_follow(&self, follower: i64, followee: i64) {
        self.state.lock().unwrap().follows.insert((follower, followee));
    }

    /// Create a post directly with an explicit timestamp. Returns its id.
    pub fn seed_post(&self, author_id: i64, content: &str, created_at: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        insert_post(&mut state, author_id, content, created_at.to_string())
    }

    pub fn is_following(&self, follower: i64, followee: i64) -> bool {
        self.state
            .lock()
            .unwrap()
            .follows
            .contains(&(follower, followee))
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn insert_user(state: &mut BackendState, username: &str, password: &str) -> i64 {
    let id = state.users.len() as i64 + 1;
    state.users.push(UserRow {
        id,
        username: username.to_string(),
        password: password.to_string(),
    });
    id
}

fn insert_post(state: &mut BackendState, author_id: i64, content: &str, created_at: String) -> i64 {
    let id = state.posts.len() as i64 + 1;
    state.posts.push(PostRow {
        id,
        author_id,
        content: content.to_string(),
        created_at,
    });
    id
}

fn render_post(shape: FeedShape, p: &PostRow) -> Value {
    match shape {
        FeedShape::Envelope => json!({
            "id": p.id, "userid": p.author_id, "content": p.content, "createdat": p.created_at
        }),
        FeedShape::BareArray => json!({
            "id": p.id, "userId": p.author_id, "content": p.content, "createdAt": p.created_at
        }),
        FeedShape::SnakeCase => json!({
            "id": p.id.to_string(), "user_id": p.author_id.to_string(),
            "content": p.content, "created_at": p.created_at
        }),
    }
}

fn create_token(user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )?;

    Ok(token)
}

async fn require_auth(mut req: Request, next: Next) -> Result<Response, Failure> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| fail(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

async fn register(
    State(state): State<Shared>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, Failure> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "username and password are required"));
    }

    let mut state = state.lock().unwrap();
    if state.users.iter().any(|u| u.username == req.username) {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({ "error": "Username already exists" })),
        ));
    }

    let id = insert_user(&mut state, &req.username, &req.password);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "username": req.username })),
    ))
}

async fn login(
    State(state): State<Shared>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, Failure> {
    let user_id = {
        let state = state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.username == req.username && u.password == req.password)
            .map(|u| u.id)
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid credentials"))?
    };

    let token = create_token(user_id, &req.username)
        .map_err(|_| fail(StatusCode::INTERNAL_SERVER_ERROR, "Token signing failed"))?;

    Ok(Json(json!({ "token": token })))
}

async fn create_post(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, Failure> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Content is required"));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(fail(StatusCode::BAD_REQUEST, "Content exceeds 200 characters"));
    }

    let mut state = state.lock().unwrap();
    let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let id = insert_post(&mut state, claims.sub, content, created_at);
    let row = state.posts[(id - 1) as usize].clone();

    Ok((StatusCode::CREATED, Json(render_post(state.shape, &row))))
}

async fn follow(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, Failure> {
    if user_id == claims.sub {
        return Err(fail(StatusCode::BAD_REQUEST, "Cannot follow yourself"));
    }

    let mut state = state.lock().unwrap();
    if !state.users.iter().any(|u| u.id == user_id) {
        return Err(fail(StatusCode::NOT_FOUND, "User not found"));
    }
    state.follows.insert((claims.sub, user_id));

    Ok(Json(json!({ "message": format!("Followed user {}", user_id) })))
}

async fn unfollow(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, Failure> {
    let mut state = state.lock().unwrap();
    state.follows.remove(&(claims.sub, user_id));

    Ok(Json(json!({ "message": format!("Unfollowed user {}", user_id) })))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// Posts by followed users, newest first.
async fn feed(
    State(state): State<Shared>,
    Query(query): Query<FeedQuery>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.feed_requests += 1;

    if let Some((status, body)) = state.feed_failures.pop_front() {
        return (status, Json(body)).into_response();
    }

    let mut posts: Vec<&PostRow> = state
        .posts
        .iter()
        .filter(|p| state.follows.contains(&(claims.sub, p.author_id)))
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100) as usize;
    let records: Vec<Value> = posts
        .into_iter()
        .skip((page as usize - 1) * limit)
        .take(limit)
        .map(|p| render_post(state.shape, p))
        .collect();

    match state.shape {
        FeedShape::Envelope => Json(json!({ "page": page, "posts": records })).into_response(),
        FeedShape::BareArray | FeedShape::SnakeCase => Json(Value::Array(records)).into_response(),
    }
}
