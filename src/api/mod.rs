//! HTTP API for the agent.
//!
//! Routes:
//! - `POST /api/agent` - submit a query, optionally continuing a conversation
//! - `DELETE /api/conversations/:id` - remove a conversation
//! - `GET /health` - service and model-key status

pub mod types;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentState};
use crate::config::Config;
use crate::store::{ConversationStore, FileCheckpointer, InMemoryConversationStore, StoreError};

use types::{AgentResponse, DeleteResponse, HealthResponse, ToolCallView, UserQuery};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agent: Arc<Agent>,
    pub store: Arc<dyn ConversationStore>,
    pub checkpointer: Option<Arc<FileCheckpointer>>,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let agent = Arc::new(Agent::new(&config));
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());
        let checkpointer = match &config.checkpoint_dir {
            Some(dir) => Some(Arc::new(FileCheckpointer::new(dir.clone())?)),
            None => None,
        };
        Ok(Self { config: Arc::new(config), agent, store, checkpointer })
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agent", post(query_agent))
        .route("/api/conversations/:id", delete(delete_conversation))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// API error that renders as a JSON body.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => {
                ApiError::NotFound(format!("Conversation {} not found", id))
            }
        }
    }
}

async fn query_agent(
    State(state): State<AppState>,
    Json(request): Json<UserQuery>,
) -> Json<AgentResponse> {
    let conversation_id = request
        .conversation_id
        .unwrap_or_else(|| format!("conv_{}", Uuid::new_v4()));

    // At-most-one in-flight turn per conversation id: hold the turn lock
    // across read, loop, and write-back.
    let lock = state.store.turn_lock(&conversation_id).await;
    let _guard = lock.lock().await;

    // Read-through: memory first, then the checkpoint store.
    let prior = match state.store.get(&conversation_id).await {
        Some(found) => Some(found),
        None => state
            .checkpointer
            .as_ref()
            .and_then(|c| c.load(&conversation_id)),
    };

    let mut agent_state = match prior {
        Some(existing) => existing.next_turn(),
        None => AgentState::new(&conversation_id),
    };
    agent_state.push_user(&request.query);

    state.agent.run_turn(&mut agent_state).await;

    // Prefer the loop's final response; fall back to the last assistant
    // message when the ceiling ended the turn with an empty one.
    let response = agent_state
        .current_response
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| agent_state.last_assistant_message().map(str::to_string))
        .unwrap_or_else(|| {
            "I processed your request but couldn't generate a response.".to_string()
        });

    let tool_calls: Vec<ToolCallView> =
        agent_state.resolved_tool_calls().map(ToolCallView::from).collect();

    state.store.put(agent_state.clone()).await;
    if let Some(checkpointer) = &state.checkpointer {
        if let Err(e) = checkpointer.save(&agent_state) {
            warn!(conversation = %conversation_id, "checkpoint write failed: {e:#}");
        }
    }

    Json(AgentResponse { response, conversation_id, tool_calls })
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete(&id).await?;
    if let Some(checkpointer) = &state.checkpointer {
        checkpointer.remove(&id);
    }

    Ok(Json(DeleteResponse {
        status: "success".to_string(),
        message: format!("Conversation {} deleted", id),
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let api_key_configured = state.config.api_key.is_some();
    Json(HealthResponse {
        status: if api_key_configured { "ok" } else { "warning" }.to_string(),
        api_key_configured,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
