use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::bus::EventBus;
use crate::protocol::{self, SUPERVISOR_CONTROL_CHANNEL};
use crate::task::AgentState;

#[derive(Clone)]
struct AppState {
    bus: Arc<dyn EventBus>,
    agents: Arc<Vec<AgentState>>,
    start_time: Instant,
}

#[derive(Deserialize)]
struct MissionRequest {
    goal: String,
}

#[derive(Serialize)]
struct MissionResponse {
    mission_id: Uuid,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime: u64,
    pid: u32,
}

/// Accept a mission goal and announce it on the supervisor's control
/// channel. Synchronous acknowledgment only; completion is asynchronous.
async fn create_mission_handler(
    State(state): State<AppState>,
    Json(request): Json<MissionRequest>,
) -> Result<Json<MissionResponse>, (StatusCode, String)> {
    let mission_id = Uuid::new_v4();
    let message = protocol::mission_created(mission_id, &request.goal);
    state
        .bus
        .publish(SUPERVISOR_CONTROL_CHANNEL, message)
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;
    info!(%mission_id, goal = %request.goal, "mission created");
    Ok(Json(MissionResponse { mission_id }))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        pid: std::process::id(),
    })
}

async fn agents_handler(State(state): State<AppState>) -> Json<Vec<AgentState>> {
    Json(state.agents.as_ref().clone())
}

/// Start the ingress HTTP server. Returns the bound address (useful
/// with port 0).
pub async fn start_server(
    port: u16,
    bus: Arc<dyn EventBus>,
    agents: Vec<AgentState>,
) -> anyhow::Result<SocketAddr> {
    let state = AppState { bus, agents: Arc::new(agents), start_time: Instant::now() };
    let app = Router::new()
        .route("/missions", post(create_mission_handler))
        .route("/health", get(health_handler))
        .route("/agents", get(agents_handler))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            anyhow::anyhow!("swarmd is already running (port {} in use)", port)
        } else {
            anyhow::anyhow!("Failed to bind port {}: {}", port, e)
        }
    })?;
    let local_addr = listener.local_addr()?;
    info!("ingress listening on http://{}", local_addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(local_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;
    use crate::protocol::MessageType;

    #[tokio::test]
    async fn post_missions_publishes_on_the_control_channel() {
        let bus = Arc::new(InProcessBus::new());
        let mut control_sub = bus.subscribe(SUPERVISOR_CONTROL_CHANNEL).await.unwrap();
        let agents = vec![AgentState::new("supervisor-1", "supervisor")];
        let addr = start_server(0, bus.clone(), agents).await.unwrap();

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/missions"))
            .json(&serde_json::json!({"goal": "summarize rust 1.80"}))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        let mission_id: Uuid = body["mission_id"].as_str().unwrap().parse().unwrap();

        let message = control_sub.recv().await.unwrap();
        assert_eq!(message.message_type, MessageType::MissionCreated);
        assert_eq!(message.mission_id, mission_id);
        assert_eq!(message.payload.goal(), "summarize rust 1.80");
    }

    #[tokio::test]
    async fn health_and_agents_endpoints_respond() {
        let bus = Arc::new(InProcessBus::new());
        let agents = vec![
            AgentState::new("supervisor-1", "supervisor"),
            AgentState::new("coder-1", "coder"),
        ];
        let addr = start_server(0, bus, agents).await.unwrap();
        let client = reqwest::Client::new();

        let health: serde_json::Value = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let listed: serde_json::Value = client
            .get(format!("http://{addr}/agents"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 2);
        assert_eq!(listed[0]["role"], "supervisor");
        assert_eq!(listed[0]["status"], "IDLE");
    }

    #[tokio::test]
    async fn mission_on_a_closed_bus_is_unavailable() {
        let bus = Arc::new(InProcessBus::new());
        let addr = start_server(0, bus.clone(), Vec::new()).await.unwrap();
        bus.close().await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/missions"))
            .json(&serde_json::json!({"goal": "g"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }
}
