use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open JSON-object payload carried by tasks and messages.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Task lifecycle status. `Pending` and `Running` are transient; the
/// other four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }
}

/// The unit of work. Owned by the blackboard once created; workers
/// receive a copy inside a message payload and report status changes
/// back through TASK_RESULT messages, never by writing the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub mission_id: Uuid,
    /// Task that spawned this one. Id-based lookup only, never a live
    /// reference; creation order keeps the tree acyclic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub kind: String,
    pub payload: JsonMap,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task. `mission_id` and `kind` are the required
    /// fields; everything else starts empty.
    pub fn new(mission_id: Uuid, kind: &str, payload: JsonMap) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            mission_id,
            parent_id: None,
            kind: kind.to_string(),
            payload,
            status: TaskStatus::Pending,
            assigned_agent: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Link this task under a parent.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Assign a worker role. The supervisor routes TASK_CREATED
    /// messages by this role name.
    pub fn assigned_to(mut self, role: &str) -> Self {
        self.assigned_agent = Some(role.to_string());
        self
    }

    /// The mission goal carried in the task payload, if any.
    pub fn goal(&self) -> &str {
        self.payload.get("goal").and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.touch();
    }

    pub fn complete(&mut self, result: JsonMap) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.touch();
    }

    pub fn fail(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Agent lifecycle status for health bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentLifecycleStatus {
    Idle,
    Busy,
    Offline,
}

/// Lifecycle/health record for a registered agent. Not consumed by the
/// decomposition logic; surfaced over the ingress for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: String,
    pub role: String,
    pub status: AgentLifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<Uuid>,
    pub last_seen_at: DateTime<Utc>,
}

impl AgentState {
    pub fn new(agent_id: &str, role: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            role: role.to_string(),
            status: AgentLifecycleStatus::Idle,
            current_task_id: None,
            last_seen_at: Utc::now(),
        }
    }
}
