use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::task::{JsonMap, Task};

// ── Well-known channel names (wire contract) ──

pub const SUPERVISOR_CONTROL_CHANNEL: &str = "swarm:supervisor:control";
pub const TASK_RESULTS_CHANNEL: &str = "swarm:tasks:results";
pub const RESEARCHER_TASKS_CHANNEL: &str = "swarm:workers:researcher:tasks";
pub const CODER_TASKS_CHANNEL: &str = "swarm:workers:coder:tasks";

/// Message type tag. Determines the expected payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    MissionCreated,
    TaskCreated,
    TaskAssigned,
    TaskResult,
    Heartbeat,
    Control,
}

/// Message payload, keyed by the envelope's `type`. `Other` is the
/// forward-compatibility fallback: any object that is not a known shape
/// decodes into it instead of failing the whole envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Mission { goal: String },
    Task { task: Task },
    Other(JsonMap),
}

impl MessagePayload {
    /// Borrow the embedded task, or a validation error when the payload
    /// does not carry one (including a malformed task object, which the
    /// untagged decode demotes to `Other`).
    pub fn task(&self) -> Result<&Task, ValidationError> {
        match self {
            Self::Task { task } => Ok(task),
            _ => Err(ValidationError::NotATask),
        }
    }

    /// The mission goal, or empty when absent.
    pub fn goal(&self) -> &str {
        match self {
            Self::Mission { goal } => goal,
            Self::Other(map) => map.get("goal").and_then(|v| v.as_str()).unwrap_or(""),
            Self::Task { .. } => "",
        }
    }

    /// Flatten into a plain JSON object, the shape the blackboard stores
    /// as a task result.
    pub fn to_map(&self) -> JsonMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }
}

/// The unit of inter-agent communication. Immutable once constructed;
/// never mutated after being handed to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmMessage {
    pub id: Uuid,
    pub mission_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent: Option<String>,
    /// Informational routing hint; actual routing is by channel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent: Option<String>,
    pub channel: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: MessagePayload,
    pub created_at: DateTime<Utc>,
    /// Id of the message this one responds to. A TASK_RESULT's
    /// correlation_id equals the triggering TASK_CREATED message's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl SwarmMessage {
    pub fn new(
        mission_id: Uuid,
        channel: &str,
        message_type: MessageType,
        payload: MessagePayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mission_id,
            task_id: None,
            source_agent: None,
            target_agent: None,
            channel: channel.to_string(),
            message_type,
            payload,
            created_at: Utc::now(),
            correlation_id: None,
        }
    }

    pub fn about_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn from_agent(mut self, agent_id: &str) -> Self {
        self.source_agent = Some(agent_id.to_string());
        self
    }

    pub fn to_agent(mut self, agent_id: &str) -> Self {
        self.target_agent = Some(agent_id.to_string());
        self
    }

    pub fn in_reply_to(mut self, message_id: Uuid) -> Self {
        self.correlation_id = Some(message_id);
        self
    }
}

// ── Helper constructors for the concrete message shapes ──

/// MISSION_CREATED on the supervisor control channel.
pub fn mission_created(mission_id: Uuid, goal: &str) -> SwarmMessage {
    SwarmMessage::new(
        mission_id,
        SUPERVISOR_CONTROL_CHANNEL,
        MessageType::MissionCreated,
        MessagePayload::Mission { goal: goal.to_string() },
    )
    .to_agent("supervisor")
}

/// TASK_CREATED carrying a copy of the task, routed to `channel`.
pub fn task_created(task: &Task, channel: &str, source_agent: &str) -> SwarmMessage {
    let mut message = SwarmMessage::new(
        task.mission_id,
        channel,
        MessageType::TaskCreated,
        MessagePayload::Task { task: task.clone() },
    )
    .about_task(task.id)
    .from_agent(source_agent);
    if let Some(role) = &task.assigned_agent {
        message = message.to_agent(role);
    }
    message
}

/// TASK_RESULT on the shared results channel. The payload is the task's
/// result when present, otherwise `{"error": ...}`; `correlation_id` is
/// the id of the TASK_CREATED message that triggered the work.
pub fn task_result(task: &Task, source_agent: &str, correlation_id: Uuid) -> SwarmMessage {
    let payload = match &task.result {
        Some(result) => MessagePayload::Other(result.clone()),
        None => {
            let mut map = JsonMap::new();
            map.insert(
                "error".to_string(),
                serde_json::Value::String(task.error.clone().unwrap_or_default()),
            );
            MessagePayload::Other(map)
        }
    };
    SwarmMessage::new(task.mission_id, TASK_RESULTS_CHANNEL, MessageType::TaskResult, payload)
        .about_task(task.id)
        .from_agent(source_agent)
        .to_agent("supervisor")
        .in_reply_to(correlation_id)
}
