use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::Agent;
use crate::blackboard::Blackboard;
use crate::bus::EventBus;
use crate::protocol::{
    self, CODER_TASKS_CHANNEL, MessageType, RESEARCHER_TASKS_CHANNEL, SUPERVISOR_CONTROL_CHANNEL,
    SwarmMessage, TASK_RESULTS_CHANNEL,
};
use crate::task::{JsonMap, Task};

/// What the supervisor decided to do about an inbound message.
#[derive(Debug)]
pub enum SupervisorThought {
    /// Decompose a new mission into a root task plus one child task per
    /// worker role.
    Decompose { root: Task, children: Vec<Task> },
    /// Apply a worker's result to the authoritative task copy.
    ApplyResult { task_id: Uuid, result: JsonMap },
    Ignore,
}

/// Mission intake and result aggregation. Owns the authoritative task
/// state through the blackboard; workers only ever see copies.
pub struct SupervisorAgent {
    agent_id: String,
    bus: Arc<dyn EventBus>,
    blackboard: Arc<dyn Blackboard>,
}

impl SupervisorAgent {
    pub fn new(agent_id: &str, bus: Arc<dyn EventBus>, blackboard: Arc<dyn Blackboard>) -> Self {
        Self { agent_id: agent_id.to_string(), bus, blackboard }
    }

    fn decompose(&self, mission_id: Uuid, goal: &str) -> SupervisorThought {
        let mut payload = JsonMap::new();
        payload.insert("goal".to_string(), serde_json::Value::String(goal.to_string()));

        let root = Task::new(mission_id, "mission_root", payload.clone());
        // Children in a fixed order: research before the plan. Workers
        // still execute them concurrently.
        let research = Task::new(mission_id, "research", payload.clone())
            .with_parent(root.id)
            .assigned_to("researcher");
        let plan = Task::new(mission_id, "implementation_plan", payload)
            .with_parent(root.id)
            .assigned_to("coder");
        SupervisorThought::Decompose { root, children: vec![research, plan] }
    }
}

/// Channel a task routes to, by assigned role. Anything unrecognized
/// goes to the supervisor's own control channel.
fn route_for(task: &Task) -> &'static str {
    match task.assigned_agent.as_deref() {
        Some("researcher") => RESEARCHER_TASKS_CHANNEL,
        Some("coder") => CODER_TASKS_CHANNEL,
        _ => SUPERVISOR_CONTROL_CHANNEL,
    }
}

#[async_trait]
impl Agent for SupervisorAgent {
    type Thought = SupervisorThought;

    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn role(&self) -> &str {
        "supervisor"
    }

    fn input_channels(&self) -> Vec<&'static str> {
        vec![SUPERVISOR_CONTROL_CHANNEL, TASK_RESULTS_CHANNEL]
    }

    fn interpret(&self, message: &SwarmMessage) -> SupervisorThought {
        match message.message_type {
            MessageType::MissionCreated => {
                self.decompose(message.mission_id, message.payload.goal())
            }
            MessageType::TaskResult => match message.task_id {
                Some(task_id) => SupervisorThought::ApplyResult {
                    task_id,
                    result: message.payload.to_map(),
                },
                None => SupervisorThought::Ignore,
            },
            _ => SupervisorThought::Ignore,
        }
    }

    async fn act(&self, _message: &SwarmMessage, thought: SupervisorThought) -> anyhow::Result<()> {
        match thought {
            SupervisorThought::Decompose { root, children } => {
                // Persist every task before announcing any work.
                let mission_id = root.mission_id;
                self.blackboard.create_task(root).await?;
                for child in &children {
                    self.blackboard.create_task(child.clone()).await?;
                }
                for child in &children {
                    let channel = route_for(child);
                    let message = protocol::task_created(child, channel, &self.agent_id);
                    self.bus.publish(channel, message).await?;
                }
                info!(
                    agent_id = %self.agent_id,
                    %mission_id,
                    tasks = children.len() + 1,
                    "mission decomposed"
                );
            }
            SupervisorThought::ApplyResult { task_id, result } => {
                let Some(mut task) = self.blackboard.get_task(task_id).await else {
                    // Stale or duplicate result; never resurrect unknown
                    // tasks.
                    info!(agent_id = %self.agent_id, %task_id, "result for unknown task ignored");
                    return Ok(());
                };
                if task.status.is_terminal() {
                    // Last-write-wins: a duplicate result overwrites the
                    // settled task, but leave a trace of it.
                    debug!(agent_id = %self.agent_id, %task_id, "result for settled task");
                }
                // Applied as a completion even when the payload encodes a
                // worker error; failure rides inside the result payload.
                task.complete(result);
                self.blackboard.update_task(task.clone()).await?;
                info!(
                    agent_id = %self.agent_id,
                    task_id = %task.id,
                    mission_id = %task.mission_id,
                    "task completed"
                );
            }
            SupervisorThought::Ignore => {}
        }
        Ok(())
    }
}
