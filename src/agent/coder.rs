use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::Agent;
use crate::ai::LlmClient;
use crate::bus::EventBus;
use crate::errors::ProviderError;
use crate::protocol::{self, CODER_TASKS_CHANNEL, MessageType, SwarmMessage, TASK_RESULTS_CHANNEL};
use crate::task::{JsonMap, Task};

/// Worker for `implementation_plan` tasks: drafts a step-by-step plan
/// for the mission goal. LLM-only, no search dependency.
pub struct CoderAgent {
    agent_id: String,
    bus: Arc<dyn EventBus>,
    llm: Arc<dyn LlmClient>,
}

impl CoderAgent {
    pub fn new(agent_id: &str, bus: Arc<dyn EventBus>, llm: Arc<dyn LlmClient>) -> Self {
        Self { agent_id: agent_id.to_string(), bus, llm }
    }

    async fn draft_plan(&self, task: &Task) -> Result<JsonMap, ProviderError> {
        let plan = self.llm.generate(&build_plan_prompt(task.goal())).await?;
        let mut payload = JsonMap::new();
        payload.insert("plan".to_string(), serde_json::Value::String(plan));
        Ok(payload)
    }
}

#[async_trait]
impl Agent for CoderAgent {
    type Thought = Option<Task>;

    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn role(&self) -> &str {
        "coder"
    }

    fn input_channels(&self) -> Vec<&'static str> {
        vec![CODER_TASKS_CHANNEL]
    }

    fn interpret(&self, message: &SwarmMessage) -> Option<Task> {
        if message.message_type != MessageType::TaskCreated {
            return None;
        }
        let task = match message.payload.task() {
            Ok(task) => task,
            Err(error) => {
                warn!(agent_id = %self.agent_id, message_id = %message.id, %error, "invalid task message");
                return None;
            }
        };
        if task.kind != "implementation_plan" {
            warn!(
                agent_id = %self.agent_id,
                task_id = %task.id,
                task_kind = %task.kind,
                "unexpected task kind"
            );
            return None;
        }
        Some(task.clone())
    }

    async fn act(&self, message: &SwarmMessage, thought: Option<Task>) -> anyhow::Result<()> {
        let Some(mut task) = thought else {
            return Ok(());
        };
        task.start();
        info!(agent_id = %self.agent_id, task_id = %task.id, mission_id = %task.mission_id, "task started");

        match self.draft_plan(&task).await {
            Ok(result) => {
                task.complete(result);
                info!(agent_id = %self.agent_id, task_id = %task.id, mission_id = %task.mission_id, "task completed");
            }
            Err(err) => {
                task.fail(err.to_string());
                error!(
                    agent_id = %self.agent_id,
                    task_id = %task.id,
                    mission_id = %task.mission_id,
                    error = %err,
                    "task failed"
                );
            }
        }

        let result_message = protocol::task_result(&task, &self.agent_id, message.id);
        self.bus.publish(TASK_RESULTS_CHANNEL, result_message).await?;
        Ok(())
    }
}

fn build_plan_prompt(goal: &str) -> String {
    format!(
        "Draft a concrete, step-by-step implementation plan for the goal \
         below. Number the steps, keep each one actionable, and note the \
         main risks at the end.\n\n\
         Goal: {goal}\n\n\
         Return only the plan."
    )
}
