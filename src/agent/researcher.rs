use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::Agent;
use crate::ai::LlmClient;
use crate::bus::EventBus;
use crate::errors::ProviderError;
use crate::protocol::{
    self, MessageType, RESEARCHER_TASKS_CHANNEL, SwarmMessage, TASK_RESULTS_CHANNEL,
};
use crate::search::{SearchClient, SearchResult};
use crate::task::{JsonMap, Task};

const MAX_SEARCH_RESULTS: usize = 5;
/// Source content is truncated before it lands in the result payload.
const SOURCE_PAYLOAD_CHARS: usize = 500;
/// Longer excerpt allowed inside the synthesis prompt.
const SOURCE_PROMPT_CHARS: usize = 800;

/// Worker for `research` tasks: derive a search query from the goal,
/// search the web, synthesize a summary from the hits.
pub struct ResearcherAgent {
    agent_id: String,
    bus: Arc<dyn EventBus>,
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
}

impl ResearcherAgent {
    pub fn new(
        agent_id: &str,
        bus: Arc<dyn EventBus>,
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchClient>,
    ) -> Self {
        Self { agent_id: agent_id.to_string(), bus, llm, search }
    }

    async fn research(&self, task: &Task) -> Result<JsonMap, ProviderError> {
        let goal = task.goal();
        let query = self.generate_search_query(goal).await?;
        let results = self.search.search(&query, MAX_SEARCH_RESULTS).await?;
        let summary = self.llm.generate(&build_synthesis_prompt(goal, &results)).await?;

        let sources: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "title": r.title,
                    "url": r.url,
                    "content": truncate(&r.content, SOURCE_PAYLOAD_CHARS),
                })
            })
            .collect();
        let mut payload = JsonMap::new();
        payload.insert("search_query".to_string(), serde_json::Value::String(query));
        payload.insert("sources".to_string(), serde_json::Value::Array(sources));
        payload.insert("summary".to_string(), serde_json::Value::String(summary));
        Ok(payload)
    }

    async fn generate_search_query(&self, goal: &str) -> Result<String, ProviderError> {
        let raw = self.llm.generate(&build_query_prompt(goal)).await?;
        Ok(raw.trim().trim_matches('"').trim_matches('\'').to_string())
    }
}

#[async_trait]
impl Agent for ResearcherAgent {
    type Thought = Option<Task>;

    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn role(&self) -> &str {
        "researcher"
    }

    fn input_channels(&self) -> Vec<&'static str> {
        vec![RESEARCHER_TASKS_CHANNEL]
    }

    // Silent-skip conditions: the message may legitimately belong to
    // another worker variant sharing this infrastructure.
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
        if task.kind != "research" {
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

        match self.research(&task).await {
            Ok(result) => {
                let sources = result.get("sources").and_then(|v| v.as_array()).map_or(0, Vec::len);
                task.complete(result);
                info!(
                    agent_id = %self.agent_id,
                    task_id = %task.id,
                    mission_id = %task.mission_id,
                    sources,
                    "task completed"
                );
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

fn build_query_prompt(goal: &str) -> String {
    format!(
        "Based on the goal below, produce one concise, specific web search \
         query that would surface the most relevant information.\n\n\
         Goal: {goal}\n\n\
         Return only the search query, nothing else."
    )
}

fn build_synthesis_prompt(goal: &str, results: &[SearchResult]) -> String {
    let sources = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Source {}: {}\nURL: {}\nContent: {}",
                i + 1,
                r.title,
                r.url,
                truncate(&r.content, SOURCE_PROMPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Using the goal and the sources below, write a focused, useful \
         research summary.\n\n\
         Goal: {goal}\n\n\
         Sources:\n{sources}\n\n\
         Write a structured summary that answers the goal, citing sources \
         where relevant."
    )
}

/// Cut at a char boundary at or below `max` bytes.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;
    use crate::protocol::MessagePayload;
    use crate::task::TaskStatus;
    use crate::testutil::{StubLlm, StubSearch};
    use serde_json::json;
    use uuid::Uuid;

    fn researcher(
        bus: Arc<InProcessBus>,
        llm: StubLlm,
        search: StubSearch,
    ) -> ResearcherAgent {
        ResearcherAgent::new("researcher-1", bus, Arc::new(llm), Arc::new(search))
    }

    fn research_task() -> Task {
        let mut payload = JsonMap::new();
        payload.insert("goal".to_string(), json!("compare rust async runtimes"));
        Task::new(Uuid::new_v4(), "research", payload).assigned_to("researcher")
    }

    #[tokio::test]
    async fn completes_a_recognized_task_with_one_result_message() {
        let bus = Arc::new(InProcessBus::new());
        let mut results_sub = bus.subscribe(TASK_RESULTS_CHANNEL).await.unwrap();
        let agent = researcher(bus.clone(), StubLlm::replying("a summary"), StubSearch::with_hits(3));

        let task = research_task();
        let message = protocol::task_created(&task, RESEARCHER_TASKS_CHANNEL, "supervisor-1");
        let thought = agent.interpret(&message);
        assert_eq!(thought.as_ref().map(|t| t.id), Some(task.id));
        agent.act(&message, thought).await.unwrap();

        let result = results_sub.recv().await.unwrap();
        assert_eq!(result.message_type, MessageType::TaskResult);
        assert_eq!(result.correlation_id, Some(message.id));
        assert_eq!(result.task_id, Some(task.id));
        let payload = result.payload.to_map();
        assert_eq!(payload.get("summary"), Some(&json!("a summary")));
        assert!(payload.get("search_query").is_some());
        assert_eq!(payload.get("sources").unwrap().as_array().unwrap().len(), 3);
        assert!(results_sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn capability_failure_produces_exactly_one_error_result() {
        let bus = Arc::new(InProcessBus::new());
        let mut results_sub = bus.subscribe(TASK_RESULTS_CHANNEL).await.unwrap();
        let agent = researcher(bus.clone(), StubLlm::replying("q"), StubSearch::failing());

        let task = research_task();
        let message = protocol::task_created(&task, RESEARCHER_TASKS_CHANNEL, "supervisor-1");
        let thought = agent.interpret(&message);

        // The act phase never raises on a provider failure.
        agent.act(&message, thought).await.unwrap();

        let result = results_sub.recv().await.unwrap();
        let payload = result.payload.to_map();
        let error = payload.get("error").and_then(|v| v.as_str()).unwrap();
        assert!(!error.is_empty());
        assert!(results_sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn skips_unrecognized_task_kind_silently() {
        let bus = Arc::new(InProcessBus::new());
        let mut results_sub = bus.subscribe(TASK_RESULTS_CHANNEL).await.unwrap();
        let agent = researcher(bus.clone(), StubLlm::replying("x"), StubSearch::with_hits(1));

        let task = Task::new(Uuid::new_v4(), "implementation_plan", JsonMap::new());
        let message = protocol::task_created(&task, RESEARCHER_TASKS_CHANNEL, "supervisor-1");
        let thought = agent.interpret(&message);
        assert!(thought.is_none());
        agent.act(&message, thought).await.unwrap();
        assert!(results_sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn skips_wrong_message_type_and_malformed_payload() {
        let bus = Arc::new(InProcessBus::new());
        let agent = researcher(bus, StubLlm::replying("x"), StubSearch::with_hits(1));

        let heartbeat = SwarmMessage::new(
            Uuid::new_v4(),
            RESEARCHER_TASKS_CHANNEL,
            MessageType::Heartbeat,
            MessagePayload::Other(JsonMap::new()),
        );
        assert!(agent.interpret(&heartbeat).is_none());

        let malformed: MessagePayload =
            serde_json::from_value(json!({"task": {"id": "not-a-uuid"}})).unwrap();
        let bad = SwarmMessage::new(
            Uuid::new_v4(),
            RESEARCHER_TASKS_CHANNEL,
            MessageType::TaskCreated,
            malformed,
        );
        assert!(agent.interpret(&bad).is_none());
    }

    #[tokio::test]
    async fn source_content_is_truncated_in_the_result_payload() {
        let bus = Arc::new(InProcessBus::new());
        let mut results_sub = bus.subscribe(TASK_RESULTS_CHANNEL).await.unwrap();
        let long = "x".repeat(2_000);
        let search = StubSearch::with_results(vec![SearchResult {
            title: "t".to_string(),
            url: "https://example.com".to_string(),
            content: long,
            score: Some(1.0),
        }]);
        let agent = researcher(bus.clone(), StubLlm::replying("s"), search);

        let task = research_task();
        let message = protocol::task_created(&task, RESEARCHER_TASKS_CHANNEL, "supervisor-1");
        let thought = agent.interpret(&message);
        agent.act(&message, thought).await.unwrap();

        let payload = results_sub.recv().await.unwrap().payload.to_map();
        let content = payload["sources"][0]["content"].as_str().unwrap();
        assert_eq!(content.len(), SOURCE_PAYLOAD_CHARS);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("héllo", 3), "hé");
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn worker_status_transitions_are_terminal() {
        let mut task = research_task();
        task.start();
        assert_eq!(task.status, TaskStatus::Running);
        task.complete(JsonMap::new());
        assert!(task.status.is_terminal());
    }
}
