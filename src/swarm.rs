use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::coder::CoderAgent;
use crate::agent::researcher::ResearcherAgent;
use crate::agent::supervisor::SupervisorAgent;
use crate::agent::{self, AgentHandle};
use crate::ai::LlmClient;
use crate::blackboard::Blackboard;
use crate::bus::EventBus;
use crate::errors::TransportError;
use crate::search::SearchClient;
use crate::task::AgentState;

/// The running swarm: the bus, the blackboard and every spawned agent.
pub struct Swarm {
    bus: Arc<dyn EventBus>,
    cancel: CancellationToken,
    handles: Vec<AgentHandle>,
    agents: Vec<AgentState>,
}

impl Swarm {
    /// Spawn the supervisor and the configured workers. Every agent's
    /// subscriptions are live when this returns. A missing search
    /// capability disables the researcher instead of failing boot.
    pub async fn start(
        bus: Arc<dyn EventBus>,
        blackboard: Arc<dyn Blackboard>,
        llm: Arc<dyn LlmClient>,
        search: Option<Arc<dyn SearchClient>>,
    ) -> Result<Self, TransportError> {
        let cancel = CancellationToken::new();
        let mut handles = Vec::new();
        let mut agents = Vec::new();

        let supervisor = Arc::new(SupervisorAgent::new("supervisor-1", bus.clone(), blackboard));
        handles.push(agent::spawn(supervisor, bus.clone(), cancel.clone()).await?);
        agents.push(AgentState::new("supervisor-1", "supervisor"));

        match search {
            Some(search) => {
                let researcher = Arc::new(ResearcherAgent::new(
                    "researcher-1",
                    bus.clone(),
                    llm.clone(),
                    search,
                ));
                handles.push(agent::spawn(researcher, bus.clone(), cancel.clone()).await?);
                agents.push(AgentState::new("researcher-1", "researcher"));
            }
            None => warn!("search capability not configured, researcher disabled"),
        }

        let coder = Arc::new(CoderAgent::new("coder-1", bus.clone(), llm));
        handles.push(agent::spawn(coder, bus.clone(), cancel.clone()).await?);
        agents.push(AgentState::new("coder-1", "coder"));

        info!(agents = agents.len(), "swarm started");
        Ok(Self { bus, cancel, handles, agents })
    }

    /// Lifecycle records for the spawned agents.
    pub fn agent_states(&self) -> &[AgentState] {
        &self.agents
    }

    /// Cancel every channel loop, wait for them to finish, then close
    /// the bus. Safe to call while handlers are mid-message; in-flight
    /// work is cancelled.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            handle.join().await;
        }
        self.bus.close().await;
        info!("swarm stopped");
    }
}
