pub mod coder;
pub mod researcher;
pub mod supervisor;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, Subscription};
use crate::errors::TransportError;
use crate::protocol::SwarmMessage;

/// The Agent trait. Each agent variant implements this.
///
/// An agent declares a fixed list of input channels and handles every
/// delivered message in two phases: `interpret` turns the message into a
/// thought, `act` applies it. Interpretation is a pure function of the
/// message so it can be tested and reordered independently; publishing,
/// blackboard writes and external calls all belong in `act`.
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Intermediate value passed from `interpret` to `act`.
    type Thought: Send;

    fn agent_id(&self) -> &str;

    fn role(&self) -> &str;

    /// Channels this agent listens on.
    fn input_channels(&self) -> Vec<&'static str>;

    fn interpret(&self, message: &SwarmMessage) -> Self::Thought;

    async fn act(&self, message: &SwarmMessage, thought: Self::Thought) -> anyhow::Result<()>;
}

/// Join handle over an agent's per-channel loops.
pub struct AgentHandle {
    loops: Vec<JoinHandle<()>>,
}

impl AgentHandle {
    /// Wait for every channel loop to finish. Loops end when the runtime
    /// cancellation token fires or the bus closes their subscription.
    pub async fn join(self) {
        join_all(self.loops).await;
    }
}

/// Start an agent: one concurrent loop per declared input channel.
///
/// Every subscription is live by the time this returns, so a message
/// published immediately afterwards is observed. Loops on different
/// channels run independently; messages on the same channel are handled
/// strictly in delivery order by a single pull loop.
pub async fn spawn<A: Agent>(
    agent: Arc<A>,
    bus: Arc<dyn EventBus>,
    cancel: CancellationToken,
) -> Result<AgentHandle, TransportError> {
    let channels = agent.input_channels();
    let mut loops = Vec::with_capacity(channels.len());
    for channel in channels {
        let sub = bus.subscribe(channel).await?;
        let agent = agent.clone();
        let cancel = cancel.clone();
        loops.push(tokio::spawn(async move { channel_loop(agent, sub, channel, cancel).await }));
    }
    info!(
        agent_id = %agent.agent_id(),
        role = %agent.role(),
        channels = loops.len(),
        "agent started"
    );
    Ok(AgentHandle { loops })
}

async fn channel_loop<A: Agent>(
    agent: Arc<A>,
    mut sub: Subscription,
    channel: &'static str,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = sub.recv() => match maybe {
                Some(message) => message,
                // Bus closed underneath us.
                None => break,
            },
        };
        debug!(
            agent_id = %agent.agent_id(),
            role = %agent.role(),
            channel,
            message_id = %message.id,
            message_type = ?message.message_type,
            "message received"
        );

        let thought = agent.interpret(&message);
        tokio::select! {
            // Shutdown cancels in-flight work, including external calls.
            _ = cancel.cancelled() => break,
            result = agent.act(&message, thought) => {
                if let Err(error) = result {
                    // One bad message must never end the subscription loop.
                    warn!(
                        agent_id = %agent.agent_id(),
                        role = %agent.role(),
                        channel,
                        message_id = %message.id,
                        %error,
                        "handler failed, continuing"
                    );
                }
            }
        }
    }
    // The subscription drops here, unsubscribing from the channel.
}
