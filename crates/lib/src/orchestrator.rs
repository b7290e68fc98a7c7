//! # Master Orchestrator
//!
//! Wires the three specialists and the master coordinator together. The
//! master sees each specialist as a callable tool and decides the sequencing
//! itself, guided only by its instruction text. After every top-level
//! interaction the session transcript is archived through the configured
//! [`MemorySink`].

use crate::agent::{Agent, AgentTool};
use crate::errors::AgentError;
use crate::memory::MemorySink;
use crate::prompts;
use crate::providers::ai::ChatProvider;
use crate::session::SessionContext;
use crate::store::DocumentStore;
use crate::tools::{inventory::inventory_toolset, user::user_toolset};
use std::sync::Arc;
use tracing::warn;

pub const MASTER_AGENT: &str = "master_agent";
pub const IDENTIFIER_AGENT: &str = "identifier_agent";
pub const VALUE_AGENT: &str = "value_agent";
pub const INVENTORY_AGENT: &str = "inventory_agent";

/// The assembled agent hierarchy for one deployment.
#[derive(Debug)]
pub struct Orchestrator {
    master: Agent,
    memory: Option<Arc<dyn MemorySink>>,
}

impl Orchestrator {
    /// Builds the master agent and its three specialists over a shared chat
    /// provider and document store.
    pub fn new(
        provider: Box<dyn ChatProvider>,
        store: Arc<dyn DocumentStore>,
        memory: Option<Arc<dyn MemorySink>>,
    ) -> Result<Self, AgentError> {
        let identifier_agent = Agent::builder()
            .name(IDENTIFIER_AGENT)
            .description(
                "Identifies a physical media item from a text query, considering its condition, \
                 finds it on blu-ray.com, and extracts its UPC code.",
            )
            .instruction(prompts::IDENTIFIER_INSTRUCTION)
            .provider(dyn_clone::clone_box(provider.as_ref()))
            .enable_search(true)
            .build()?;

        let value_agent = Agent::builder()
            .name(VALUE_AGENT)
            .description(
                "Finds the market value of physical media by searching on eBay using its title, \
                 UPC, and condition.",
            )
            .instruction(prompts::VALUE_INSTRUCTION)
            .provider(dyn_clone::clone_box(provider.as_ref()))
            .enable_search(true)
            .build()?;

        let inventory_agent = Agent::builder()
            .name(INVENTORY_AGENT)
            .description(
                "A worker agent that manages inventory records in the database. It can add, \
                 update, get, delete, query, and list items.",
            )
            .instruction(prompts::INVENTORY_INSTRUCTION)
            .provider(dyn_clone::clone_box(provider.as_ref()))
            .tools(inventory_toolset(&store))
            .tools(user_toolset())
            .build()?;

        let master = Agent::builder()
            .name(MASTER_AGENT)
            .description(
                "A master agent that orchestrates sub-agents to manage inventory and identify \
                 products.",
            )
            .instruction(prompts::MASTER_INSTRUCTION)
            .provider(provider)
            .tool(Arc::new(AgentTool::new(identifier_agent)))
            .tool(Arc::new(AgentTool::new(value_agent)))
            .tool(Arc::new(AgentTool::new(inventory_agent)))
            .tools(user_toolset())
            .build()?;

        Ok(Self { master, memory })
    }

    /// Handles one user message: runs the master agent, records the
    /// exchange, and archives the session transcript.
    ///
    /// Archival failure does not fail the interaction; the reply is already
    /// composed, so the failure is surfaced through the logs instead.
    pub async fn handle(
        &self,
        session: &SessionContext,
        message: &str,
    ) -> Result<String, AgentError> {
        session.record("user", message);
        let reply = self.master.run(session, message).await?;
        session.record("assistant", &reply);

        if let Some(sink) = &self.memory {
            if let Err(e) = sink.archive(session).await {
                warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Failed to archive session transcript"
                );
            }
        }

        Ok(reply)
    }
}
