//! Agents as tools.
//!
//! The master coordinator does not call sub-agents through a bespoke
//! channel: each sub-agent is wrapped as an ordinary [`Tool`] taking a
//! natural-language `request`, so delegation reuses the same tool-calling
//! contract as everything else. Sub-agent errors are converted into failure
//! outcomes the master can read and relay.

use crate::agent::Agent;
use crate::session::SessionContext;
use crate::tools::{parse_args, Tool, ToolOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

/// Exposes a whole [`Agent`] as a callable tool.
pub struct AgentTool {
    agent: Arc<Agent>,
}

impl AgentTool {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}

#[derive(Deserialize)]
struct AgentToolArgs {
    request: String,
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn description(&self) -> &str {
        self.agent.description()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "The task for this agent, phrased in natural language with all relevant details."
                }
            },
            "required": ["request"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: AgentToolArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        info!(agent = %self.agent.name(), "Delegating task to sub-agent");

        match self.agent.run(session, &args.request).await {
            Ok(answer) => ToolOutcome::Success(Value::String(answer)),
            Err(e) => {
                ToolOutcome::failure(format!("The '{}' agent failed: {e}", self.agent.name()))
            }
        }
    }
}
