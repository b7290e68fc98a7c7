//! # User Context Tools
//!
//! Tools for reading and switching the session's user identity.

use crate::session::SessionContext;
use crate::tools::{parse_args, Tool, ToolOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Builds the user-context tool set.
pub fn user_toolset() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(GetCurrentUserTool), Arc::new(SetUserTool)]
}

/// Reports the effective user ID for the current session.
pub struct GetCurrentUserTool;

#[async_trait]
impl Tool for GetCurrentUserTool {
    fn name(&self) -> &str {
        "get_current_user_id"
    }

    fn description(&self) -> &str {
        "Gets the user ID for the current session. Use this to confirm the user's identity if needed."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, session: &SessionContext, _args: Map<String, Value>) -> ToolOutcome {
        ToolOutcome::Success(json!({ "user_id": session.resolve_user_id(None) }))
    }
}

/// Stores a new user ID in the session. The identifier is never validated:
/// unknown users come into existence on their first write.
pub struct SetUserTool;

#[derive(Deserialize)]
struct SetUserArgs {
    new_user_id: String,
}

#[async_trait]
impl Tool for SetUserTool {
    fn name(&self) -> &str {
        "set_user_id"
    }

    fn description(&self) -> &str {
        "Sets or updates the user ID for the current session. Use this when a user wants to switch context."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "new_user_id": { "type": "string", "description": "The new user ID for this session." }
            },
            "required": ["new_user_id"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: SetUserArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        session.set_user_id(&args.new_user_id);
        ToolOutcome::success(format!(
            "User ID for this session has been updated to '{}'.",
            args.new_user_id
        ))
    }
}
