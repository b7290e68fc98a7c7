//! # Agentic Inventory Orchestration
//!
//! This crate provides the core of a multi-agent inventory assistant: a master
//! coordinator agent that delegates natural-language tasks to specialized
//! sub-agents (item identification, market valuation, and inventory database
//! management), each backed by a configurable chat provider and a set of
//! callable tools.
//!
//! The engineering substance lives in three places:
//!
//! - [`session`]: the explicit per-conversation context every tool call
//!   receives, including the user-identity resolution order.
//! - [`store`]: the hierarchical document store contract
//!   (`users/{user_id}/{category}/{document_id}`) and its backends.
//! - [`tools`]: the message-returning tool set exposed to the model. Tool
//!   failures are surfaced as data the model can read, never as exceptions,
//!   because the consuming layer cannot run a recovery branch.

pub mod agent;
pub mod errors;
pub mod memory;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod store;
pub mod tools;

pub use agent::{Agent, AgentBuilder};
pub use errors::AgentError;
pub use orchestrator::Orchestrator;
pub use session::{SessionContext, DEFAULT_USER_ID};
