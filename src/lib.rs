//! license-assistant - LLM-driven license review of RPM packages
//!
//! An assistant model is given a small set of package inspection tools and
//! walked through a fixed sequence of prompts per binary package. It records a
//! structured assessment of whether the package ships complete and correct
//! license files, and the findings plus transcripts end up in a report.
//!
//! # Core Concepts
//!
//! - **Assistants service**: remote threads and runs behind the
//!   [`AssistantClient`] trait
//! - **Agent session**: polls runs, executes the tool calls they request and
//!   submits the outputs until the run completes
//! - **Tools**: a closed set of inspection tools ([`ToolKind`]) over `rpm`,
//!   `rpm2cpio`/`cpio`, spec files and exploded source trees
//!
//! # Example Usage
//!
//! ```ignore
//! use license_assistant::{
//!     AgentSession, AssistantConfig, PollPolicy, ToolContext, ToolKind, ToolRegistry,
//! };
//! use std::sync::Arc;
//!
//! async fn ask() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssistantConfig::from_env()?;
//!     let context = Arc::new(ToolContext::with_rpm_tools());
//!     let registry = ToolRegistry::with_tools(context, &ToolKind::PACKAGE_REVIEW)?;
//!
//!     let mut session = AgentSession::start(
//!         config.create_client()?,
//!         "License Assistant",
//!         "You review RPM license files.",
//!         registry,
//!         PollPolicy::default(),
//!     )
//!     .await?;
//!
//!     session.add_prompt("Which license files does tool-1.0-1.x86_64.rpm ship?").await?;
//!     session.run_agent(None).await?;
//!     for line in session.get_results(1).await? {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`llm`]: assistants service contract, HTTP client and scripted mock
//! - [`agent`]: run polling and tool dispatch
//! - [`tools`]: tool registry and inspection handlers
//! - [`review`]: per-package prompt sequence and report

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod review;
pub mod tools;
pub mod util;

pub use agent::{AgentSession, PollPolicy, RunPoller, SessionError};
pub use config::{AssistantConfig, ConfigError};
pub use llm::{AssistantClient, AzureAssistantClient, BackendError, MockAssistantClient};
pub use review::{ReviewInputs, ReviewOptions, ReviewReport, Reviewer};
pub use tools::{ToolContext, ToolError, ToolKind, ToolRegistry};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
