//! Tool registry
//!
//! Binds tool names to their handlers and advertises the registered tools to
//! the assistants service.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::ToolContext;
use super::definitions::{ToolDescriptor, ToolKind};
use super::error::RegistryError;
use super::request::ToolRequest;

/// Ordered set of tools offered to one session
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
    context: Arc<ToolContext>,
}

impl ToolRegistry {
    /// Empty registry whose handlers share `context`
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self {
            tools: Vec::new(),
            context,
        }
    }

    pub fn with_tools(
        context: Arc<ToolContext>,
        kinds: &[ToolKind],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(context);
        for kind in kinds {
            registry.add_tool(*kind)?;
        }
        Ok(registry)
    }

    /// Registers a tool; a name can only be registered once
    pub fn add_tool(&mut self, kind: ToolKind) -> Result<(), RegistryError> {
        if self.tools.contains(&kind) {
            return Err(RegistryError::DuplicateTool(kind.name().to_string()));
        }
        self.tools.push(kind);
        Ok(())
    }

    /// Descriptors in registration order
    pub fn describe_all(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|kind| kind.descriptor()).collect()
    }

    /// Function-tool JSON for every registered tool
    pub fn advertisement(&self) -> Vec<Value> {
        self.describe_all().iter().map(|d| d.to_json()).collect()
    }

    pub fn get(&self, name: &str) -> Option<ToolKind> {
        self.tools.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|kind| kind.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn context(&self) -> &Arc<ToolContext> {
        &self.context
    }

    /// Runs the named tool on a JSON argument blob.
    ///
    /// Only an unregistered name is an error. Malformed arguments and handler
    /// failures are rendered into the returned output so the assistant can
    /// correct itself.
    pub async fn invoke(&self, name: &str, arguments: &str) -> Result<String, RegistryError> {
        let kind = self
            .get(name)
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;

        info!(tool = name, args = arguments, "Executing tool");

        let result = match ToolRequest::decode(kind, arguments) {
            Ok(request) => self.context.execute(request).await,
            Err(e) => Err(e),
        };

        let output = match result {
            Ok(output) => {
                let preview: String = output.chars().take(200).collect();
                info!(tool = name, "Tool execution completed");
                debug!(tool = name, output_preview = %preview, "Tool output preview");
                output
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                e.to_string()
            }
        };

        Ok(output)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
