use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ActionContext;

/// Result of executing a tool. Grounded on `skynet-agent::tools::ToolResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
    /// Structured data the tool produced (e.g. a generated media id), used
    /// for follow-up coordination between actions in the same cycle.
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
            data: None,
        }
    }

    pub fn success_with_data(content: impl Into<String>, data: Value) -> Self {
        Self {
            content: content.into(),
            is_error: false,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
            data: None,
        }
    }
}

/// A named, independently schema'd, independently callable action the
/// decision service can select (spec §4.6). Grounded on
/// `skynet-agent::tools::Tool`, generalized to also receive the shared
/// [`ActionContext`] instead of a single app-context generic.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameter_schema(&self) -> Value;
    /// Tool group, used for system-prompt domain sectioning and payload
    /// tool-catalog filtering (spec §4.4 node-based vs traditional mode).
    fn group(&self) -> &str;
    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameter_schema: Value,
    pub group: String,
}

/// Registry of every tool the orchestrator may dispatch to. Grounded on
/// `skynet-agent::tools`'s catalog/definitions pattern.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameter_schema: t.parameter_schema(),
                group: t.group().to_string(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definitions restricted to one or more tool groups (spec §4.8's
    /// node-control-only vs action-tools-only phases of the two-phase cycle).
    pub fn definitions_in_groups(&self, groups: &[&str]) -> Vec<ToolDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| groups.contains(&d.group.as_str()))
            .collect()
    }
}
