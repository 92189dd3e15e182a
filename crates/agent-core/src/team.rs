//! Team Delegation
//!
//! A team leader reaches its members through ordinary tools named
//! `transfer_task_to_<member>`. Executing one runs the member's own
//! reasoning loop and hands its answer back to the leader.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::responder::{QueryRequest, Responder};
use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

/// Roster entry rendered into the leader's system prompt
#[derive(Clone, Debug)]
pub struct TeamMember {
    pub name: String,
    pub role: Option<String>,
    pub tools: Vec<String>,
}

impl TeamMember {
    pub fn of(responder: &dyn Responder) -> Self {
        Self {
            name: responder.name().to_string(),
            role: responder.role().map(String::from),
            tools: responder.tool_names(),
        }
    }

    /// Name of the delegate tool that reaches this member
    pub fn transfer_tool_name(&self) -> String {
        transfer_tool_name(&self.name)
    }

    /// One roster line, e.g. `Agent 1: Web search agent`
    pub fn describe(&self, index: usize) -> String {
        let mut line = format!("Agent {index}:\nName: {}", self.name);
        if let Some(role) = &self.role {
            line.push_str(&format!("\nRole: {role}"));
        }
        if !self.tools.is_empty() {
            line.push_str(&format!("\nAvailable tools: {}", self.tools.join(", ")));
        }
        line.push_str(&format!("\nTransfer with: {}\n", self.transfer_tool_name()));
        line
    }
}

/// `Web search agent` -> `transfer_task_to_web_search_agent`
pub fn transfer_tool_name(agent_name: &str) -> String {
    let slug = agent_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("transfer_task_to_{slug}")
}

/// Tool that forwards a task to a team member
pub struct DelegateTool {
    member: Arc<dyn Responder>,
    tool_name: String,
}

impl DelegateTool {
    pub fn new(member: Arc<dyn Responder>) -> Self {
        let tool_name = transfer_tool_name(member.name());
        Self { member, tool_name }
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn schema(&self) -> ToolSchema {
        let role = self
            .member
            .role()
            .map_or_else(String::new, |r| format!(" Role: {r}."));
        ToolSchema {
            name: self.tool_name.clone(),
            description: format!(
                "Transfer a task to {}.{role} The agent's answer is returned to you.",
                self.member.name()
            ),
            parameters: vec![
                ParameterSchema::required(
                    "task",
                    "string",
                    "Clear description of the task, including all context the agent needs",
                ),
                ParameterSchema::optional(
                    "expected_output",
                    "string",
                    "What the answer should contain",
                    serde_json::json!(""),
                ),
            ],
            category: Some("team".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let task = call.str_arg("task").unwrap_or_default();
        let query = match call.str_arg("expected_output") {
            Some(expected) => format!("{task}\n\nThe expected output is: {expected}"),
            None => task.to_string(),
        };

        tracing::debug!(member = %self.member.name(), "Delegating task");
        let response = self.member.respond(&QueryRequest::new(query)).await?;

        Ok(ToolResult::success(&self.tool_name, response.content).with_data(serde_json::json!({
            "agent": self.member.name(),
            "tool_calls": response.tool_calls,
        })))
    }
}
