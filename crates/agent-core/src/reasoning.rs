//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The agent observes, thinks, acts (via tools or team members), and responds.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider, TokenUsage};
use crate::responder::{AgentResponse, QueryRequest, Responder, ToolCallRecord};
use crate::team::{DelegateTool, TeamMember};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Display name
    pub name: String,

    /// Role shown to the model and to team leaders
    pub role: Option<String>,

    /// Instructions rendered as a bullet list in the system prompt
    pub instructions: Vec<String>,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,

    /// Whether rendered output lists the tool calls that were made
    pub show_tool_calls: bool,

    /// Whether the model is told to answer in markdown
    pub markdown: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Agent".into(),
            role: None,
            instructions: Vec::new(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            show_tool_calls: false,
            markdown: false,
        }
    }
}

const BASE_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate."#;

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    team: Vec<TeamMember>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            team: Vec::new(),
            config,
        }
    }

    /// Build the full system prompt including tool descriptions
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = String::from(BASE_SYSTEM_PROMPT);

        if let Some(role) = &self.config.role {
            let _ = write!(prompt, "\n\nYour role is: {role}");
        }

        let mut instructions = self.config.instructions.clone();
        if self.config.markdown {
            instructions.push("Use markdown to format your answers.".into());
        }
        if !instructions.is_empty() {
            prompt.push_str("\n\n## Instructions\n");
            for instruction in &instructions {
                let _ = writeln!(prompt, "- {instruction}");
            }
        }

        if !self.team.is_empty() {
            prompt.push_str("\n## Team\n");
            prompt.push_str("You can transfer tasks to the following agents in your team:\n");
            for (i, member) in self.team.iter().enumerate() {
                let _ = writeln!(prompt, "{}", member.describe(i + 1));
            }
        }

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the reasoning loop until the model answers without a tool call
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        generation: &GenerationOptions,
    ) -> Result<AgentResponse> {
        let mut records = Vec::new();
        let mut usage: Option<TokenUsage> = None;
        let mut iterations = 0;

        loop {
            iterations += 1;

            if iterations > self.config.max_iterations {
                return Err(AgentError::MaxIterations(self.config.max_iterations));
            }

            conversation.truncate_to_fit();

            let completion = self
                .provider
                .complete(conversation.messages(), generation)
                .await?;

            if let Some(step) = &completion.usage {
                usage.get_or_insert_with(TokenUsage::default).add(step);
            }

            let content = completion.content;
            conversation.push(Message::assistant(&content));

            if let Some(tool_call) = self.parse_tool_call(&content) {
                tracing::debug!(agent = %self.config.name, tool = %tool_call.name, "Executing tool");

                let result = self.execute_tool(&tool_call).await?;

                records.push(ToolCallRecord {
                    agent: self.config.name.clone(),
                    call: tool_call.signature(),
                    tool: tool_call.name.clone(),
                    success: result.success,
                });
                records.extend(delegated_records(&result));

                let tool_message = Self::format_tool_result(&result);
                conversation.push(Message::tool(
                    &tool_call.name,
                    tool_message,
                    tool_call.id.clone(),
                ));

                continue;
            }

            return Ok(AgentResponse {
                content,
                model: completion.model,
                tool_calls: records,
                usage,
            });
        }
    }

    /// Parse a tool call from LLM response
    fn parse_tool_call(&self, content: &str) -> Option<ToolCall> {
        let tool_start = "```tool";
        let tool_end = "```";

        let parsed = content.find(tool_start).and_then(|start_idx| {
            let after_marker = &content[start_idx + tool_start.len()..];
            let end_idx = after_marker.find(tool_end)?;
            serde_json::from_str::<ToolCall>(after_marker[..end_idx].trim()).ok()
        });

        let mut call = parsed.or_else(|| Self::parse_inline_tool_call(content))?;

        if self.tools.get(&call.name).is_none() {
            tracing::warn!(agent = %self.config.name, tool = %call.name, "Model requested unknown tool");
        }

        if call.id.is_none() {
            call.id = Some(uuid::Uuid::new_v4().to_string());
        }
        Some(call)
    }

    /// Try to parse inline JSON tool call
    fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
        if !content.contains(r#""tool""#) {
            return None;
        }

        let start = content.find('{')?;
        let end = content.rfind('}')?;

        if end <= start {
            return None;
        }

        serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
    }

    /// Execute a tool call; provider-side failures end the run
    async fn execute_tool(&self, call: &ToolCall) -> Result<ToolResult> {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                Ok(result)
            }
            Err(e) if e.aborts_run() => Err(e),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                let mut failed = ToolResult::failure(&call.name, format!("Error: {e}"));
                failed.id.clone_from(&call.id);
                Ok(failed)
            }
        }
    }

    /// Format tool result for conversation
    fn format_tool_result(result: &ToolResult) -> String {
        if result.success {
            format!("[Tool '{}' returned]\n{}", result.name, result.output)
        } else {
            format!("[Tool '{}' failed]\n{}", result.name, result.output)
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Tool-call records a delegated member attached to its result
fn delegated_records(result: &ToolResult) -> Vec<ToolCallRecord> {
    result
        .data
        .as_ref()
        .and_then(|data| data.get("tool_calls"))
        .and_then(|calls| serde_json::from_value(calls.clone()).ok())
        .unwrap_or_default()
}

#[async_trait]
impl Responder for Agent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> Option<&str> {
        self.config.role.as_deref()
    }

    fn tool_names(&self) -> Vec<String> {
        self.tools.names().into_iter().map(String::from).collect()
    }

    async fn respond(&self, request: &QueryRequest) -> Result<AgentResponse> {
        let mut generation = self.config.generation.clone();
        if let Some(max_tokens) = request.max_tokens {
            generation.max_tokens = max_tokens;
        }

        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(request.query.trim()));
        self.run(&mut conversation, &generation).await
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    members: Vec<Arc<dyn Responder>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            members: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn shared_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.register_shared(tool);
        }
        self
    }

    /// Add a team member; the agent gets a `transfer_task_to_*` tool for it
    #[must_use]
    pub fn member(mut self, member: Arc<dyn Responder>) -> Self {
        self.members.push(member);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.config.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.instructions.push(instruction.into());
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn show_tool_calls(mut self, show: bool) -> Self {
        self.config.show_tool_calls = show;
        self
    }

    #[must_use]
    pub const fn markdown(mut self, markdown: bool) -> Self {
        self.config.markdown = markdown;
        self
    }

    pub fn build(mut self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.generation.model.trim().is_empty() {
            return Err(AgentError::Config("Model id must not be empty".into()));
        }

        let team: Vec<TeamMember> = self.members.iter().map(|m| TeamMember::of(m.as_ref())).collect();
        for member in self.members {
            self.tools.register(DelegateTool::new(member));
        }

        Ok(Agent {
            provider,
            tools: Arc::new(self.tools),
            team,
            config: self.config,
        })
    }
}
