//! Tool-mediated mode — the model decides for itself when to read the
//! spreadsheet.
//!
//! A bounded Thought → Action → Observation loop: each iteration sends the
//! transcript to the model; tool calls are executed and their output (or
//! error) appended as observations; a reply without tool calls is the
//! answer. No lexicon classification happens in this mode.

use async_trait::async_trait;
use sheetwise_core::error::QueryError;
use sheetwise_core::message::Message;
use sheetwise_core::provider::{Provider, ProviderRequest};
use sheetwise_core::query::Query;
use sheetwise_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::persona::PersonaTemplate;
use crate::pipeline::QueryEngine;

/// Answer returned when the model keeps calling tools past the limit.
pub const ITERATION_LIMIT_ANSWER: &str =
    "I couldn't finish looking through your data. Please try asking a more specific question.";

const TOOL_INSTRUCTIONS: &str = "You can read the user's spreadsheet with the list_sheets and \
read_sheet_range tools. Use them when the question is about the user's own data, schedule, \
tasks, or records. Answer general knowledge questions directly without calling tools.";

pub struct ToolMediatedAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    persona: Option<PersonaTemplate>,
    max_iterations: usize,
}

/// The outcome of one tool-mediated run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub iterations: usize,
    pub tool_calls_made: usize,
}

impl ToolMediatedAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            persona: None,
            max_iterations: 5,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_persona(mut self, persona: Option<PersonaTemplate>) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Persona block (if any), the tool rules, then persona reminders.
    fn system_instruction(&self) -> String {
        let mut sections = Vec::new();
        if let Some(p) = &self.persona {
            sections.push(p.block.trim().to_string());
        }
        sections.push(TOOL_INSTRUCTIONS.to_string());
        if let Some(p) = &self.persona {
            let reminders = p.reminders(true);
            if !reminders.is_empty() {
                let lines: Vec<String> = reminders.iter().map(|r| format!("- {r}")).collect();
                sections.push(format!("Remember:\n{}", lines.join("\n")));
            }
        }
        sections.join("\n\n")
    }

    pub async fn run(&self, query: &Query) -> Result<AgentOutcome, QueryError> {
        let tool_defs = self.tools.definitions();
        let mut transcript = vec![
            Message::system(self.system_instruction()),
            Message::user(query.as_str()),
        ];
        let mut tool_calls_made = 0usize;

        info!(model = %self.model, max_iter = self.max_iterations, "Tool-mediated loop starting");

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Tool-mediated iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: transcript.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_defs.clone(),
            };

            let response = self.provider.complete(request).await?;

            if response.message.tool_calls.is_empty() {
                info!(iterations = iteration, tool_calls = tool_calls_made, "Tool-mediated loop completed");
                return Ok(AgentOutcome {
                    answer: response.message.content,
                    iterations: iteration,
                    tool_calls_made,
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            transcript.push(response.message);

            for tc in &tool_calls {
                tool_calls_made += 1;

                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                let observation = match self.tools.execute(&call).await {
                    Ok(result) => {
                        debug!(tool = %tc.name, "Tool succeeded");
                        result.output
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool failed");
                        format!("Error: {e}")
                    }
                };

                transcript.push(Message::tool_result(&tc.id, observation));
            }
        }

        warn!("Tool-mediated loop: max iterations reached ({})", self.max_iterations);
        Ok(AgentOutcome {
            answer: ITERATION_LIMIT_ANSWER.to_string(),
            iterations: self.max_iterations,
            tool_calls_made,
        })
    }
}

#[async_trait]
impl QueryEngine for ToolMediatedAgent {
    fn mode(&self) -> &str {
        "tool_mediated"
    }

    async fn answer(&self, query: &Query) -> Result<String, QueryError> {
        Ok(self.run(query).await?.answer)
    }
}
