//! The weather assistant: router, tool server session and optional LLM.
//!
//! [`WeatherAssistant::respond`] is rule-based: the router picks the tool and
//! the LLM, when present, only phrases the answer. [`WeatherAssistant::ask_with_tools`]
//! lets the model pick the tool itself, for a single round trip.

use nimbus_llm::{Content, FunctionDeclaration, GenerateRequest, SharedBackend};
use nimbus_mcp::{ToolOutcome, function_declarations};
use serde_json::{Value, json};

use crate::cities::City;
use crate::error::{Result, WeatherError};
use crate::reply;
use crate::router::{self, Guidance, Intent, Subject, ToolCall};
use crate::session::SharedSession;

pub struct WeatherAssistant {
    session: SharedSession,
    llm: Option<SharedBackend>,
}

impl WeatherAssistant {
    /// An assistant that answers with rule-based replies only.
    pub fn new(session: SharedSession) -> Self {
        Self { session, llm: None }
    }

    /// Phrase answers with an LLM.
    pub fn with_llm(mut self, backend: SharedBackend) -> Self {
        self.llm = Some(backend);
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// The session's tools, described for function calling.
    pub fn function_declarations(&self) -> Vec<FunctionDeclaration> {
        function_declarations(&self.session.tools())
            .into_iter()
            .map(|tool| {
                FunctionDeclaration::new(tool.name, tool.description, tool.parameters.to_value())
            })
            .collect()
    }

    /// Answer one user message.
    ///
    /// Guidance and tool failures are ordinary replies. Errors mean the
    /// session itself is unusable.
    pub async fn respond(&self, input: &str) -> Result<String> {
        match router::route(input) {
            Intent::ToolCall(call) => self.run_tool_call(input, call).await,
            Intent::Guidance(Guidance::UnknownCity) if self.llm.is_some() => {
                Ok(self.answer_vague_question(input).await)
            }
            Intent::Guidance(guidance) => Ok(guidance.message().to_string()),
        }
    }

    /// Let the model choose a tool, run it once, and return the model's answer.
    pub async fn ask_with_tools(&self, input: &str) -> Result<String> {
        let llm = self.llm.as_ref().ok_or(WeatherError::NoLlm)?;

        let request = GenerateRequest::new(input)
            .with_system(reply::SYSTEM_PROMPT)
            .with_functions(self.function_declarations());
        let response = llm.generate(request.clone()).await?;

        let Some(call) = response.function_call_request().cloned() else {
            return Ok(
                non_empty(response.text()).unwrap_or_else(|| reply::NO_RESPONSE.to_string())
            );
        };

        tracing::info!(tool = %call.name, "model requested tool call");
        let arguments = match call.args {
            Value::Null => json!({}),
            args => args,
        };
        let result = match self.session.call_tool(&call.name, arguments).await? {
            ToolOutcome::Completed(result) => result.text(),
            ToolOutcome::Failed { message } => format!("Error: {message}"),
        };

        let follow_up = request
            .push(response.content)
            .push(Content::function_response(
                call.name,
                json!({ "result": result }),
            ));
        let answer = llm.generate(follow_up).await?;
        Ok(non_empty(answer.text()).unwrap_or_else(|| reply::NO_RESPONSE.to_string()))
    }

    async fn run_tool_call(&self, input: &str, call: ToolCall) -> Result<String> {
        tracing::debug!(tool = call.tool, arguments = %call.arguments, "routed request");

        let result = match self.session.call_tool(call.tool, call.arguments).await? {
            ToolOutcome::Completed(result) if !result.is_error() => result,
            failed => return Ok(reply::service_error(&failed.text())),
        };
        let text = result.text();

        Ok(match call.subject {
            Subject::City(city) => self.phrase_forecast(input, city, &text).await,
            Subject::State(state) => reply::alerts(&state, &text),
        })
    }

    async fn phrase_forecast(&self, input: &str, city: &City, data: &str) -> String {
        let Some(llm) = &self.llm else {
            return reply::forecast(city, data);
        };

        let prompt = reply::forecast_prompt(input, city, data);
        match llm.generate(GenerateRequest::new(prompt)).await {
            Ok(response) => non_empty(response.text()).unwrap_or_else(|| {
                tracing::warn!("LLM returned no text, using raw forecast");
                reply::forecast_fallback(city, data)
            }),
            Err(e) => {
                tracing::warn!(error = %e, "LLM phrasing failed, using raw forecast");
                reply::forecast_fallback(city, data)
            }
        }
    }

    async fn answer_vague_question(&self, input: &str) -> String {
        let Some(llm) = &self.llm else {
            return reply::VAGUE_QUESTION.to_string();
        };

        match llm
            .generate(GenerateRequest::new(reply::vague_question_prompt(input)))
            .await
        {
            Ok(response) => non_empty(response.text())
                .unwrap_or_else(|| reply::VAGUE_QUESTION.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "LLM reply failed");
                reply::VAGUE_QUESTION.to_string()
            }
        }
    }
}

/// Model text, or `None` when it is blank.
fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}
