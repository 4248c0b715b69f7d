//! Wolfram Alpha Short Answers API
//!
//! Requires `WOLFRAM_ALPHA_APP_ID`.

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::strip_quotes;
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use std::sync::Arc;

const API_URL: &str = "https://api.wolframalpha.com/v1/result";

/// Wolfram Alpha tool
#[derive(Debug, Clone)]
pub struct WolframAlphaTool {
    context: Arc<ToolContext>,
}

impl WolframAlphaTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

/// Map an API answer to the observation text
pub fn interpret_response(status: u16, body: &str, query: &str) -> String {
    match status {
        200 => match body.trim() {
            "Wolfram|Alpha did not understand your input" => format!(
                "Wolfram Alpha couldn't understand: '{}'. Try rephrasing as a simple factual question.",
                query
            ),
            "No short answer available" => format!(
                "Wolfram Alpha has data on this but no short answer available. Query: '{}'. Try being more specific.",
                query
            ),
            answer => format!("Wolfram Alpha: {}", answer),
        },
        403 => "Error: Invalid Wolfram Alpha API key.".to_string(),
        501 => format!(
            "Wolfram Alpha couldn't process: '{}'. Try a different phrasing.",
            query
        ),
        other => format!("Wolfram Alpha API error (status {})", other),
    }
}

#[async_trait]
impl Tool for WolframAlphaTool {
    fn name(&self) -> &str {
        "wolfram_alpha"
    }

    fn description(&self) -> &str {
        "Query Wolfram Alpha for FACTUAL REAL-WORLD DATA. Use this as a LAST RESORT \
         when other tools cannot answer the question.\n\n\
         BEST FOR:\n\
         - Nutritional data: 'calories in an apple'\n\
         - Scientific constants: 'speed of light', 'atomic weight of gold'\n\
         - Geographic facts: 'population of Tokyo', 'height of Mount Everest'\n\
         - Astronomical data: 'distance to Mars'\n\n\
         DO NOT USE FOR:\n\
         - Math calculations (use calculator)\n\
         - Unit conversions (use unit_converter)\n\
         - Solving equations (use equation_solver)\n\
         - Current news (use web_search)"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MathComputation
    }

    async fn call(&self, query: &str) -> Result<String> {
        let Some(app_id) = self.context.wolfram_app_id.as_deref() else {
            return Ok("Error: Wolfram Alpha API key not configured. Set WOLFRAM_ALPHA_APP_ID \
                       in your environment. Get a free key at: https://developer.wolframalpha.com/"
                .to_string());
        };

        let question = strip_quotes(query.trim());
        if question.is_empty() {
            return Err(AgentError::InvalidInput("No question provided.".to_string()));
        }

        let params = [("appid", app_id.to_string()), ("i", question.to_string())];
        let response = self.context.http.get(API_URL, &params).await?;

        Ok(interpret_response(response.status, &response.body, question))
    }
}
