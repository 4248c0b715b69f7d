//! Parsing of ReAct-formatted model output

use crate::engine::OBSERVATION_STOP;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const FINAL_ANSWER: &str = "Final Answer:";

/// One parsed reasoning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactStep {
    /// Call `tool` with `input`
    Action { tool: String, input: String },

    /// Stop with an answer
    Final { answer: String },
}

/// Output that is not a well-formed step; the message is fed back as the
/// observation so the model can correct itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    Ambiguous,
}

fn action_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").ok()
        })
        .as_ref()
}

/// Drop anything the model wrote past its own step
pub fn trim_hallucinated_observation(text: &str) -> &str {
    match text.find(OBSERVATION_STOP) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn clean_input(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// Parse one step of model output
pub fn parse_step(text: &str) -> Result<ReactStep, ParseError> {
    let text = trim_hallucinated_observation(text);
    let has_final = text.contains(FINAL_ANSWER);
    let action = action_pattern().and_then(|re| re.captures(text));

    match (action, has_final) {
        (Some(_), true) => Err(ParseError::Ambiguous),
        (Some(caps), false) => Ok(ReactStep::Action {
            tool: caps[1].trim().trim_matches('*').trim().to_string(),
            input: clean_input(&caps[2]),
        }),
        (None, true) => {
            let answer = text
                .rsplit_once(FINAL_ANSWER)
                .map(|(_, answer)| answer.trim().to_string())
                .unwrap_or_default();
            Ok(ReactStep::Final { answer })
        }
        (None, false) => {
            let has_action = Regex::new(r"Action\s*\d*\s*:")
                .map(|re| re.is_match(text))
                .unwrap_or(false);
            if has_action {
                Err(ParseError::MissingActionInput)
            } else {
                Err(ParseError::MissingAction)
            }
        }
    }
}
