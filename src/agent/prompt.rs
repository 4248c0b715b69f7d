//! ReAct prompt construction

use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolCategory;

const PREAMBLE: &str = "You are a helpful research assistant with access to various tools.
Your goal is to answer questions thoroughly by gathering information from multiple sources when needed.";

const SELECTION_AND_FORMAT: &str = "TOOL SELECTION PROCESS:
1. Identify what TYPE of task you need (math? information lookup? code execution?)
2. Look at the matching CATEGORY above
3. Read the category guidance to pick the right tool
4. Choose the most specific tool for your need

Use the following format:

Question: the input question you must answer
Thought: I need to [type of task]. Looking at [CATEGORY], I should use [tool] because [reason].
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

const GUIDELINES: &str = "Important guidelines:
- Always identify the CATEGORY first, then select the tool
- Use multiple tools when necessary to gather comprehensive information
- For calculations: use calculator (simple) or python_repl (complex) - never do math in your head
- For facts: prefer wikipedia (established) over web_search (current/recent)
- For numbers/computation: prefer wolfram_alpha when precision matters
- If the user asks a follow-up question, use the chat history for context
- Synthesize information from multiple sources into a coherent answer
- If a tool returns an error, try a different approach or different tool in the same category";

/// Tool descriptions grouped by category
pub fn render_tool_catalog(registry: &ToolRegistry) -> String {
    let mut lines = vec![
        "Tools are organized by category. First identify the category you need, then select the appropriate tool.\n"
            .to_string(),
    ];

    for category in ToolCategory::ALL {
        let tools = registry.by_category(category);
        if tools.is_empty() {
            continue;
        }

        lines.push(format!("## {}", category.title()));
        lines.push(category.summary().to_string());
        lines.push(format!("Guidance: {}", category.guidance()));
        lines.push(String::new());
        for tool in tools {
            lines.push(format!("  - {}: {}", tool.name(), tool.description()));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Static parts of the prompt, rendered once per agent
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    catalog: String,
    tool_names: String,
}

impl PromptTemplate {
    pub fn new(registry: &ToolRegistry) -> Self {
        Self {
            catalog: render_tool_catalog(registry),
            tool_names: registry.tool_names().join(", "),
        }
    }

    /// Full prompt for one reasoning step
    pub fn render(&self, chat_history: &str, question: &str, scratchpad: &str) -> String {
        format!(
            "{}\n\nPrevious conversation:\n{}\n\n{}\n\n{}\n\n{}\n\nBegin!\n\nQuestion: {}\nThought: {}",
            PREAMBLE,
            chat_history,
            self.catalog,
            SELECTION_AND_FORMAT.replace("{tool_names}", &self.tool_names),
            GUIDELINES,
            question,
            scratchpad
        )
    }
}
