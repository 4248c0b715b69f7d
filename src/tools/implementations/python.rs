//! Python code execution in a `python3` subprocess
//!
//! The code is fed on stdin to a small driver that evaluates a single
//! expression (printing its repr) or executes statements. Agent code sees a
//! fixed set of builtins and pre-imported modules only. The process is
//! killed when the timeout elapses.

use crate::errors::{AgentError, Result};
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Maximum characters of output returned
pub const MAX_OUTPUT_LENGTH: usize = 10_000;

/// Evaluates stdin with allow-listed builtins only: no `open`, no `__import__`
const DRIVER: &str = r#"
import sys, builtins, math, statistics, datetime, json, re, random, collections, itertools, functools
_allowed = (
    "abs", "all", "any", "bin", "bool", "bytes", "chr", "dict", "divmod", "enumerate",
    "filter", "float", "format", "frozenset", "hex", "int", "isinstance", "iter", "len",
    "list", "map", "max", "min", "next", "oct", "ord", "pow", "print", "range", "repr",
    "reversed", "round", "set", "slice", "sorted", "str", "sum", "tuple", "type", "zip",
)
_env = {"__builtins__": {name: getattr(builtins, name) for name in _allowed}}
for _module in (math, statistics, datetime, json, re, random, collections, itertools, functools):
    _env[_module.__name__] = _module
_src = sys.stdin.read()
try:
    _code = compile(_src, "<agent>", "eval")
except SyntaxError:
    exec(compile(_src, "<agent>", "exec"), _env)
else:
    _value = eval(_code, _env)
    if _value is not None:
        print(repr(_value))
"#;

/// Python REPL tool
#[derive(Debug, Clone)]
pub struct PythonReplTool {
    context: Arc<ToolContext>,
}

impl PythonReplTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

/// Remove a surrounding markdown code fence
pub fn strip_code_fence(code: &str) -> &str {
    let trimmed = code.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("python")
        .or_else(|| rest.strip_prefix("py"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Turn process output into the observation text
pub fn render_output(success: bool, stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();

    let output = if !success {
        let last = stderr.lines().last().unwrap_or("unknown error");
        format!("Execution Error: {}", last)
    } else if !stderr.is_empty() {
        format!("Output:\n{}\n\nWarnings:\n{}", stdout, stderr)
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        "Code executed successfully (no output)".to_string()
    };

    if output.chars().count() > MAX_OUTPUT_LENGTH {
        let mut clipped: String = output.chars().take(MAX_OUTPUT_LENGTH).collect();
        clipped.push_str(&format!(
            "\n\n[Output truncated - exceeded {} characters]",
            MAX_OUTPUT_LENGTH
        ));
        clipped
    } else {
        output
    }
}

#[async_trait]
impl Tool for PythonReplTool {
    fn name(&self) -> &str {
        "python_repl"
    }

    fn description(&self) -> &str {
        "Execute Python code and return the output. Use this for complex calculations, \
         data manipulation, string processing, working with lists/dicts, or any task \
         that requires programming logic.\n\n\
         AVAILABLE MODULES: math, statistics, datetime, json, re, random, \
         collections, itertools, functools (pre-imported; import statements, \
         open and file access are not available).\n\n\
         LIMITS: 5 second timeout, 10,000 character output limit.\n\n\
         EXAMPLES:\n- 'sum([1,2,3,4,5])'\n- '[x**2 for x in range(10)]'\n\
         - 'sorted([3,1,4,1,5,9], reverse=True)'"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::CodeExecution
    }

    async fn call(&self, query: &str) -> Result<String> {
        let code = strip_code_fence(query);
        if code.is_empty() {
            return Err(AgentError::InvalidInput("No code provided.".to_string()));
        }

        let mut child = Command::new("python3")
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::tool("python_repl", format!("failed to start python3: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        let limit = self.context.python_timeout;
        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(render_output(
                output.status.success(),
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            )),
            Ok(Err(e)) => Err(AgentError::IoError(e)),
            Err(_) => Ok(format!(
                "Timeout Error: Code execution exceeded {} seconds. The operation was too slow or contains an infinite loop.",
                limit.as_secs()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fence("  1 + 1 "), "1 + 1");
    }

    #[test]
    fn test_render_success() {
        assert_eq!(render_output(true, "15\n", ""), "15");
        assert_eq!(
            render_output(true, "", ""),
            "Code executed successfully (no output)"
        );
        assert!(render_output(true, "1", "DeprecationWarning").starts_with("Output:\n1"));
    }

    #[test]
    fn test_render_error_uses_last_line() {
        let stderr = "Traceback (most recent call last):\n  File \"<agent>\", line 1\nZeroDivisionError: division by zero\n";
        assert_eq!(
            render_output(false, "", stderr),
            "Execution Error: ZeroDivisionError: division by zero"
        );
    }

    #[test]
    fn test_render_truncates() {
        let long = "x".repeat(MAX_OUTPUT_LENGTH + 10);
        let text = render_output(true, &long, "");
        assert!(text.ends_with("[Output truncated - exceeded 10000 characters]"));
    }

    fn tool() -> PythonReplTool {
        PythonReplTool::new(Arc::new(ToolContext::new().unwrap()))
    }

    #[tokio::test]
    async fn test_expression_with_preloaded_module() {
        let output = tool().call("math.sqrt(16) + sum([1, 2])").await.unwrap();
        assert_eq!(output, "7.0");
    }

    #[tokio::test]
    async fn test_imports_are_blocked() {
        let output = tool().call("__import__('os').getcwd()").await.unwrap();
        assert!(output.starts_with("Execution Error: NameError"), "{}", output);

        let output = tool().call("import os\nprint(os.getcwd())").await.unwrap();
        assert!(output.starts_with("Execution Error: ImportError"), "{}", output);
    }

    #[tokio::test]
    async fn test_file_access_is_blocked() {
        let output = tool().call("open('/etc/hostname').read()").await.unwrap();
        assert_eq!(output, "Execution Error: NameError: name 'open' is not defined");
    }
}
