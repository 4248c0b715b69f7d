//! Input parsing and text helpers shared by the leaf tools

use serde_json::{Map, Value};

/// Tool input: a plain query, or a JSON object of options.
#[derive(Debug, Clone, Default)]
pub struct ToolInput {
    pub query: String,
    pub options: Map<String, Value>,
}

impl ToolInput {
    /// Parse raw reasoning-engine input.
    ///
    /// Input starting with `{` that parses as an object supplies options and
    /// its `query` field; anything else is the query itself.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.starts_with('{') {
            if let Ok(Value::Object(options)) = serde_json::from_str::<Value>(trimmed) {
                let query = options
                    .get("query")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim()
                    .to_string();
                return Self { query, options };
            }
        }

        Self {
            query: strip_quotes(trimmed).to_string(),
            options: Map::new(),
        }
    }

    pub fn str_opt(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn usize_opt(&self, key: &str) -> Option<usize> {
        match self.options.get(key)? {
            Value::Number(n) => n.as_u64().map(|v| v as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn f64_opt(&self, key: &str) -> Option<f64> {
        match self.options.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool_opt(&self, key: &str) -> Option<bool> {
        match self.options.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Requested result count, defaulting and capping
    pub fn max_results(&self, default: usize, cap: usize) -> usize {
        self.usize_opt("max_results").unwrap_or(default).clamp(1, cap)
    }
}

/// Remove one layer of matching quotes the model may wrap input in
pub fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

/// Keep at most `max` characters, appending `...` when cut
pub fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Strip HTML tags, returning plain decoded text
pub fn strip_html_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    html_decode(out.trim())
}

/// Decode the common HTML entities and CDATA wrappers
pub fn html_decode(s: &str) -> String {
    let s = s
        .trim()
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .unwrap_or(s);

    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Collapse all whitespace runs into single spaces
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// printf-style `%g`: `precision` significant digits, trailing zeros removed,
/// scientific notation for very large or small magnitudes
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
