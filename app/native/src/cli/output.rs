//! CLI output formatting.

use colored::Colorize;

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", highlight_json(&json));
}

/// Colors a pretty-printed JSON document.
#[must_use]
pub fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut token = String::new();
    let mut in_string = false;
    let mut escape_next = false;
    let mut is_key = false;
    let mut after_colon = false;

    for ch in json.chars() {
        if in_string {
            token.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                let colored = if is_key { token.cyan() } else { token.green() };
                out.push_str(&colored.to_string());
                token.clear();
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                flush_scalar(&mut out, &mut token, after_colon);
                token.push(ch);
                in_string = true;
                is_key = !after_colon;
                after_colon = false;
            }
            ':' => {
                flush_scalar(&mut out, &mut token, false);
                out.push(':');
                after_colon = true;
            }
            ',' | '{' | '}' | '[' | ']' => {
                flush_scalar(&mut out, &mut token, after_colon);
                if ch == ',' {
                    out.push(',');
                } else {
                    out.push_str(&ch.to_string().bold().to_string());
                }
                after_colon = false;
            }
            _ => token.push(ch),
        }
    }

    flush_scalar(&mut out, &mut token, after_colon);
    out
}

/// Writes a pending bare token, coloring numbers and literals in value position.
fn flush_scalar(out: &mut String, token: &mut String, is_value: bool) {
    if token.is_empty() {
        return;
    }

    let start = token.find(|c: char| !c.is_whitespace()).unwrap_or(token.len());
    let end = token.rfind(|c: char| !c.is_whitespace()).map_or(start, |i| i + 1);
    let (prefix, value, suffix) = (&token[..start], &token[start..end], &token[end..]);

    out.push_str(prefix);
    if is_value && matches!(value, "true" | "false" | "null") {
        out.push_str(&value.magenta().to_string());
    } else if is_value && value.parse::<f64>().is_ok() {
        out.push_str(&value.yellow().to_string());
    } else {
        out.push_str(value);
    }
    out.push_str(suffix);

    token.clear();
}

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() { colored::control::set_override(false); }

    #[test]
    fn test_highlight_preserves_text_without_colors() {
        plain();
        let json = "{\n  \"id\": 42,\n  \"post_url\": null,\n  \"set_by\": \"Al\\\"ice\"\n}";
        assert_eq!(highlight_json(json), json);
    }

    #[test]
    fn test_highlight_handles_nested_arrays() {
        plain();
        let json = "[\n  1,\n  [\n    true\n  ]\n]";
        assert_eq!(highlight_json(json), json);
    }

    #[test]
    fn test_format_bool_true() {
        assert!(format_bool(true).contains('✓'));
    }

    #[test]
    fn test_format_bool_false() {
        assert!(format_bool(false).contains('✗'));
    }
}
