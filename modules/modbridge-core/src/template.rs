use anyhow::{bail, Result};
use std::collections::HashMap;

/// Substitute `{Token}` placeholders from a context map.
///
/// Unknown tokens are left as-is so a typo in a configured template shows
/// up verbatim in the rendered output instead of vanishing. `{{` and `}}`
/// emit literal braces.
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' {
            if chars.peek() == Some(&'{') {
                chars.next();
                result.push('{');
                continue;
            }

            let mut token = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => token.push(ch),
                    None => {
                        // Malformed, emit what we have
                        result.push('{');
                        result.push_str(&token);
                        return result;
                    }
                }
            }

            let token = token.trim();
            if let Some(value) = vars.get(token) {
                result.push_str(value);
            } else {
                // Unknown token, leave as-is
                result.push('{');
                result.push_str(token);
                result.push('}');
            }
        } else if c == '}' && chars.peek() == Some(&'}') {
            chars.next();
            result.push('}');
        } else {
            result.push(c);
        }
    }

    result
}

/// Validate that every `{Token}` in a template is in the allowed set.
/// Run at config load so a bad template fails startup, not a cycle.
pub fn validate(template: &str, allowed: &[&str]) -> Result<()> {
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' {
            if chars.peek() == Some(&'{') {
                chars.next();
                continue;
            }

            let mut token = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => token.push(ch),
                    None => bail!("Unclosed template token: {{{}", token),
                }
            }

            let token = token.trim();
            if !allowed.contains(&token) {
                bail!(
                    "Unknown template token: {{{}}}. Allowed tokens: {:?}",
                    token,
                    allowed
                );
            }
        } else if c == '}' && chars.peek() == Some(&'}') {
            chars.next();
        }
    }

    Ok(())
}
