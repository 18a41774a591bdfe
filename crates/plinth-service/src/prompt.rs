//! Prompt template rendering.
//!
//! Templates use `{{name}}` placeholders. Rendering merges the version's
//! defaults with request variables (request wins); a placeholder with no
//! value in either map is an error the caller must see. Unknown variables
//! passed by the caller are ignored.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Rendering failure: placeholders with no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing template variables: {}", missing.join(", "))]
pub struct RenderError {
    /// Placeholder names that had no value.
    pub missing: Vec<String>,
}

/// Extracts the distinct placeholder names of a template, in order of first
/// appearance.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    for capture in PLACEHOLDER.captures_iter(template) {
        let name = capture[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Renders a template by substituting `{{name}}` placeholders.
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, RenderError> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER.replace_all(template, |capture: &regex::Captures<'_>| {
        let name = &capture[1];
        match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                let name = name.to_string();
                if !missing.contains(&name) {
                    missing.push(name);
                }
                // Left unresolved; the error below carries the names.
                capture[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(RenderError { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_placeholders() {
        let rendered = render_template(
            "You are {{name}}, an assistant for {{company}}.",
            &vars(&[("name", "Plinth"), ("company", "Acme")]),
        )
        .unwrap();
        assert_eq!(rendered, "You are Plinth, an assistant for Acme.");
    }

    #[test]
    fn tolerates_whitespace_in_braces() {
        let rendered = render_template("Hello {{ name }}!", &vars(&[("name", "Ada")])).unwrap();
        assert_eq!(rendered, "Hello Ada!");
    }

    #[test]
    fn missing_variables_are_an_error() {
        let err = render_template(
            "{{greeting}}, {{name}}! Welcome to {{company}}.",
            &vars(&[("name", "Ada")]),
        )
        .unwrap_err();
        assert_eq!(err.missing, vec!["greeting", "company"]);
    }

    #[test]
    fn extraction_round_trips_used_variables() {
        let template = "{{a}} and {{b}}, then {{a}} again.";
        let names = extract_placeholders(template);
        assert_eq!(names, vec!["a", "b"]);

        // Rendering with exactly the extracted variables succeeds, and the
        // rendered output contains no remaining placeholders.
        let rendered = render_template(template, &vars(&[("a", "x"), ("b", "y")])).unwrap();
        assert!(extract_placeholders(&rendered).is_empty());
    }

    #[test]
    fn unknown_caller_variables_are_ignored() {
        let rendered = render_template(
            "Hello {{name}}.",
            &vars(&[("name", "Ada"), ("unused", "ignored")]),
        )
        .unwrap();
        assert_eq!(rendered, "Hello Ada.");
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let rendered = render_template("No variables here.", &HashMap::new()).unwrap();
        assert_eq!(rendered, "No variables here.");
    }
}
