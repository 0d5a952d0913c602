//! Placeholder substitution engine.
//!
//! Templates are UTF-8 text with `{key}` tags. Every tag must name a key of
//! the data context; all problems in a template are collected and returned
//! together so the user can fix them in one pass.

use super::{DataContext, RenderFailure, TemplateEngine};

const OPEN: char = '{';
const CLOSE: char = '}';

/// Substitutes `{key}` tags with context values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    /// Create an engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, template: &[u8], context: &DataContext) -> Result<Vec<u8>, RenderFailure> {
        let text = std::str::from_utf8(template)
            .map_err(|e| RenderFailure::new(format!("template is not UTF-8 text: {e}")))?;

        let mut output = String::with_capacity(text.len());
        let mut reasons = Vec::new();
        let mut tag_start: Option<usize> = None;

        for (offset, c) in text.char_indices() {
            match (tag_start, c) {
                (None, OPEN) => tag_start = Some(offset),
                (None, CLOSE) => reasons.push(format!("unopened tag at byte {offset}")),
                (None, _) => output.push(c),
                (Some(start), OPEN) => {
                    reasons.push(format!(
                        "duplicate open tag at byte {offset} (tag opened at byte {start})"
                    ));
                    tag_start = Some(offset);
                }
                (Some(start), CLOSE) => {
                    let key = text[start + OPEN.len_utf8()..offset].trim();
                    if key.is_empty() {
                        reasons.push(format!("empty tag at byte {start}"));
                    } else if let Some(value) = context.get(key) {
                        output.push_str(value);
                    } else {
                        reasons.push(format!("unknown tag '{key}' at byte {start}"));
                    }
                    tag_start = None;
                }
                (Some(_), _) => {}
            }
        }

        if let Some(start) = tag_start {
            reasons.push(format!("unclosed tag at byte {start}"));
        }

        if reasons.is_empty() {
            Ok(output.into_bytes())
        } else {
            Err(RenderFailure { reasons })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> DataContext {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn render(template: &str, pairs: &[(&str, &str)]) -> Result<String, RenderFailure> {
        PlaceholderEngine::new()
            .render(template.as_bytes(), &context(pairs))
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_substitutes_tags() {
        let out = render(
            "Значение: {metric_value}, дата: { current_date }",
            &[("metric_value", "42"), ("current_date", "от «05» марта 2026 г.")],
        )
        .unwrap();
        assert_eq!(out, "Значение: 42, дата: от «05» марта 2026 г.");
    }

    #[test]
    fn test_text_without_tags_passes_through() {
        assert_eq!(render("plain", &[]).unwrap(), "plain");
    }

    #[test]
    fn test_unknown_tag() {
        let failure = render("{missing}", &[]).unwrap_err();
        assert_eq!(failure.reasons, vec!["unknown tag 'missing' at byte 0"]);
    }

    #[test]
    fn test_collects_every_problem() {
        let failure = render("} {} {a {b", &[("a", "1")]).unwrap_err();
        assert_eq!(failure.reasons.len(), 4);
        assert!(failure.reasons[0].starts_with("unopened tag"));
        assert!(failure.reasons[1].starts_with("empty tag"));
        assert!(failure.reasons[2].starts_with("duplicate open tag"));
        assert!(failure.reasons[3].starts_with("unclosed tag"));
    }

    #[test]
    fn test_rejects_binary_template() {
        let failure = PlaceholderEngine::new()
            .render(&[0xff, 0xfe, 0x00], &DataContext::new())
            .unwrap_err();
        assert!(failure.reasons[0].contains("UTF-8"));
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let out = render("{a}", &[("a", "{b}")]).unwrap();
        assert_eq!(out, "{b}");
    }
}
