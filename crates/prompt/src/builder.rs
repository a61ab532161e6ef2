//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use tutor_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// The definition's fallback line is always available to the template as
/// `fallback`; caller variables win on conflicts.
///
/// # Example
/// ```no_run
/// use tutor_prompt::{build_prompt, default_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = default_prompt()?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is rancidity?".to_string());
/// vars.insert("context".to_string(), "Rancidity is ...".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    variables
        .entry("fallback".to_string())
        .or_insert_with(|| definition.fallback.clone());

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(rendered, definition.id.clone()))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_prompt;

    fn create_test_definition(template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            fallback: "Not in the text.".to_string(),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "2Mg + O2 -> 2MgO & <heat>".to_string());

        let result = render_template("{{context}}", &vars).unwrap();
        assert_eq!(result, "2Mg + O2 -> 2MgO & <heat>");
    }

    #[test]
    fn test_fallback_injected() {
        let def = create_test_definition("Q: {{question}} C: {{context}} F: {{fallback}}");
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Why?".to_string());
        vars.insert("context".to_string(), String::new());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.text, "Q: Why? C:  F: Not in the text.");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_default_prompt_renders_question_and_context() {
        let def = default_prompt().unwrap();
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is rancidity?".to_string());
        vars.insert("context".to_string(), "Oxidised fats smell bad.".to_string());
        vars.insert("gradeLevel".to_string(), "10th".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert!(built.text.contains("helping 10th-grade students"));
        assert!(built.text.contains("Question: What is rancidity?"));
        assert!(built.text.contains("Context: Oxidised fats smell bad."));
        assert!(built.text.contains("I'm not sure about that from this text."));
        assert!(built.text.trim_end().ends_with("Answer:"));
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        // Handlebars renders missing variables as empty string
        assert!(result.is_ok());
    }
}
