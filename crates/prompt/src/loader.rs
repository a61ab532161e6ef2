//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use std::path::Path;
use tutor_core::{AppError, AppResult};

/// Built-in tutor prompt, used when the workspace does not override it.
const DEFAULT_PROMPT_YAML: &str = include_str!("../prompts/tutor.answer.default.yml");

/// Id of the built-in tutor prompt.
pub const DEFAULT_PROMPT_ID: &str = "tutor.answer.default";

/// Load a prompt definition by ID.
///
/// Looks for `<id>.yml` in the workspace's `.tutor/prompts/` directory first.
/// When no such file exists and `prompt_id` is the built-in id, the bundled
/// tutor prompt is returned.
///
/// # Example
/// ```no_run
/// use tutor_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "tutor.answer.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".tutor/prompts")
        .join(format!("{}.yml", prompt_id));

    tracing::debug!("Looking for prompt at: {:?}", prompt_file);

    if !prompt_file.exists() {
        if prompt_id == DEFAULT_PROMPT_ID {
            tracing::debug!("Using built-in prompt {}", DEFAULT_PROMPT_ID);
            return default_prompt();
        }

        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents)
        .map_err(|e| AppError::Prompt(format!("{:?}: {}", prompt_file, e)))?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// The bundled tutor prompt.
pub fn default_prompt() -> AppResult<PromptDefinition> {
    parse_prompt(DEFAULT_PROMPT_YAML)
}

fn parse_prompt(contents: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;

    validate_prompt(&definition)?;

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if def.fallback.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt fallback line cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for placeholder in ["{{question}}", "{{context}}"] {
        if !def.template.contains(placeholder) {
            return Err(AppError::Prompt(format!(
                "Prompt template must contain {}",
                placeholder
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(".tutor/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_default_prompt_is_valid() {
        let prompt = default_prompt().unwrap();
        assert_eq!(prompt.id, DEFAULT_PROMPT_ID);
        assert_eq!(prompt.fallback, "I'm not sure about that from this text.");
        assert!(prompt.template.contains("{{gradeLevel}}"));
        assert!(prompt.template.contains("{{fallback}}"));
    }

    #[test]
    fn test_builtin_used_when_no_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Science tutor answer");
    }

    #[test]
    fn test_workspace_override() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            DEFAULT_PROMPT_ID,
            r#"
id: tutor.answer.default
title: "Custom"
apiVersion: "1.0"
fallback: "Unknown."
template: "Q: {{question}} C: {{context}}"
"#,
        );

        let prompt = load_prompt(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Custom");
        assert_eq!(prompt.fallback, "Unknown.");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_template_without_context_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "no-context",
            r#"
id: no-context
title: "Broken"
apiVersion: "1.0"
fallback: "Unknown."
template: "Q: {{question}}"
"#,
        );

        let err = load_prompt(temp_dir.path(), "no-context").unwrap_err();
        assert!(err.to_string().contains("{{context}}"));
    }
}
