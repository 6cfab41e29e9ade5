//! Prompt templates for a tool-routing turn

use crate::tool::entities::ToolDefinition;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt for the router: pick one tool name or `none`
    ///
    /// `tools` are `(name, description)` pairs in registration order and
    /// `history` is the rendered trailing window, ending with the user's
    /// latest utterance.
    pub fn router_prompt(tools: &[(&str, &str)], history: &str) -> String {
        let mut prompt = String::from(
            r#"You are a dispatcher deciding whether the user's latest message requires one of the tools below.

Available tools:
"#,
        );

        for (name, description) in tools {
            prompt.push_str(&format!("- {}: {}\n", name, description));
        }

        prompt.push_str(&format!(
            r#"
Conversation:
{}

Reply with exactly one tool name from the list above, or `none` if no tool applies.
Do not explain your answer."#,
            history
        ));

        prompt
    }

    /// Prompt for argument extraction: a JSON object matching the schema
    pub fn extraction_prompt(definition: &ToolDefinition, history: &str) -> String {
        let mut prompt = format!(
            r#"Extract the arguments for the tool `{}` from the conversation.

Tool description: {}

Arguments:
"#,
            definition.name, definition.description
        );

        if definition.parameters.is_empty() {
            prompt.push_str("(none)\n");
        }
        for param in &definition.parameters {
            let required = if param.required { "required" } else { "optional" };
            prompt.push_str(&format!(
                "- {} ({}, {}): {}\n",
                param.name, param.arg_type, required, param.description
            ));
        }

        prompt.push_str(&format!(
            r#"
Conversation:
{}

Respond with a single JSON object whose keys are the argument names above.
Omit optional arguments the user did not mention. Output only the JSON object."#,
            history
        ));

        prompt
    }

    /// Prompt that rephrases a tool's raw output as a reply
    pub fn finalize_prompt(
        tool_name: &str,
        raw_output: &str,
        utterance: &str,
        language: &str,
    ) -> String {
        format!(
            r#"The user asked: {}

The tool `{}` returned:
{}

Write a short, natural reply to the user in {} based only on the tool result.
Keep all numbers, identifiers and names exactly as returned."#,
            utterance, tool_name, raw_output, language
        )
    }

    /// Prompt for plain conversation when no tool applies
    pub fn fallback_prompt(preamble: &str, history: &str, utterance: &str) -> String {
        let mut prompt = format!("{}\n\n", preamble.trim());
        if !history.is_empty() {
            prompt.push_str(&format!("Conversation so far:\n{}\n\n", history));
        }
        prompt.push_str(&format!("user: {}\nassistant:", utterance));
        prompt
    }
}
