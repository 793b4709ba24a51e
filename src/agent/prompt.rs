//! System prompt for the agent.

use crate::tools::ToolDeclaration;

/// Build the system instruction listing the available tools.
pub fn build_system_prompt(tools: &[ToolDeclaration]) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. You can perform the following operations:

{tool_descriptions}

## Rules

1. All paths you provide should be relative to the working directory.
2. You do not need to specify the working directory in your function calls; it is injected automatically for security reasons.
3. Read a file before changing it, unless you are creating a new one.
4. If a call fails, read the error and adapt your next call instead of repeating it.

When you have enough information, answer in plain text without calling any function."#,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ScriptConfig, ToolRegistry};

    #[test]
    fn prompt_lists_every_tool() {
        let registry = ToolRegistry::new(ScriptConfig::default());
        let prompt = build_system_prompt(&registry.declarations());

        for name in ["get_files_info", "get_file_content", "write_file", "run_python_file"] {
            assert!(prompt.contains(&format!("**{}**", name)), "missing {name}");
        }
        assert!(prompt.contains("relative to the working directory"));
    }
}
