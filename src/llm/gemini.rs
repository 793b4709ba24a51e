//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::LlmError;
use super::types::{ModelResponse, Part, Role, TokenUsage, ToolCall, Turn};
use super::ModelClient;
use crate::tools::{render_result, ToolDeclaration};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(
        &self,
        system: &str,
        contents: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = build_request(system, contents, tools);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;
        into_model_response(parsed)
    }
}

/// Prefer the `error.message` field of a Gemini error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn build_request(
    system: &str,
    contents: &[Turn],
    tools: &[ToolDeclaration],
) -> GenerateContentRequest {
    let function_declarations: Vec<FunctionDeclaration> = tools
        .iter()
        .map(|t| FunctionDeclaration {
            name: t.name.as_str().to_string(),
            description: t.description.clone(),
            parameters: t.parameters_schema(),
        })
        .collect();

    GenerateContentRequest {
        system_instruction: Some(Content {
            role: None,
            parts: vec![WirePart::text(system)],
        }),
        contents: contents.iter().map(to_content).collect(),
        tools: if function_declarations.is_empty() {
            Vec::new()
        } else {
            vec![WireTool {
                function_declarations,
            }]
        },
    }
}

fn to_content(turn: &Turn) -> Content {
    // Gemini has no tool role; function responses are sent as user content.
    let role = match turn.role {
        Role::User | Role::Tool => "user",
        Role::Model => "model",
    };
    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::text(text),
            Part::ToolCall(call) => WirePart {
                function_call: Some(FunctionCall {
                    name: call.name.clone(),
                    args: Some(call.args.clone()),
                }),
                ..Default::default()
            },
            Part::ToolResponse(response) => {
                let body = match &response.result {
                    Ok(payload) => json!({ "result": payload }),
                    Err(_) => json!({ "error": render_result(&response.result) }),
                };
                WirePart {
                    function_response: Some(FunctionResponse {
                        name: response.name.clone(),
                        response: body,
                    }),
                    ..Default::default()
                }
            }
        })
        .collect();

    Content {
        role: Some(role.to_string()),
        parts,
    }
}

fn into_model_response(response: GenerateContentResponse) -> Result<ModelResponse, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::NoCandidates)?;

    let parts = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought.unwrap_or(false))
        .filter_map(|p| {
            if let Some(call) = p.function_call {
                Some(Part::ToolCall(ToolCall {
                    name: call.name,
                    args: call.args.unwrap_or_default(),
                }))
            } else {
                p.text.map(Part::Text)
            }
        })
        .collect();

    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count.unwrap_or(0),
        response_tokens: u.candidates_token_count.unwrap_or(0),
    });

    Ok(ModelResponse {
        turn: Turn::model(parts),
        usage,
    })
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl WirePart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolResponse;
    use crate::tools::{ScriptConfig, ToolError, ToolRegistry};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn request_carries_system_tools_and_conversation() {
        let registry = ToolRegistry::new(ScriptConfig::default());
        let contents = vec![
            Turn::user("what files are here?"),
            Turn::model(vec![Part::ToolCall(ToolCall {
                name: "get_files_info".to_string(),
                args: args(json!({ "directory": "." })),
            })]),
            Turn::tool(vec![ToolResponse {
                name: "get_files_info".to_string(),
                result: Ok("- main.py: file_size=10 bytes, is_dir=false".to_string()),
            }]),
        ];

        let body =
            serde_json::to_value(build_request("be helpful", &contents, &registry.declarations()))
                .unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert!(body["systemInstruction"].get("role").is_none());
        let decls = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(decls.len(), 4);
        assert_eq!(decls[0]["name"], "get_files_info");

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(
            body["contents"][1]["parts"][0]["functionCall"],
            json!({ "name": "get_files_info", "args": { "directory": "." } })
        );
        assert_eq!(body["contents"][2]["role"], "user");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["result"],
            "- main.py: file_size=10 bytes, is_dir=false"
        );
    }

    #[test]
    fn tool_errors_are_sent_as_error_responses() {
        let turn = Turn::tool(vec![ToolResponse {
            name: "get_file_content".to_string(),
            result: Err(ToolError::NotFound(
                "File not found or is not a regular file: \"x\"".to_string(),
            )),
        }]);

        let content = serde_json::to_value(to_content(&turn)).unwrap();
        assert_eq!(
            content["parts"][0]["functionResponse"]["response"],
            json!({ "error": "Error: File not found or is not a regular file: \"x\"" })
        );
    }

    #[test]
    fn response_maps_text_calls_and_usage() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "I'll run it." },
                        { "functionCall": { "name": "run_python_file", "args": { "file_path": "main.py" } } },
                        { "functionCall": { "name": "get_files_info" } }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 30, "totalTokenCount": 150 }
        });

        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let response = into_model_response(parsed).unwrap();

        assert_eq!(response.turn.role, Role::Model);
        assert_eq!(response.turn.text(), "I'll run it.");
        let calls: Vec<&ToolCall> = response.turn.tool_calls().collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, args(json!({ "file_path": "main.py" })));
        assert!(calls[1].args.is_empty());
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                prompt_tokens: 120,
                response_tokens: 30
            })
        );
    }

    #[test]
    fn blocked_candidate_yields_empty_turn() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] }))
                .unwrap();
        let response = into_model_response(parsed).unwrap();
        assert!(response.turn.parts.is_empty());
        assert!(response.usage.is_none());
    }

    #[test]
    fn no_candidates_is_an_error() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            into_model_response(parsed),
            Err(LlmError::NoCandidates)
        ));
    }

    #[test]
    fn api_error_message_prefers_error_field() {
        assert_eq!(
            api_error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }
}
