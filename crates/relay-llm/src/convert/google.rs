//! Conversion between internal types and the Google wire format

use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionDeclaration, GoogleFunctionResponse, GoogleGenerationConfig,
    GoogleInlineData, GooglePart, GoogleRequest, GoogleStreamChunk, GoogleTool,
};
use crate::protocol::google::GoogleFileData;
use crate::provider::ProviderRequest;
use crate::types::{
    ContentPart, HistoryContent, HistoryMessage, ProviderEvent, Role, ToolCallFragment, UsageMetadata,
};

// -- Outbound: internal request -> Google wire request --

/// Render a provider request in Google wire format
///
/// System messages collapse into a single `system_instruction`; tool
/// results become `functionResponse` parts under role `function`.
pub fn build_request(request: &ProviderRequest) -> GoogleRequest {
    let mut system_texts = Vec::new();
    let mut contents = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System => system_texts.push(msg.content.as_text()),
            Role::User => contents.push(GoogleContent {
                role: Some("user".to_owned()),
                parts: content_to_parts(&msg.content),
            }),
            Role::Assistant => {
                let mut parts = Vec::new();
                let text = msg.content.as_text();
                if !text.is_empty() {
                    parts.push(GooglePart::Text(text));
                }
                for call in &msg.tool_calls {
                    parts.push(GooglePart::FunctionCall(GoogleFunctionCall {
                        name: call.name.clone(),
                        args: serde_json::from_str(&call.arguments)
                            .unwrap_or(serde_json::Value::Object(serde_json::Map::new())),
                    }));
                }
                if !parts.is_empty() {
                    contents.push(GoogleContent {
                        role: Some("model".to_owned()),
                        parts,
                    });
                }
            }
            Role::Tool => {
                // Google associates responses by function name, not call id
                let name = msg
                    .tool_name
                    .clone()
                    .or_else(|| msg.tool_call_id.clone())
                    .unwrap_or_default();
                let response = serde_json::from_str(&msg.content.as_text()).unwrap_or_else(|_| {
                    serde_json::json!({ "content": msg.content.as_text() })
                });
                contents.push(GoogleContent {
                    role: Some("function".to_owned()),
                    parts: vec![GooglePart::FunctionResponse(GoogleFunctionResponse { name, response })],
                });
            }
        }
    }

    let system_instruction = if system_texts.is_empty() {
        None
    } else {
        Some(GoogleContent {
            role: None,
            parts: vec![GooglePart::Text(system_texts.join("\n"))],
        })
    };

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(vec![GoogleTool {
            function_declarations: request
                .tools
                .iter()
                .map(|t| GoogleFunctionDeclaration {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: Some(t.parameters.clone()),
                })
                .collect(),
        }])
    };

    GoogleRequest {
        contents,
        system_instruction,
        generation_config: request.max_output_tokens.map(|max_output_tokens| GoogleGenerationConfig {
            max_output_tokens: Some(max_output_tokens),
        }),
        tools,
    }
}

fn content_to_parts(content: &HistoryContent) -> Vec<GooglePart> {
    match content {
        HistoryContent::Text(text) => vec![GooglePart::Text(text.clone())],
        HistoryContent::Parts(parts) => parts.iter().map(part_to_google).collect(),
    }
}

fn part_to_google(part: &ContentPart) -> GooglePart {
    match part {
        ContentPart::Text { text } => GooglePart::Text(text.clone()),
        ContentPart::Image { url } => match parse_data_uri(url) {
            Some((mime_type, data)) => GooglePart::InlineData(GoogleInlineData { mime_type, data }),
            // Bare URLs cannot be inlined; pass them through as text
            None => GooglePart::Text(url.clone()),
        },
        ContentPart::FileRef { uri, mime_type } => GooglePart::FileData(GoogleFileData {
            mime_type: mime_type.clone(),
            file_uri: uri.clone(),
        }),
    }
}

/// Split `data:<mime>;base64,<payload>` into its components
fn parse_data_uri(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:")?;
    let (mime_type, payload) = rest.split_once(";base64,")?;
    Some((mime_type.to_owned(), payload.to_owned()))
}

// -- Inbound: Google stream chunk -> tagged events --

/// Decode one Google streaming chunk into internal events
///
/// Function-call parts never carry a call id or slot index; each part is
/// a complete call, so a completion signal follows immediately to make
/// execution uniform with the id-bearing family.
pub fn chunk_to_events(chunk: &GoogleStreamChunk) -> Vec<ProviderEvent> {
    let mut events = Vec::new();

    for candidate in &chunk.candidates {
        let mut saw_function_call = false;

        if let Some(content) = &candidate.content {
            for part in &content.parts {
                match part {
                    GooglePart::Text(text) => {
                        if !text.is_empty() {
                            events.push(ProviderEvent::Content(text.clone()));
                        }
                    }
                    GooglePart::FunctionCall(call) => {
                        saw_function_call = true;
                        events.push(ProviderEvent::ToolCallFragment(ToolCallFragment {
                            index: None,
                            id: None,
                            name: Some(call.name.clone()),
                            arguments: serde_json::to_string(&call.args).unwrap_or_else(|_| "{}".to_owned()),
                        }));
                    }
                    GooglePart::InlineData(_) | GooglePart::FileData(_) | GooglePart::FunctionResponse(_) => {}
                }
            }
        }

        if saw_function_call {
            events.push(ProviderEvent::Completion { tool_calls: true });
        } else if let Some(reason) = &candidate.finish_reason
            && reason == "STOP"
        {
            events.push(ProviderEvent::Completion { tool_calls: false });
        }
    }

    if let Some(usage) = &chunk.usage_metadata {
        events.push(ProviderEvent::Usage(UsageMetadata {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        }));
    }

    events
}
