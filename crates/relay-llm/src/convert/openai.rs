//! Conversion between internal types and the `OpenAI` wire format

use crate::protocol::openai::{
    OpenAiContent, OpenAiContentPart, OpenAiFunction, OpenAiFunctionCall, OpenAiImageUrl, OpenAiMessage,
    OpenAiRequest, OpenAiStreamChunk, OpenAiStreamOptions, OpenAiTool, OpenAiToolCall,
};
use crate::provider::ProviderRequest;
use crate::types::{ContentPart, HistoryContent, HistoryMessage, ProviderEvent, Role, ToolCallFragment, UsageMetadata};

// -- Outbound: internal request -> OpenAI wire request --

/// Render a provider request in `OpenAI` wire format
pub fn build_request(request: &ProviderRequest, model_id: &str) -> OpenAiRequest {
    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|t| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: t.name.clone(),
                        description: Some(t.description.clone()),
                        parameters: Some(t.parameters.clone()),
                    },
                })
                .collect(),
        )
    };

    OpenAiRequest {
        model: model_id.to_owned(),
        messages: request.messages.iter().map(message_to_openai).collect(),
        max_tokens: request.max_output_tokens,
        stream: Some(true),
        tools,
        stream_options: Some(OpenAiStreamOptions { include_usage: true }),
    }
}

/// Convert one history message to `OpenAI` shape
fn message_to_openai(msg: &HistoryMessage) -> OpenAiMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let content = match &msg.content {
        HistoryContent::Text(text) => Some(OpenAiContent::Text(text.clone())),
        HistoryContent::Parts(parts) => Some(OpenAiContent::Parts(parts.iter().map(part_to_openai).collect())),
    };

    let tool_calls = if msg.tool_calls.is_empty() {
        None
    } else {
        Some(
            msg.tool_calls
                .iter()
                .map(|tc| OpenAiToolCall {
                    id: tc.id.clone(),
                    tool_type: "function".to_owned(),
                    function: OpenAiFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect(),
        )
    };

    OpenAiMessage {
        role: role.to_owned(),
        content,
        tool_calls,
        tool_call_id: msg.tool_call_id.clone(),
    }
}

fn part_to_openai(part: &ContentPart) -> OpenAiContentPart {
    match part {
        ContentPart::Text { text } => OpenAiContentPart::Text { text: text.clone() },
        ContentPart::Image { url } => OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl { url: url.clone() },
        },
        // Remote refs are a Google-family concept; render the URI as text
        // so a mixed history still reaches the model
        ContentPart::FileRef { uri, .. } => OpenAiContentPart::Text {
            text: format!("[file: {uri}]"),
        },
    }
}

// -- Inbound: OpenAI stream chunk -> tagged events --

/// Decode one `OpenAI` streaming chunk into internal events
pub fn chunk_to_events(chunk: &OpenAiStreamChunk) -> Vec<ProviderEvent> {
    let mut events = Vec::new();

    for choice in &chunk.choices {
        if let Some(reasoning) = &choice.delta.reasoning_content
            && !reasoning.is_empty()
        {
            events.push(ProviderEvent::Reasoning(reasoning.clone()));
        }

        if let Some(content) = &choice.delta.content
            && !content.is_empty()
        {
            events.push(ProviderEvent::Content(content.clone()));
        }

        if let Some(tool_calls) = &choice.delta.tool_calls {
            for tc in tool_calls {
                events.push(ProviderEvent::ToolCallFragment(ToolCallFragment {
                    index: tc.index,
                    id: tc.id.clone(),
                    name: tc.function.as_ref().and_then(|f| f.name.clone()),
                    arguments: tc
                        .function
                        .as_ref()
                        .and_then(|f| f.arguments.clone())
                        .unwrap_or_default(),
                }));
            }
        }

        if let Some(reason) = &choice.finish_reason {
            events.push(ProviderEvent::Completion {
                tool_calls: reason == "tool_calls",
            });
        }
    }

    if let Some(usage) = &chunk.usage {
        events.push(ProviderEvent::Usage(UsageMetadata {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }));
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolSchema;

    fn chunk(raw: serde_json::Value) -> OpenAiStreamChunk {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn content_delta_decodes() {
        let events = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {"content": "He"}}]
        })));

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProviderEvent::Content(text) if text == "He"));
    }

    #[test]
    fn empty_content_delta_is_dropped() {
        let events = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {"content": ""}, "finish_reason": "stop"}]
        })));

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProviderEvent::Completion { tool_calls: false }));
    }

    #[test]
    fn reasoning_delta_is_distinct_from_content() {
        let events = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {"reasoning_content": "thinking", "content": "answer"}}]
        })));

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ProviderEvent::Reasoning(t) if t == "thinking"));
        assert!(matches!(&events[1], ProviderEvent::Content(t) if t == "answer"));
    }

    #[test]
    fn split_tool_call_fragments_decode() {
        // First chunk carries {id, name}, second only {index, arguments}
        let first = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_1", "function": {"name": "get_current_time", "arguments": ""}}
            ]}}]
        })));
        let second = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "{\"timezone\": \"UTC\"}"}}
            ]}}]
        })));

        let ProviderEvent::ToolCallFragment(f1) = &first[0] else {
            panic!("expected fragment");
        };
        assert_eq!(f1.id.as_deref(), Some("call_1"));
        assert_eq!(f1.name.as_deref(), Some("get_current_time"));

        let ProviderEvent::ToolCallFragment(f2) = &second[0] else {
            panic!("expected fragment");
        };
        assert!(f2.id.is_none());
        assert_eq!(f2.index, Some(0));
        assert_eq!(f2.arguments, "{\"timezone\": \"UTC\"}");
    }

    #[test]
    fn tool_calls_finish_reason_signals_completion() {
        let events = chunk_to_events(&chunk(serde_json::json!({
            "choices": [{"delta": {}, "finish_reason": "tool_calls"}]
        })));

        assert!(matches!(events[0], ProviderEvent::Completion { tool_calls: true }));
    }

    #[test]
    fn trailing_usage_decodes() {
        let events = chunk_to_events(&chunk(serde_json::json!({
            "choices": [],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
        })));

        let ProviderEvent::Usage(usage) = &events[0] else {
            panic!("expected usage");
        };
        assert_eq!(usage.total_tokens, 12);
    }

    #[test]
    fn request_includes_tools_and_stream_options() {
        let request = ProviderRequest {
            messages: vec![HistoryMessage::text(Role::User, "hi")],
            tools: vec![ToolSchema {
                name: "echo".to_owned(),
                description: "echo".to_owned(),
                parameters: serde_json::json!({}),
            }],
            max_output_tokens: Some(256),
        };

        let wire = build_request(&request, "grok-2-latest");
        assert_eq!(wire.model, "grok-2-latest");
        assert_eq!(wire.stream, Some(true));
        assert_eq!(wire.max_tokens, Some(256));
        assert_eq!(wire.tools.as_ref().unwrap().len(), 1);
    }
}
