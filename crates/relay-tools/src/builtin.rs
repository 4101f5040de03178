//! Built-in tools registered at startup

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::event::{ToolEvent, ToolFinal, ToolStep};
use crate::registry::{Tool, ToolDefinition, ToolOutput, ToolRegistry};

/// Build the default registry containing every built-in tool
///
/// # Panics
///
/// Panics if built-in tool names collide, which would be a programming
/// error caught by the unit tests below.
pub fn default_registry() -> Arc<ToolRegistry> {
    let mut builder = ToolRegistry::builder();

    builder
        .register(ToolDefinition {
            name: "get_current_time".to_owned(),
            description: "Get the current date and time in a given timezone".to_owned(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "IANA timezone name, e.g. UTC or Asia/Shanghai"
                    }
                },
                "required": []
            }),
            handler: Arc::new(CurrentTime),
        })
        .expect("built-in names are unique");

    builder
        .register(ToolDefinition {
            name: "echo".to_owned(),
            description: "Return the given text unchanged; useful for connectivity checks".to_owned(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            }),
            handler: Arc::new(Echo),
        })
        .expect("built-in names are unique");

    builder.build()
}

/// Progressive clock tool
///
/// Reports three progress steps before resolving the time so clients
/// exercise the full step/final event path.
struct CurrentTime;

#[async_trait]
impl Tool for CurrentTime {
    async fn call(&self, args: serde_json::Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let timezone = args
            .get("timezone")
            .and_then(Value::as_str)
            .unwrap_or("UTC")
            .to_owned();

        let events = async_stream::stream! {
            for (step, progress, message) in [
                (1, 25, "resolving timezone"),
                (2, 50, "reading system clock"),
                (3, 75, "formatting result"),
            ] {
                yield ToolEvent::Step(ToolStep {
                    step,
                    message: message.to_owned(),
                    progress,
                    data: None,
                });
            }

            let tz = jiff::tz::TimeZone::get(&timezone)
                .unwrap_or(jiff::tz::TimeZone::UTC);
            let now = jiff::Timestamp::now().to_zoned(tz);
            let formatted = now.strftime("%Y-%m-%d %H:%M:%S %Z").to_string();

            yield ToolEvent::Final(ToolFinal::success(
                serde_json::json!({ "timezone": timezone, "time": formatted }),
                format!("current time in {timezone}: {formatted}"),
            ));
        };

        Ok(ToolOutput::Stream(Box::pin(events)))
    }
}

/// Synchronous echo tool
struct Echo;

#[async_trait]
impl Tool for Echo {
    async fn call(&self, args: serde_json::Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Execution("missing required argument 'text'".to_owned()))?;

        Ok(ToolOutput::Final(ToolFinal::success(
            serde_json::json!({ "text": text }),
            text.to_owned(),
        )))
    }
}
