//! Normalizes tool execution into a uniform event sequence
//!
//! Whatever a tool implementation does (single value, step sequence,
//! error, or misbehavior), the invoker produces zero or more `Step`
//! events followed by exactly one `Final` event.
//! Failures never propagate to the surrounding stream.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::error::ToolError;
use crate::event::{ToolEvent, ToolFinal};
use crate::registry::{ToolOutput, ToolRegistry};

/// Invoke a tool by name, producing a normalized event sequence
///
/// An unknown name or execution failure becomes an error-shaped final
/// event rather than an error; callers never need to special-case
/// missing or failing tools.
pub fn invoke(
    registry: Arc<ToolRegistry>,
    name: String,
    args: serde_json::Map<String, Value>,
) -> Pin<Box<dyn Stream<Item = ToolEvent> + Send>> {
    Box::pin(async_stream::stream! {
        let handler = match registry.resolve(&name) {
            Ok(definition) => Arc::clone(&definition.handler),
            Err(err) => {
                tracing::warn!(tool = %name, "tool not registered");
                yield ToolEvent::Final(ToolFinal::from(&err));
                return;
            }
        };

        let output = match handler.call(args).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "tool execution failed");
                yield ToolEvent::Final(ToolFinal::from(&err));
                return;
            }
        };

        match output {
            ToolOutput::Final(final_result) => {
                yield ToolEvent::Final(final_result);
            }
            ToolOutput::Stream(mut events) => {
                let mut finished = false;
                while let Some(event) = events.next().await {
                    let is_final = event.is_final();
                    yield event;
                    if is_final {
                        // At most one final per call; trailing items are dropped
                        finished = true;
                        break;
                    }
                }

                if !finished {
                    tracing::warn!(tool = %name, "tool ended without a final result");
                    let err = ToolError::Execution(format!("tool '{name}' produced no final result"));
                    yield ToolEvent::Final(ToolFinal::from(&err));
                }
            }
        }
    })
}
