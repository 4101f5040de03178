//! Stream demultiplexing and tool orchestration
//!
//! Drives the provider round-trip loop for one chat request: pulls the
//! upstream event stream, separates answer text, reasoning, and tool
//! calls, executes requested tools mid-stream, folds their results back
//! into the conversation, and re-enters the provider until the model
//! finishes without requesting tools.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use relay_tools::{ToolEvent, ToolRegistry, invoker};
use tokio_util::sync::CancellationToken;

use crate::catalog::ResolvedModel;
use crate::error::LlmError;
use crate::provider::{ChatProvider, ProviderRequest};
use crate::types::{ChatEvent, HistoryMessage, ProviderEvent, ToolCallFragment, ToolCallRecord, ToolMessage};

/// Tool calls accumulated across the chunks of one provider turn
///
/// Providers address fragments three ways: an explicit call id, a
/// positional slot index, or neither (a bare arguments continuation, or
/// a complete named call). All three converge here into ordered calls.
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: Vec<PendingCall>,
}

#[derive(Debug)]
struct PendingCall {
    id: Option<String>,
    index: Option<u32>,
    name: String,
    arguments: String,
}

/// One call ready for execution after a turn's fragments are assembled
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    /// Call id, provider-supplied or synthesized from the slot
    pub id: String,
    /// Tool name
    pub name: String,
    /// Raw argument text as sent to the provider history
    pub raw_arguments: String,
    /// Parsed argument object
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl PendingCalls {
    /// Whether any call data has arrived this turn
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Fold one fragment into the pending set
    pub fn absorb(&mut self, fragment: ToolCallFragment) {
        // Explicit id wins; later fragments for the same call may drop it
        if let Some(id) = &fragment.id
            && let Some(call) = self.calls.iter_mut().find(|c| c.id.as_deref() == Some(id.as_str()))
        {
            if let Some(name) = fragment.name {
                call.name = name;
            }
            call.arguments.push_str(&fragment.arguments);
            return;
        }

        if fragment.id.is_none()
            && let Some(index) = fragment.index
            && let Some(call) = self.calls.iter_mut().find(|c| c.index == Some(index))
        {
            if let Some(name) = fragment.name {
                call.name = name;
            }
            call.arguments.push_str(&fragment.arguments);
            return;
        }

        // Unaddressed and unnamed fragments continue the newest call
        if fragment.id.is_none()
            && fragment.index.is_none()
            && fragment.name.is_none()
            && let Some(last) = self.calls.last_mut()
        {
            last.arguments.push_str(&fragment.arguments);
            return;
        }

        // The id-less regime repeats calls as stray artifacts within a
        // turn; a name already started this turn is never started again
        if fragment.id.is_none()
            && fragment.index.is_none()
            && let Some(name) = &fragment.name
            && self
                .calls
                .iter()
                .any(|c| c.id.is_none() && c.index.is_none() && c.name == *name)
        {
            tracing::debug!(tool = %name, "dropping duplicate tool call within one turn");
            return;
        }

        self.calls.push(PendingCall {
            id: fragment.id,
            index: fragment.index,
            name: fragment.name.unwrap_or_default(),
            arguments: fragment.arguments,
        });
    }

    /// Assemble accumulated fragments into executable calls
    ///
    /// Calls with unparseable arguments are skipped with a warning; one
    /// bad call never poisons its siblings.
    pub fn finish(self) -> Vec<ResolvedCall> {
        let mut resolved = Vec::with_capacity(self.calls.len());

        for (slot, call) in self.calls.into_iter().enumerate() {
            let id = call.id.unwrap_or_else(|| format!("call_{slot}"));
            if call.name.is_empty() {
                tracing::warn!(call_id = %id, "discarding tool call with no name");
                continue;
            }

            let raw = repair_arguments(&call.arguments);
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw) {
                Ok(arguments) => resolved.push(ResolvedCall {
                    id,
                    name: call.name,
                    raw_arguments: raw,
                    arguments,
                }),
                Err(e) => {
                    tracing::warn!(call_id = %id, tool = %call.name, error = %e, "discarding tool call with malformed arguments");
                }
            }
        }

        resolved
    }
}

/// Best-effort repair of truncated argument text
///
/// Streams cut mid-object commonly lose the outer braces; restoring
/// them salvages the frequent single-field case.
fn repair_arguments(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "{}".to_owned();
    }

    let mut repaired = trimmed.to_owned();
    if !repaired.starts_with('{') {
        repaired.insert(0, '{');
    }
    if !repaired.ends_with('}') {
        repaired.push('}');
    }
    repaired
}

/// Everything one orchestration run needs
pub struct ChatRun {
    /// Provider backing the resolved model
    pub provider: Arc<dyn ChatProvider>,
    /// The resolved model
    pub model: ResolvedModel,
    /// Normalized opening conversation
    pub request: ProviderRequest,
    /// Tools available this request
    pub registry: Arc<ToolRegistry>,
    /// Caller identity and headers
    pub context: relay_core::RequestContext,
    /// Cancels mid-stream work when the client disconnects
    pub cancel: CancellationToken,
    /// Provider round-trip ceiling
    pub max_round_trips: u32,
}

/// Run the demultiplexing loop, yielding client events in order
///
/// The stream terminates after the model's final turn, after an
/// `Error` event, or silently on cancellation.
pub fn run_chat(run: ChatRun) -> impl Stream<Item = ChatEvent> + Send {
    async_stream::stream! {
        let ChatRun {
            provider,
            model,
            mut request,
            registry,
            context,
            cancel,
            max_round_trips,
        } = run;

        let mut tool_messages: Vec<ToolMessage> = Vec::new();

        for round in 0.. {
            if round >= max_round_trips {
                tracing::warn!(model = %model.model_id, round, "tool round-trip limit reached");
                yield ChatEvent::Error("tool round-trip limit exceeded".to_owned());
                return;
            }

            let mut upstream = match provider.stream_chat(&model.model_id, &request, &context).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(model = %model.model_id, error = %e, "failed to open provider stream");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };

            let mut pending = PendingCalls::default();
            let mut assistant_text = String::new();
            let mut execute_tools = false;

            loop {
                let event = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        tracing::debug!(model = %model.model_id, "chat cancelled mid-stream");
                        return;
                    }
                    event = upstream.next() => event,
                };

                match event {
                    Some(Ok(ProviderEvent::Content(text))) => {
                        assistant_text.push_str(&text);
                        yield ChatEvent::Content(text);
                    }
                    Some(Ok(ProviderEvent::Reasoning(text))) => {
                        yield ChatEvent::Reasoning(text);
                    }
                    Some(Ok(ProviderEvent::ToolCallFragment(fragment))) => {
                        pending.absorb(fragment);
                    }
                    Some(Ok(ProviderEvent::Completion { tool_calls })) => {
                        // Keep draining either way; usage trails the
                        // completion signal
                        if tool_calls {
                            execute_tools = true;
                        }
                    }
                    Some(Ok(ProviderEvent::Usage(usage))) => {
                        tracing::info!(
                            model = %model.model_id,
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            total_tokens = usage.total_tokens,
                            "provider reported usage"
                        );
                    }
                    Some(Ok(ProviderEvent::Unknown)) => {}
                    Some(Err(e)) => {
                        tracing::error!(model = %model.model_id, error = %e, "provider stream failed");
                        yield ChatEvent::Error(e.to_string());
                        return;
                    }
                    None => break,
                }
            }

            // A truncated stream can end with call data but no completion
            // signal; pending calls still execute
            if !execute_tools && pending.is_empty() {
                break;
            }

            let calls = pending.finish();
            if calls.is_empty() {
                break;
            }

            request.messages.push(assistant_turn(&assistant_text, &calls));

            for call in calls {
                let mut events = invoker::invoke(registry.clone(), call.name.clone(), call.arguments);
                while let Some(event) = events.next().await {
                    match event {
                        ToolEvent::Step(step) => {
                            yield ChatEvent::ToolStep {
                                tool_call_id: call.id.clone(),
                                tool_name: call.name.clone(),
                                step,
                            };
                        }
                        ToolEvent::Final(final_result) => {
                            let content = serde_json::to_string(&final_result.result)
                                .unwrap_or_else(|_| final_result.display_text.clone());

                            request
                                .messages
                                .push(HistoryMessage::tool_result(&call.id, &call.name, &content));
                            tool_messages.push(ToolMessage {
                                role: "tool",
                                tool_call_id: call.id.clone(),
                                name: call.name.clone(),
                                content,
                            });

                            yield ChatEvent::ToolFinal {
                                tool_call_id: call.id.clone(),
                                tool_name: call.name.clone(),
                                result: final_result,
                            };
                        }
                    }
                }
            }
        }

        if !tool_messages.is_empty() {
            yield ChatEvent::ToolMessages(tool_messages);
        }
    }
}

/// History record of the assistant turn that requested these calls
fn assistant_turn(text: &str, calls: &[ResolvedCall]) -> HistoryMessage {
    let mut message = HistoryMessage::assistant_tool_calls(
        calls
            .iter()
            .map(|call| ToolCallRecord {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.raw_arguments.clone(),
            })
            .collect(),
    );
    if !text.is_empty() {
        message.content = crate::types::HistoryContent::Text(text.to_owned());
    }
    message
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use relay_core::RequestContext;

    use super::*;
    use crate::provider::ProviderFamily;
    use crate::types::Role;

    fn fragment(
        index: Option<u32>,
        id: Option<&str>,
        name: Option<&str>,
        arguments: &str,
    ) -> ToolCallFragment {
        ToolCallFragment {
            index,
            id: id.map(str::to_owned),
            name: name.map(str::to_owned),
            arguments: arguments.to_owned(),
        }
    }

    #[test]
    fn fragments_assemble_by_id() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("echo"), ""));
        pending.absorb(fragment(Some(0), Some("call_a"), None, "{\"text\":"));
        pending.absorb(fragment(Some(0), Some("call_a"), None, " \"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].arguments["text"], "hi");
    }

    #[test]
    fn fragments_assemble_by_index_when_id_drops() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("echo"), ""));
        pending.absorb(fragment(Some(0), None, None, "{\"text\": \"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["text"], "hi");
    }

    #[test]
    fn unaddressed_continuation_extends_newest_call() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(None, Some("call_a"), Some("echo"), "{\"text\":"));
        pending.absorb(fragment(None, None, None, " \"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["text"], "hi");
    }

    #[test]
    fn complete_named_fragments_are_separate_calls() {
        // Google-style: no ids, no indexes, each fragment complete
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(None, None, Some("get_current_time"), "{\"timezone\":\"UTC\"}"));
        pending.absorb(fragment(None, None, Some("echo"), "{\"text\":\"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[1].id, "call_1");
    }

    #[test]
    fn verbatim_duplicate_call_is_dropped() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(None, None, Some("echo"), "{\"text\":\"hi\"}"));
        pending.absorb(fragment(None, None, Some("echo"), "{\"text\":\"hi\"}"));

        assert_eq!(pending.finish().len(), 1);
    }

    #[test]
    fn duplicate_name_with_diverging_args_is_dropped() {
        // Dedup is by started name; a mutated second copy of the same
        // call must not double-execute
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(None, None, Some("echo"), "{\"text\":\"hi\"}"));
        pending.absorb(fragment(None, None, Some("echo"), "{\"text\":\"hi again\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["text"], "hi");
    }

    #[test]
    fn addressed_calls_may_repeat_a_name() {
        // Id-bearing providers legitimately issue parallel calls to the
        // same tool; dedup applies only to the unaddressed regime
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("echo"), "{\"text\":\"one\"}"));
        pending.absorb(fragment(Some(1), Some("call_b"), Some("echo"), "{\"text\":\"two\"}"));

        assert_eq!(pending.finish().len(), 2);
    }

    #[test]
    fn missing_braces_are_repaired() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("echo"), "\"text\": \"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls[0].arguments["text"], "hi");
    }

    #[test]
    fn empty_arguments_become_empty_object() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("now"), ""));

        let calls = pending.finish();
        assert_eq!(calls[0].raw_arguments, "{}");
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn accumulation_is_deterministic_across_fresh_runs() {
        // The same fragment sequence through two fresh accumulators
        // must resolve to identical calls
        let sequence = || {
            vec![
                fragment(Some(0), Some("call_a"), Some("echo"), "{\"text\":"),
                fragment(Some(0), None, None, " \"hi\"}"),
                fragment(Some(1), Some("call_b"), Some("get_current_time"), ""),
                fragment(Some(1), None, None, "{\"timezone\": \"UTC\"}"),
            ]
        };

        let resolve = |fragments: Vec<ToolCallFragment>| {
            let mut pending = PendingCalls::default();
            for f in fragments {
                pending.absorb(f);
            }
            pending.finish()
        };

        let first = resolve(sequence());
        let second = resolve(sequence());
        assert_eq!(first, second);
        assert_eq!(first[0].raw_arguments, "{\"text\": \"hi\"}");
        assert_eq!(first[1].raw_arguments, "{\"timezone\": \"UTC\"}");
    }

    #[test]
    fn malformed_call_is_skipped_without_poisoning_siblings() {
        let mut pending = PendingCalls::default();
        pending.absorb(fragment(Some(0), Some("call_a"), Some("bad"), "{not json"));
        pending.absorb(fragment(Some(1), Some("call_b"), Some("echo"), "{\"text\":\"hi\"}"));

        let calls = pending.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "echo");
    }

    // -- Orchestrator tests --

    /// Plays back pre-scripted event rounds, recording each request
    struct ScriptedProvider {
        rounds: Mutex<Vec<Vec<ProviderEvent>>>,
        seen_message_counts: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn new(rounds: Vec<Vec<ProviderEvent>>) -> Arc<Self> {
            Arc::new(Self {
                rounds: Mutex::new(rounds),
                seen_message_counts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream_chat(
            &self,
            _model_id: &str,
            request: &ProviderRequest,
            _context: &RequestContext,
        ) -> Result<Pin<Box<dyn Stream<Item = Result<ProviderEvent, LlmError>> + Send>>, LlmError> {
            self.seen_message_counts.lock().unwrap().push(request.messages.len());
            let mut rounds = self.rounds.lock().unwrap();
            if rounds.is_empty() {
                return Err(LlmError::Upstream("script exhausted".to_owned()));
            }
            let round = rounds.remove(0);
            Ok(Box::pin(futures_util::stream::iter(round.into_iter().map(Ok))))
        }
    }

    fn test_model() -> ResolvedModel {
        ResolvedModel {
            model_id: "test-model".to_owned(),
            provider_name: "scripted".to_owned(),
            family: ProviderFamily::Openai,
            supported_attachments: Vec::new(),
            max_output_tokens: None,
            is_reasoner: false,
        }
    }

    fn run_with(provider: Arc<ScriptedProvider>, max_round_trips: u32) -> ChatRun {
        ChatRun {
            provider,
            model: test_model(),
            request: ProviderRequest {
                messages: vec![HistoryMessage::text(Role::User, "hi")],
                tools: Vec::new(),
                max_output_tokens: None,
            },
            registry: relay_tools::default_registry(),
            context: RequestContext::empty(),
            cancel: CancellationToken::new(),
            max_round_trips,
        }
    }

    async fn collect(run: ChatRun) -> Vec<ChatEvent> {
        run_chat(run).collect().await
    }

    #[tokio::test]
    async fn plain_content_passes_through_in_order() {
        let provider = ScriptedProvider::new(vec![vec![
            ProviderEvent::Content("He".to_owned()),
            ProviderEvent::Content("llo".to_owned()),
            ProviderEvent::Completion { tool_calls: false },
        ]]);

        let events = collect(run_with(provider, 8)).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ChatEvent::Content(t) if t == "He"));
        assert!(matches!(&events[1], ChatEvent::Content(t) if t == "llo"));
    }

    #[tokio::test]
    async fn tool_round_trip_interleaves_steps_and_resumes() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::ToolCallFragment(fragment(
                    Some(0),
                    Some("call_1"),
                    Some("echo"),
                    "{\"text\": \"hi\"}",
                )),
                ProviderEvent::Completion { tool_calls: true },
            ],
            vec![
                ProviderEvent::Content("done".to_owned()),
                ProviderEvent::Completion { tool_calls: false },
            ],
        ]);

        let events = collect(run_with(provider.clone(), 8)).await;

        // final for the call, then resumed content, then consolidated tool history
        assert!(matches!(&events[0], ChatEvent::ToolFinal { tool_call_id, .. } if tool_call_id == "call_1"));
        assert!(matches!(&events[1], ChatEvent::Content(t) if t == "done"));
        let ChatEvent::ToolMessages(messages) = &events[2] else {
            panic!("expected tool messages");
        };
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tool_call_id, "call_1");

        // second round saw user + assistant calls + tool result
        let counts = provider.seen_message_counts.lock().unwrap().clone();
        assert_eq!(counts, vec![1, 3]);
    }

    #[tokio::test]
    async fn progressive_tool_steps_are_forwarded() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::ToolCallFragment(fragment(
                    Some(0),
                    Some("call_1"),
                    Some("get_current_time"),
                    "{\"timezone\": \"UTC\"}",
                )),
                ProviderEvent::Completion { tool_calls: true },
            ],
            vec![ProviderEvent::Completion { tool_calls: false }],
        ]);

        let events = collect(run_with(provider, 8)).await;

        let steps: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::ToolStep { step, .. } => Some(step.progress),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![25, 50, 75]);
        assert!(events.iter().any(|e| matches!(e, ChatEvent::ToolFinal { .. })));
    }

    #[tokio::test]
    async fn events_trailing_a_tool_completion_are_drained() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::ToolCallFragment(fragment(
                    Some(0),
                    Some("call_1"),
                    Some("echo"),
                    "{\"text\": \"hi\"}",
                )),
                ProviderEvent::Completion { tool_calls: true },
                ProviderEvent::Content("tail".to_owned()),
                ProviderEvent::Usage(crate::types::UsageMetadata {
                    prompt_tokens: 3,
                    completion_tokens: 4,
                    total_tokens: 7,
                }),
            ],
            vec![ProviderEvent::Completion { tool_calls: false }],
        ]);

        let events = collect(run_with(provider, 8)).await;
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Content(t) if t == "tail")));
        assert!(events.iter().any(|e| matches!(e, ChatEvent::ToolFinal { .. })));
    }

    #[tokio::test]
    async fn round_trip_limit_yields_error() {
        // Every round requests the same tool again
        let round = vec![
            ProviderEvent::ToolCallFragment(fragment(Some(0), Some("call_1"), Some("echo"), "{\"text\": \"x\"}")),
            ProviderEvent::Completion { tool_calls: true },
        ];
        let provider = ScriptedProvider::new(vec![round.clone(), round.clone(), round]);

        let events = collect(run_with(provider, 3)).await;
        assert!(matches!(events.last(), Some(ChatEvent::Error(msg)) if msg.contains("round-trip")));
    }

    #[tokio::test]
    async fn truncated_stream_still_executes_pending_calls() {
        // Stream ends without any completion signal
        let provider = ScriptedProvider::new(vec![
            vec![ProviderEvent::ToolCallFragment(fragment(
                Some(0),
                Some("call_1"),
                Some("echo"),
                "{\"text\": \"hi\"}",
            ))],
            vec![ProviderEvent::Completion { tool_calls: false }],
        ]);

        let events = collect(run_with(provider, 8)).await;
        assert!(events.iter().any(|e| matches!(e, ChatEvent::ToolFinal { .. })));
    }

    #[tokio::test]
    async fn upstream_error_surfaces_and_terminates() {
        let provider = ScriptedProvider::new(vec![]);

        let events = collect(run_with(provider, 8)).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ChatEvent::Error(_)));
    }

    #[tokio::test]
    async fn no_tools_means_no_tool_messages_event() {
        let provider = ScriptedProvider::new(vec![vec![
            ProviderEvent::Content("plain".to_owned()),
            ProviderEvent::Completion { tool_calls: false },
        ]]);

        let events = collect(run_with(provider, 8)).await;
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::ToolMessages(_))));
    }

    #[tokio::test]
    async fn cancellation_ends_stream_silently() {
        let provider = ScriptedProvider::new(vec![vec![
            ProviderEvent::Content("never seen".to_owned()),
            ProviderEvent::Completion { tool_calls: false },
        ]]);

        let run = run_with(provider, 8);
        run.cancel.cancel();

        let events = collect(run).await;
        assert!(events.is_empty());
    }
}
