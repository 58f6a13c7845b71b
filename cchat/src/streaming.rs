//! Streaming turn loop.
//!
//! Content fragments are yielded in provider order as they arrive. Tool-call
//! fragments are collected per call index and dispatched once the round's
//! finish signal arrives. A provider fault is retried only while the failing
//! attempt has produced no content; after partial output the stream degrades
//! to the fixed unavailable message instead of restarting the answer.

use std::sync::Arc;

use async_stream::try_stream;
use cprovider::FinishReason;
use futures_timer::Delay;
use futures_util::StreamExt;

use crate::agent::RoundSignal;
use crate::{
    Agent, AgentOutput, AgentOutputStream, EventMarker, HAVING_TROUBLE_MESSAGE, Termination,
    ToolCallAccumulator, UNAVAILABLE_MESSAGE,
};

const OPERATION: &str = "stream";

impl Agent {
    /// Streams one ask. The final item is [`AgentOutput::Done`] unless the ask fails.
    ///
    /// The concatenation of all content items is committed to memory as the
    /// assistant turn once the stream completes.
    pub fn ask_stream<'a>(&'a mut self, query: &'a str) -> AgentOutputStream<'a> {
        let stream = try_stream! {
            let admitted = self
                .begin_ask(query, true)
                .await
                .map_err(|error| self.fail(error))?;
            if !admitted {
                yield AgentOutput::Content(self.config.moderation_fail_message.clone());
                yield AgentOutput::Done(Termination::Refused);
                return;
            }

            let provider = Arc::clone(&self.provider);
            let policy = self.config.retry_policy();
            let send_events = self.config.send_events;
            let max_event_size = self.config.max_event_size;
            let mut transcript = String::new();
            let mut termination = Termination::LoopLimit;

            'turn: while self.turn.iterations < self.config.loops_max {
                self.prepare_round();
                let iteration = self.turn.iterations;
                let request = self.build_request(true).map_err(|error| self.fail(error))?;
                self.hooks
                    .on_round_start(iteration, &request.model, request.tools.len());

                let mut attempt = 0_u32;
                let (finish_reason, accumulator) = loop {
                    attempt += 1;
                    self.provider_hooks
                        .on_attempt_start(provider.name(), OPERATION, attempt);

                    let mut produced_content = false;
                    let mut accumulator = ToolCallAccumulator::new();
                    let mut finish_reason = None;
                    let mut failure = None;

                    match provider.stream(request.clone()).await {
                        Ok(mut deltas) => {
                            while let Some(delta) = deltas.next().await {
                                let delta = match delta {
                                    Ok(delta) => delta,
                                    Err(error) => {
                                        failure = Some(error);
                                        break;
                                    }
                                };

                                for fragment in delta.tool_calls {
                                    accumulator.apply(fragment);
                                }

                                if let Some(content) = delta.content.filter(|content| !content.is_empty()) {
                                    produced_content = true;
                                    transcript.push_str(&content);
                                    yield AgentOutput::Content(content);
                                }

                                if delta.finish_reason.is_some() {
                                    finish_reason = delta.finish_reason;
                                    break;
                                }
                            }
                        }
                        Err(error) => failure = Some(error),
                    }

                    let Some(error) = failure else {
                        self.provider_hooks
                            .on_success(provider.name(), OPERATION, attempt);
                        let finish_reason = finish_reason
                            .unwrap_or_else(|| FinishReason::Other("missing".to_string()));
                        break (finish_reason, accumulator);
                    };

                    if !produced_content && policy.should_retry(attempt, &error) {
                        self.provider_hooks.on_retry_scheduled(
                            provider.name(),
                            OPERATION,
                            attempt,
                            policy.backoff,
                            &error,
                        );
                        Delay::new(policy.backoff).await;
                        continue;
                    }

                    self.provider_hooks
                        .on_failure(provider.name(), OPERATION, attempt, &error);
                    tracing::error!(
                        session = %self.session_id,
                        iteration,
                        attempt,
                        produced_content,
                        error = %error,
                        "provider stream failed"
                    );
                    transcript.push_str(UNAVAILABLE_MESSAGE);
                    yield AgentOutput::Content(UNAVAILABLE_MESSAGE.to_string());
                    termination = Termination::Unavailable;
                    break 'turn;
                };

                self.hooks.on_round_finish(iteration, &finish_reason);
                let signal = self
                    .classify_finish(&finish_reason)
                    .map_err(|error| self.fail(error))?;

                match signal {
                    RoundSignal::Final => {
                        termination = Termination::Answered;
                        break 'turn;
                    }
                    RoundSignal::ToolCalls => {
                        let calls = accumulator.finish();
                        self.record_tool_request(&calls);

                        if send_events {
                            for call in &calls {
                                yield AgentOutput::Event(EventMarker::function(call, max_event_size));
                            }
                        }

                        let mut direct = Vec::new();
                        for call in &calls {
                            let envelope = self
                                .dispatch_call(call, &mut direct)
                                .map_err(|error| self.fail(error))?;

                            if !send_events {
                                continue;
                            }
                            let stream_data = envelope
                                .and_then(|envelope| envelope.stream_data)
                                .unwrap_or_default();
                            for (key, value) in &stream_data {
                                yield AgentOutput::Event(EventMarker::data(key.clone(), value, max_event_size));
                            }
                        }

                        if !direct.is_empty() {
                            let text = direct.join("\n");
                            transcript.push_str(&text);
                            yield AgentOutput::Content(text);
                            termination = Termination::SentDirectly;
                            break 'turn;
                        }
                    }
                }

                if let Some(text) = self.overflow_text() {
                    transcript.push_str(&text);
                    yield AgentOutput::Content(text);
                    termination = Termination::Overflow;
                    break 'turn;
                }
            }

            match termination {
                Termination::Answered | Termination::SentDirectly => {
                    let post_content = self.turn.post_content_text();
                    if !post_content.is_empty() {
                        transcript.push_str(&post_content);
                        yield AgentOutput::Content(post_content);
                    }
                }
                Termination::LoopLimit => {
                    tracing::warn!(
                        session = %self.session_id,
                        loops_max = self.config.loops_max,
                        "iteration cap reached without a final answer"
                    );
                    transcript.push_str(HAVING_TROUBLE_MESSAGE);
                    yield AgentOutput::Content(HAVING_TROUBLE_MESSAGE.to_string());
                }
                _ => {}
            }

            let reply = self
                .finish_ask(transcript, termination)
                .map_err(|error| self.fail(error))?;
            yield AgentOutput::Done(reply.termination);
        };

        Box::pin(stream) as AgentOutputStream<'a>
    }
}
