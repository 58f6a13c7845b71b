mod support;

use std::sync::{Arc, Mutex};

use cchat::prelude::*;
use cchat::{
    HAVING_TROUBLE_MESSAGE, MODERATION_FAIL_MESSAGE, OVERFLOW_MESSAGE, OVERSIZED_PAYLOAD,
    UNAVAILABLE_MESSAGE,
};
use cprovider::{FinishReason, ProviderError, StreamDelta, ToolCallFragment};
use futures_util::StreamExt;
use serde_json::json;
use support::{
    KeywordModeration, ScriptedProvider, catalog, direct_weather_tool, quiet_config, text_tool,
};

async fn collect(agent: &mut Agent, query: &str) -> Vec<AgentOutput> {
    let mut stream = agent.ask_stream(query);
    let mut outputs = Vec::new();
    while let Some(item) = stream.next().await {
        outputs.push(item.expect("stream item should be ok"));
    }
    outputs
}

fn content(text: &str) -> AgentOutput {
    AgentOutput::Content(text.to_string())
}

fn forecast_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "forecast",
        "Tomorrow's forecast",
        r#"{"type":"object","properties":{}}"#,
        Invocable::function(|_args| {
            Ok(ToolResultEnvelope::with_content("12C")
                .with_stream_data("forecast", json!({"high": 12, "low": 4}))
                .into())
        }),
    )
}

/// One streamed round that asks for `name` with empty arguments.
fn tool_round(name: &str) -> Vec<StreamDelta> {
    vec![
        StreamDelta::tool_call(ToolCallFragment::start(0, "call_n", name)),
        StreamDelta::tool_call(ToolCallFragment::arguments(0, "{}")),
        StreamDelta::finish(FinishReason::ToolCalls),
    ]
}

#[tokio::test]
async fn fragments_are_yielded_in_order_and_committed_as_one_turn() {
    let provider = Arc::new(ScriptedProvider::streams(vec![Ok(vec![
        Ok(StreamDelta::content("Hel")),
        Ok(StreamDelta::content("lo")),
        Ok(StreamDelta::finish(FinishReason::Stop)),
    ])]));

    let mut agent = Agent::builder(provider.clone())
        .config(quiet_config())
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "greet me").await;

    assert_eq!(
        outputs,
        vec![
            content("Hel"),
            content("lo"),
            AgentOutput::Done(Termination::Answered),
        ]
    );
    assert!(provider.request(0).is_streaming());
    assert_eq!(
        agent.chat_history().expect("history"),
        vec![Message::user("greet me"), Message::assistant("Hello")]
    );
    assert_eq!(agent.last_response(), Some("Hello"));
}

#[tokio::test]
async fn split_tool_call_arguments_are_reassembled_before_dispatch() {
    let provider = Arc::new(ScriptedProvider::streams(vec![Ok(vec![
        Ok(StreamDelta::tool_call(ToolCallFragment::start(
            0,
            "call_1",
            "get_weather",
        ))),
        Ok(StreamDelta::tool_call(ToolCallFragment::arguments(
            0,
            "{\"loca",
        ))),
        Ok(StreamDelta::tool_call(ToolCallFragment::arguments(
            0,
            "tion\":\"Tokyo\"}",
        ))),
        Ok(StreamDelta::finish(FinishReason::ToolCalls)),
    ])]));
    let locations = Arc::new(Mutex::new(Vec::new()));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            always_use: vec!["get_weather".to_string()],
            ..quiet_config()
        })
        .tools(catalog(vec![direct_weather_tool(locations.clone())]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "What's the weather in Tokyo?").await;

    assert_eq!(
        outputs,
        vec![content("10C"), AgentOutput::Done(Termination::SentDirectly)]
    );
    assert_eq!(
        locations.lock().expect("locations lock").as_slice(),
        ["Tokyo".to_string()]
    );
    assert_eq!(provider.request_count(), 1);
    assert_eq!(
        agent.chat_history().expect("history").last(),
        Some(&Message::assistant("10C"))
    );
}

#[tokio::test]
async fn events_are_interleaved_when_enabled() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Ok(vec![
            Ok(StreamDelta::tool_call(ToolCallFragment::start(0, "call_1", "forecast"))),
            Ok(StreamDelta::tool_call(ToolCallFragment::arguments(0, "{}"))),
            Ok(StreamDelta::finish(FinishReason::ToolCalls)),
        ]),
        Ok(vec![
            Ok(StreamDelta::content("Mild tomorrow.")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            send_events: true,
            ..quiet_config()
        })
        .tools(catalog(vec![forecast_tool()]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "forecast?").await;
    let rendered = outputs
        .iter()
        .filter_map(AgentOutput::render)
        .collect::<Vec<_>>();

    assert_eq!(
        rendered,
        vec![
            r#"[[[function:forecast:{"id":"call_1","name":"forecast","arguments":"{}"}]]]"#
                .to_string(),
            r#"[[[data:forecast:{"high":12,"low":4}]]]"#.to_string(),
            "Mild tomorrow.".to_string(),
        ]
    );
    assert_eq!(outputs.last(), Some(&AgentOutput::Done(Termination::Answered)));
    assert_eq!(
        agent.chat_history().expect("history").last(),
        Some(&Message::assistant("Mild tomorrow."))
    );
}

#[tokio::test]
async fn events_are_suppressed_by_default() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Ok(vec![
            Ok(StreamDelta::tool_call(ToolCallFragment::start(0, "call_1", "forecast"))),
            Ok(StreamDelta::finish(FinishReason::ToolCalls)),
        ]),
        Ok(vec![
            Ok(StreamDelta::content("Mild.")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));

    let mut agent = Agent::builder(provider)
        .config(quiet_config())
        .tools(catalog(vec![forecast_tool()]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "forecast?").await;

    assert!(
        outputs
            .iter()
            .all(|output| !matches!(output, AgentOutput::Event(_)))
    );
}

#[tokio::test]
async fn oversized_event_payloads_are_replaced() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Ok(vec![
            Ok(StreamDelta::tool_call(ToolCallFragment::start(0, "call_1", "forecast"))),
            Ok(StreamDelta::finish(FinishReason::ToolCalls)),
        ]),
        Ok(vec![
            Ok(StreamDelta::content("ok")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));

    let mut agent = Agent::builder(provider)
        .config(AgentConfig {
            send_events: true,
            max_event_size: 10,
            ..quiet_config()
        })
        .tools(catalog(vec![forecast_tool()]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "forecast?").await;
    let data_event = outputs
        .iter()
        .find_map(|output| match output {
            AgentOutput::Event(marker) if marker.kind == EventKind::Data => Some(marker.clone()),
            _ => None,
        })
        .expect("data event should be emitted");

    assert_eq!(data_event.payload, OVERSIZED_PAYLOAD);
    assert_eq!(
        data_event.render(),
        r#"[[[data:forecast:{"error":"data too large"}]]]"#
    );
}

#[tokio::test]
async fn partial_output_is_never_retried() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Ok(vec![
            Ok(StreamDelta::content("Par")),
            Err(ProviderError::transport("connection reset")),
        ]),
        Ok(vec![
            Ok(StreamDelta::content("never streamed")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            max_retries: 3,
            ..quiet_config()
        })
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "tell me a story").await;

    assert_eq!(
        outputs,
        vec![
            content("Par"),
            content(UNAVAILABLE_MESSAGE),
            AgentOutput::Done(Termination::Unavailable),
        ]
    );
    assert_eq!(provider.request_count(), 1);
    assert_eq!(
        agent.chat_history().expect("history").last(),
        Some(&Message::assistant("ParAI temporarily unavailable."))
    );
}

#[tokio::test]
async fn faults_before_any_content_are_retried() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Err(ProviderError::transport("connect refused")),
        Ok(vec![Err(ProviderError::timeout("first byte timeout"))]),
        Ok(vec![
            Ok(StreamDelta::content("made it")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            max_retries: 2,
            ..quiet_config()
        })
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "hello").await;

    assert_eq!(
        outputs,
        vec![content("made it"), AgentOutput::Done(Termination::Answered)]
    );
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn exhausted_retries_yield_the_unavailable_message() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Err(ProviderError::transport("down")),
        Err(ProviderError::transport("still down")),
    ]));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            max_retries: 1,
            ..quiet_config()
        })
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "hello").await;

    assert_eq!(
        outputs,
        vec![
            content(UNAVAILABLE_MESSAGE),
            AgentOutput::Done(Termination::Unavailable),
        ]
    );
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn flagged_query_streams_only_the_refusal() {
    let provider = Arc::new(ScriptedProvider::streams(Vec::new()));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            perform_moderation: true,
            ..quiet_config()
        })
        .moderation_provider(Arc::new(KeywordModeration::flagging("bomb")))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "bomb please").await;

    assert_eq!(
        outputs,
        vec![
            content(MODERATION_FAIL_MESSAGE),
            AgentOutput::Done(Termination::Refused),
        ]
    );
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn unrecognized_finish_reason_ends_the_stream_with_an_error() {
    let provider = Arc::new(ScriptedProvider::streams(vec![Ok(vec![
        Ok(StreamDelta::content("hm")),
        Ok(StreamDelta::finish(FinishReason::Other("mystery".to_string()))),
    ])]));

    let mut agent = Agent::builder(provider)
        .config(quiet_config())
        .build()
        .await
        .expect("agent should build");

    let mut stream = agent.ask_stream("hello");
    let first = stream
        .next()
        .await
        .expect("first item")
        .expect("content should be ok");
    assert_eq!(first, content("hm"));

    let error = stream
        .next()
        .await
        .expect("second item")
        .expect_err("protocol error expected");
    assert_eq!(error.kind, ChatErrorKind::Protocol);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn post_content_is_streamed_after_the_answer() {
    let provider = Arc::new(ScriptedProvider::streams(vec![
        Ok(vec![
            Ok(StreamDelta::tool_call(ToolCallFragment::start(0, "call_1", "cite"))),
            Ok(StreamDelta::finish(FinishReason::ToolCalls)),
        ]),
        Ok(vec![
            Ok(StreamDelta::content("Answer.")),
            Ok(StreamDelta::finish(FinishReason::Stop)),
        ]),
    ]));
    let cite = ToolDescriptor::new(
        "cite",
        "Finds a citation",
        r#"{"type":"object","properties":{}}"#,
        Invocable::function(|_args| {
            Ok(ToolResultEnvelope::with_content("ref 1")
                .with_post_content("[1]")
                .into())
        }),
    );

    let mut agent = Agent::builder(provider)
        .config(quiet_config())
        .tools(catalog(vec![cite]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "cite it").await;

    assert_eq!(
        outputs,
        vec![
            content("Answer."),
            content("[1]\n"),
            AgentOutput::Done(Termination::Answered),
        ]
    );
}

#[tokio::test]
async fn streaming_loop_cap_yields_the_trouble_message() {
    let provider = Arc::new(ScriptedProvider::repeating_stream(tool_round("ping")));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            loops_max: 3,
            internal_thoughts_max_entries: 100,
            ..quiet_config()
        })
        .tools(catalog(vec![text_tool("ping", "pong")]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "ping forever").await;

    assert_eq!(
        outputs,
        vec![
            content(HAVING_TROUBLE_MESSAGE),
            AgentOutput::Done(Termination::LoopLimit),
        ]
    );
    assert_eq!(provider.request_count(), 3);
    assert_eq!(
        agent.chat_history().expect("history"),
        vec![
            Message::user("ping forever"),
            Message::assistant(HAVING_TROUBLE_MESSAGE),
        ]
    );
}

#[tokio::test]
async fn streaming_scratch_overflow_yields_the_overflow_message() {
    let provider = Arc::new(ScriptedProvider::repeating_stream(tool_round("ping")));

    let mut agent = Agent::builder(provider.clone())
        .config(AgentConfig {
            internal_thoughts_max_entries: 2,
            ..quiet_config()
        })
        .tools(catalog(vec![text_tool("ping", "pong")]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "ping").await;

    assert_eq!(
        outputs,
        vec![
            content(OVERFLOW_MESSAGE),
            AgentOutput::Done(Termination::Overflow),
        ]
    );
    assert_eq!(provider.request_count(), 2);
    assert_eq!(agent.last_response(), Some(OVERFLOW_MESSAGE));
}

#[tokio::test]
async fn streaming_scratch_overflow_flushes_post_content_instead() {
    let provider = Arc::new(ScriptedProvider::repeating_stream(tool_round("lookup")));
    let lookup = ToolDescriptor::new(
        "lookup",
        "Looks something up",
        r#"{"type":"object","properties":{}}"#,
        Invocable::function(|_args| {
            Ok(ToolResultEnvelope::with_content("partial")
                .with_post_content("See the docs.")
                .into())
        }),
    );

    let mut agent = Agent::builder(provider)
        .config(AgentConfig {
            internal_thoughts_max_entries: 2,
            ..quiet_config()
        })
        .tools(catalog(vec![lookup]))
        .build()
        .await
        .expect("agent should build");

    let outputs = collect(&mut agent, "look it up").await;

    assert_eq!(
        outputs,
        vec![
            content("See the docs. See the docs.\n"),
            AgentOutput::Done(Termination::Overflow),
        ]
    );
}
