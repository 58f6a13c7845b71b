//! Streaming delta contracts and in-memory stream utilities.
//!
//! ```rust
//! use cprovider::{BoxedDeltaStream, StreamDelta, VecDeltaStream};
//!
//! let stream = VecDeltaStream::new(vec![Ok(StreamDelta::content("hello"))]);
//! let _boxed: BoxedDeltaStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{FinishReason, ProviderError};

/// Partial tool call keyed by its position in the assistant's tool-call list.
///
/// `id` and `name` usually arrive on the first fragment only; `arguments` is a
/// slice of the JSON argument text that must be concatenated across fragments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallFragment {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallFragment {
    pub fn start(index: usize, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: None,
        }
    }

    pub fn arguments(index: usize, arguments: impl Into<String>) -> Self {
        Self {
            index,
            arguments: Some(arguments.into()),
            ..Self::default()
        }
    }
}

/// One incremental provider delta.
///
/// Invariants for consumers:
/// - Deltas are emitted in source order.
/// - Exactly one delta carries `finish_reason`, and it is the last meaningful one.
/// - Once the stream yields `None`, it must not yield additional items.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamDelta {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
    pub finish_reason: Option<FinishReason>,
}

impl StreamDelta {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn tool_call(fragment: ToolCallFragment) -> Self {
        Self {
            tool_calls: vec![fragment],
            ..Self::default()
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }
}

pub trait ModelDeltaStream: Stream<Item = Result<StreamDelta, ProviderError>> + Send {}

impl<T> ModelDeltaStream for T where T: Stream<Item = Result<StreamDelta, ProviderError>> + Send {}

pub type BoxedDeltaStream<'a> = Pin<Box<dyn ModelDeltaStream + 'a>>;

#[derive(Debug)]
pub struct VecDeltaStream {
    deltas: VecDeque<Result<StreamDelta, ProviderError>>,
}

impl VecDeltaStream {
    pub fn new(deltas: Vec<Result<StreamDelta, ProviderError>>) -> Self {
        Self {
            deltas: deltas.into(),
        }
    }
}

impl Stream for VecDeltaStream {
    type Item = Result<StreamDelta, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamDelta, ProviderError>>> {
        Poll::Ready(self.deltas.pop_front())
    }
}
