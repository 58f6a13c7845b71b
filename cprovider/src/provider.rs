use std::future::Future;
use std::pin::Pin;

use crate::{BoxedDeltaStream, ModelRequest, ModelResponse, ProviderError};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat completion collaborator.
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>>;
}
