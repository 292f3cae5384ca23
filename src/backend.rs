//! Bridge between the synchronous exchange loop and the async transport.

use std::sync::atomic::Ordering;

use sonar_api::{
    CancellationSignal, ChatRequest, SearchResponse, SonarApiClient, SonarApiError,
};

/// One blocking streamed exchange. The seam lets controller tests substitute
/// scripted outcomes for the network.
pub trait StreamBackend {
    fn stream(
        &self,
        request: &ChatRequest,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<SearchResponse, SonarApiError>;
}

/// Production backend driving [`SonarApiClient`] on a current-thread tokio
/// runtime, so event consumption and display refresh interleave on the
/// caller's thread.
pub struct SonarStreamBackend {
    client: SonarApiClient,
    cancellation: CancellationSignal,
}

impl SonarStreamBackend {
    #[must_use]
    pub fn new(client: SonarApiClient, cancellation: CancellationSignal) -> Self {
        Self {
            client,
            cancellation,
        }
    }
}

impl StreamBackend for SonarStreamBackend {
    fn stream(
        &self,
        request: &ChatRequest,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<SearchResponse, SonarApiError> {
        // A leftover interrupt from a previous exchange must not abort this one.
        self.cancellation.store(false, Ordering::Release);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                SonarApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.stream_chat(
            request,
            Some(&self.cancellation),
            |increment| on_delta(increment),
        ))
    }
}
