use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;

use crate::chunk::ChatChunk;
use crate::config::SonarApiConfig;
use crate::error::SonarApiError;
use crate::payload::ChatRequest;
use crate::reconcile::{assemble_response, DeltaTracker, SearchResponse};
use crate::sse::{SseFrame, SseStreamParser};
use crate::url::normalize_chat_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct SonarApiClient {
    http: Client,
    config: SonarApiConfig,
}

impl SonarApiClient {
    pub fn new(config: SonarApiConfig) -> Result<Self, SonarApiError> {
        if config.api_key.trim().is_empty() {
            return Err(SonarApiError::MissingApiKey);
        }

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder.build().map_err(SonarApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SonarApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    fn build_request(&self, request: &ChatRequest) -> reqwest::RequestBuilder {
        let mut payload = request.clone();
        payload.stream = true;
        self.http
            .post(self.normalized_endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
    }

    /// Run one streamed exchange.
    ///
    /// The HTTP status is triaged once, before any event is consumed. Each
    /// display increment is handed to `on_delta` as it is reconciled;
    /// malformed event bodies are skipped, since later events may still
    /// complete the response. The assembled [`SearchResponse`] is built from
    /// the last well-formed event after the `[DONE]` sentinel (or the end of
    /// the byte stream) is reached.
    pub async fn stream_chat<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_delta: F,
    ) -> Result<SearchResponse, SonarApiError>
    where
        F: FnMut(&str),
    {
        let response = await_or_cancel(self.build_request(request).send(), cancellation)
            .await?
            .map_err(SonarApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = await_or_cancel(response.text(), cancellation)
                .await?
                .unwrap_or_default();
            return Err(SonarApiError::from_status(status, &body));
        }

        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut tracker = DeltaTracker::default();
        let mut full_content = String::new();
        let mut last_chunk = ChatChunk::default();

        'stream: loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(SonarApiError::Cancelled);
            }
            let chunk = chunk.map_err(SonarApiError::from)?;

            for frame in parser.feed(&chunk) {
                let payload = match frame {
                    SseFrame::Done => break 'stream,
                    SseFrame::Data(payload) => payload,
                };

                let Ok(parsed) = serde_json::from_str::<ChatChunk>(&payload) else {
                    continue;
                };

                if let Some(increment) = tracker.push(parsed.content()) {
                    full_content.push_str(&increment);
                    on_delta(&increment);
                }
                last_chunk = parsed;
            }
        }

        if is_cancelled(cancellation) {
            return Err(SonarApiError::Cancelled);
        }

        Ok(assemble_response(&last_chunk, full_content))
    }
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, SonarApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(SonarApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(SonarApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
