use crate::fetcher::{
    block,
    errors::{BlockedError, FetchError},
    gate::ConcurrencyGate,
    pacing::HostPacer,
    pipeline::decode_body,
    retry::{calculate_backoff_delay, is_retryable_status, parse_retry_after},
    types::{FetchEvent, FetchEventSink, FetcherConfig, HostPacing, NoopSink, millis},
};
use chrono::Utc;
use reqwest::{
    Client, ClientBuilder, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a single attempt brought back before any retry decision.
struct RawResponse {
    final_url: Url,
    status: StatusCode,
    retry_after: Option<String>,
    body: String,
}

/// Rate-limited, retrying page fetcher.
///
/// One instance owns its concurrency gate and per-host pacing state, so
/// independent crawl sessions can each hold their own fetcher.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    gate: ConcurrencyGate,
    pacer: HostPacer,
    sink: Arc<dyn FetchEventSink>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
                headers.insert(
                    header::ACCEPT_LANGUAGE,
                    HeaderValue::from_static("de-DE,de;q=0.9,en;q=0.8"),
                );
                headers
            })
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            gate: ConcurrencyGate::new(config.concurrency),
            pacer: HostPacer::new(),
            config,
            sink: Arc::new(NoopSink),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn FetchEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Fetch `url` as text, retrying throttling and transport failures.
    ///
    /// A detected block page fails immediately with [`FetchError::Blocked`].
    pub async fn fetch_text(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<String, FetchError> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::MissingHost(url.to_string()))?
            .to_string();
        let pacing = self.config.pacing_for(&host);

        let mut attempt: u32 = 0;
        loop {
            let err = match self.attempt(&parsed, &host, pacing, headers, attempt).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !err.should_retry() {
                return Err(err);
            }
            if attempt >= self.config.max_retries {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }

            let wait = err.wait_hint().unwrap_or_else(|| {
                calculate_backoff_delay(
                    attempt,
                    Duration::from_millis(self.config.backoff_base_ms),
                    Duration::from_millis(self.config.backoff_cap_ms),
                )
            });
            self.sink.emit(FetchEvent::RetryScheduled {
                url: url.to_string(),
                attempt,
                reason: err.to_string(),
                wait_ms: millis(wait),
            });
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        url: &Url,
        host: &str,
        pacing: HostPacing,
        headers: Option<&HeaderMap>,
        attempt: u32,
    ) -> Result<String, FetchError> {
        // Host pacing is waited out before taking a gate permit.
        let host_wait = self.pacer.reserve(host, pacing);
        if !host_wait.is_zero() {
            self.sink.emit(FetchEvent::HostWait {
                host: host.to_string(),
                wait_ms: millis(host_wait),
            });
            tokio::time::sleep(host_wait).await;
        }

        let queued_at = Instant::now();
        if self.gate.is_saturated() {
            self.sink.emit(FetchEvent::QueueWait {
                url: url.to_string(),
            });
        }
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        self.sink.emit(FetchEvent::QueueAcquired {
            url: url.to_string(),
            waited_ms: millis(queued_at.elapsed()),
        });

        self.sink.emit(FetchEvent::AttemptStarted {
            url: url.to_string(),
            attempt,
        });
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.timeout(), self.send(url, headers)).await;
        let status = match &outcome {
            Ok(Ok(raw)) => Some(raw.status.as_u16()),
            _ => None,
        };
        self.sink.emit(FetchEvent::AttemptFinished {
            url: url.to_string(),
            attempt,
            status,
            latency_ms: millis(started.elapsed()),
        });

        match outcome {
            Err(_elapsed) => Err(FetchError::Timeout(self.config.timeout())),
            Ok(Err(err)) => Err(err),
            Ok(Ok(raw)) => self.evaluate(url, host, raw),
        }
    }

    async fn send(&self, url: &Url, headers: Option<&HeaderMap>) -> Result<RawResponse, FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }
        let response = request.send().await.map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_body_bytes
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        let retry_after = header_string(response.headers(), header::RETRY_AFTER);
        let content_type = header_string(response.headers(), header::CONTENT_TYPE);

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing or wrong for compressed bodies
        if body_bytes.len() as u64 > self.config.max_body_bytes {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let decoded = decode_body(content_type.as_deref(), &body_bytes);
        if decoded.lossy {
            self.sink.emit(FetchEvent::LossyDecode {
                url: final_url.to_string(),
                charset: decoded.charset.encoding().name().to_string(),
            });
        }
        Ok(RawResponse {
            final_url,
            status,
            retry_after,
            body: decoded.text,
        })
    }

    /// Block detection runs before the status decides between success, retry
    /// and terminal failure.
    fn evaluate(&self, url: &Url, host: &str, raw: RawResponse) -> Result<String, FetchError> {
        let final_host = raw.final_url.host_str().unwrap_or(host);
        let scan = self.config.block_scan_bytes;
        let markers = &self.config.block_markers;

        let hit = block::detect(markers, final_host, raw.final_url.as_str(), &raw.body, scan)
            .or_else(|| {
                (final_host != host)
                    .then(|| block::detect(markers, host, url.as_str(), &raw.body, scan))
                    .flatten()
            });

        if let Some(hit) = hit {
            self.sink.emit(FetchEvent::BlockDetected {
                url: raw.final_url.to_string(),
                host: final_host.to_string(),
                status: raw.status.as_u16(),
                marker: hit.marker.clone(),
            });
            return Err(BlockedError {
                url: raw.final_url.to_string(),
                host: final_host.to_string(),
                status: raw.status.as_u16(),
                marker: hit.marker,
                snippet: hit.snippet,
            }
            .into());
        }

        if raw.status.is_success() {
            return Ok(raw.body);
        }

        if is_retryable_status(raw.status) {
            let wait_hint = raw
                .retry_after
                .as_deref()
                .and_then(|value| parse_retry_after(value, Utc::now()));
            return Err(FetchError::Retryable {
                status: raw.status,
                wait_hint,
            });
        }

        Err(FetchError::Http { status: raw.status })
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
