//! The "current result" slot and the rule that only the newest request may
//! write it.
//!
//! A UI lets the user submit again before the previous answer is back. Rather
//! than racing two responses into the same display, [`DiagramSession`] hands
//! every submission a monotonically increasing request id. When a response
//! arrives its id is compared with the newest id handed out; anything older is
//! dropped on the floor, success or failure alike. Cancellation is advisory:
//! the old HTTP request still runs to completion, its result is just ignored.
//!
//! ```text
//!            submit              response (latest)        render ok
//!   Idle ───────────▶ Submitting ─────────────────┬──────────────▶ Rendered
//!    ▲                                            └──────────────▶ Failed
//!    └──────────────────────── reset() ──────────────────────────────┘
//! ```
//!
//! The state lives behind a `std::sync::Mutex` that is only ever held for
//! bookkeeping and the synchronous render call, never across the network
//! await.

use crate::client::{DiagramBackend, DiagramClient};
use crate::config::ClientConfig;
use crate::error::{DiagramError, ErrorKind};
use crate::model::{
    DiagramRequest, DiagramResponse, DiagramSource, DiagramStats, InputMode, PdfUpload,
    RenderedDiagram,
};
use crate::pipeline::render::{DiagramRenderer, MermaidRenderer};
use crate::pipeline::{extract, input};
use crate::progress::ObserverHandle;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Submitting,
    Rendered,
    Failed,
}

/// What went wrong with the latest submission, in displayable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw diagram source, set for render errors so it can be shown alongside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
}

impl From<&DiagramError> for SessionFailure {
    fn from(e: &DiagramError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            source_code: e.source_code().map(String::from),
        }
    }
}

/// Snapshot of the session's single result slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Id of the submission this state belongs to (0 before the first one).
    pub request_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DiagramSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<RenderedDiagram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionFailure>,
    /// Backend's summary of the input, when it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DiagramStats>,
}

/// Result of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This submission was the latest; its diagram is now displayed.
    Rendered(RenderedDiagram),
    /// A newer submission (or a reset) started while this one was in
    /// flight, so its response was discarded.
    Superseded { request_id: u64, latest_id: u64 },
}

impl SubmitOutcome {
    pub fn rendered(&self) -> Option<&RenderedDiagram> {
        match self {
            SubmitOutcome::Rendered(r) => Some(r),
            SubmitOutcome::Superseded { .. } => None,
        }
    }
}

/// Ticket for one in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Inner {
    latest: u64,
    state: SessionState,
}

/// Controller owning the current result.
pub struct DiagramSession {
    backend: Arc<dyn DiagramBackend>,
    renderer: Arc<dyn DiagramRenderer>,
    observer: Option<ObserverHandle>,
    inner: Mutex<Inner>,
}

impl DiagramSession {
    pub fn new(backend: Arc<dyn DiagramBackend>, renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            backend,
            renderer,
            observer: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// HTTP backend and Mermaid renderer built from one config.
    pub fn from_config(config: &ClientConfig) -> Result<Self, DiagramError> {
        let client = DiagramClient::new(config.clone())?;
        let renderer = MermaidRenderer::from_config(config);
        let mut session = Self::new(Arc::new(client), Arc::new(renderer));
        session.observer = config.observer.clone();
        Ok(session)
    }

    pub fn with_observer(mut self, observer: ObserverHandle) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Copy of the current state.
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// True while the latest submission has not come back yet. A UI uses this
    /// to disable its submit button.
    pub fn is_busy(&self) -> bool {
        self.lock().state.status == SessionStatus::Submitting
    }

    /// Id of the newest submission handed out.
    pub fn latest_request_id(&self) -> u64 {
        self.lock().latest
    }

    /// Back to Idle, e.g. because the input changed. Any in-flight response
    /// becomes stale and will be discarded.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.latest += 1;
        inner.state = SessionState {
            request_id: inner.latest,
            ..SessionState::default()
        };
        debug!("Session reset; request #{} is now current", inner.latest);
    }

    /// Submit text and display the result.
    ///
    /// Blank text fails immediately with [`DiagramError::EmptyText`] and
    /// leaves the state untouched.
    pub async fn submit_text(&self, text: &str) -> Result<SubmitOutcome, DiagramError> {
        input::validate_text(text)?;
        let token = self.begin(InputMode::Text);
        let result = self.backend.process_text(text).await;
        self.complete(token, result)
    }

    /// Upload a PDF and display the result.
    pub async fn submit_file(&self, upload: &PdfUpload) -> Result<SubmitOutcome, DiagramError> {
        let token = self.begin(InputMode::Pdf);
        let result = self.backend.process_pdf(upload).await;
        self.complete(token, result)
    }

    /// Dispatch on the request kind.
    pub async fn submit(&self, request: &DiagramRequest) -> Result<SubmitOutcome, DiagramError> {
        match request {
            DiagramRequest::Text(text) => self.submit_text(text).await,
            DiagramRequest::Pdf(upload) => self.submit_file(upload).await,
        }
    }

    /// Start a submission: hand out a new token, clear the previous result and
    /// move to Submitting.
    pub fn begin(&self, mode: InputMode) -> RequestToken {
        let token = {
            let mut inner = self.lock();
            inner.latest += 1;
            inner.state = SessionState {
                status: SessionStatus::Submitting,
                request_id: inner.latest,
                ..SessionState::default()
            };
            RequestToken(inner.latest)
        };
        info!("Request #{} started ({})", token.0, mode);
        if let Some(ref o) = self.observer {
            o.on_submit_start(token.0, mode);
        }
        token
    }

    /// Finish a submission with whatever the backend returned.
    ///
    /// Stale tokens are discarded without touching state and report
    /// [`SubmitOutcome::Superseded`], even if the backend call failed. For the
    /// latest token the source is extracted and rendered; the state ends up
    /// Rendered or Failed, and a failure is also returned as `Err`.
    pub fn complete(
        &self,
        token: RequestToken,
        result: Result<DiagramResponse, DiagramError>,
    ) -> Result<SubmitOutcome, DiagramError> {
        let mut inner = self.lock();

        if token.0 != inner.latest {
            let latest_id = inner.latest;
            drop(inner);
            debug!(
                "Discarding response for request #{} (latest is #{})",
                token.0, latest_id
            );
            if let Some(ref o) = self.observer {
                o.on_discarded(token.0, latest_id);
            }
            return Ok(SubmitOutcome::Superseded {
                request_id: token.0,
                latest_id,
            });
        }

        let extracted = result.and_then(|response| {
            let source = extract::display_source(&response)?;
            Ok((source, response.summary, response.stats))
        });
        let (source, summary, stats) = match extracted {
            Ok(parts) => parts,
            Err(e) => return self.fail(inner, token, None, e),
        };

        let rendered = match self.renderer.render(&source) {
            Ok(rendered) => rendered,
            Err(e) => return self.fail(inner, token, Some(source), e),
        };

        inner.state = SessionState {
            status: SessionStatus::Rendered,
            request_id: token.0,
            source: Some(source),
            rendered: Some(rendered.clone()),
            error: None,
            summary,
            stats,
        };
        drop(inner);

        info!("Request #{} rendered a {}", token.0, rendered.kind);
        if let Some(ref o) = self.observer {
            o.on_rendered(token.0, rendered.kind, rendered.source.len());
        }
        Ok(SubmitOutcome::Rendered(rendered))
    }

    fn fail(
        &self,
        mut inner: MutexGuard<'_, Inner>,
        token: RequestToken,
        source: Option<DiagramSource>,
        e: DiagramError,
    ) -> Result<SubmitOutcome, DiagramError> {
        inner.state = SessionState {
            status: SessionStatus::Failed,
            request_id: token.0,
            source,
            rendered: None,
            error: Some(SessionFailure::from(&e)),
            summary: None,
            stats: None,
        };
        drop(inner);
        self.report_failure(token, &e);
        Err(e)
    }

    fn report_failure(&self, token: RequestToken, e: &DiagramError) {
        warn!("Request #{} failed ({}): {}", token.0, e.kind(), e);
        if let Some(ref o) = self.observer {
            o.on_failed(token.0, &e.to_string());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
