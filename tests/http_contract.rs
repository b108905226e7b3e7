//! HTTP contract tests: the client against a mock backend.
//!
//! Each test mounts the exact answer the real backend would give and checks
//! both sides of the exchange: what went over the wire, and what the caller
//! got back.

use blockdiagram::{
    generate_sync, ClientConfig, DiagramBackend, DiagramClient, DiagramError, DiagramRenderer,
    DiagramRequest, DiagramSession, DiagramSource, ErrorKind, MermaidRenderer, OutputFormat,
    PdfUpload, RenderedDiagram, SessionStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> DiagramClient {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .request_timeout_secs(5)
        .build()
        .unwrap();
    DiagramClient::new(config).unwrap()
}

fn sample_pdf() -> PdfUpload {
    PdfUpload::new("story.pdf", b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n".to_vec())
}

/// Renderer that counts calls and otherwise behaves like the real one.
struct CountingRenderer {
    calls: AtomicUsize,
    inner: MermaidRenderer,
}

impl CountingRenderer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inner: MermaidRenderer::new(OutputFormat::Raw),
        })
    }
}

impl DiagramRenderer for CountingRenderer {
    fn render(&self, source: &DiagramSource) -> Result<RenderedDiagram, DiagramError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source)
    }
}

// ── Text endpoint ────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_is_posted_once_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .and(header_regex("content-type", "^application/json"))
        .and(body_json(serde_json::json!({"text": "A leads to B"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"mermaid_code": "graph TD; A-->B;"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = client_for(&server).submit_text("A leads to B").await.unwrap();
    assert_eq!(source.as_str(), "graph TD; A-->B;");
}

#[tokio::test]
async fn raw_mermaid_is_accepted_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"raw_mermaid": "flowchart LR\n  X --> Y"})),
        )
        .mount(&server)
        .await;

    let source = client_for(&server).submit_text("X then Y").await.unwrap();
    assert_eq!(source.as_str(), "flowchart LR\n  X --> Y");
}

#[tokio::test]
async fn mermaid_code_wins_over_raw_mermaid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "mermaid_code": "flowchart TD\n  A --> B",
            "raw_mermaid": "flowchart TD\n  A --> B\n  Extra text",
            "summary": "KEY EVENTS: A, B",
            "stats": {"text_length": 10, "summary_length": 16, "mermaid_length": 21}
        })))
        .mount(&server)
        .await;

    let source = client_for(&server).submit_text("A, then B").await.unwrap();
    assert_eq!(source.as_str(), "flowchart TD\n  A --> B");
}

#[tokio::test]
async fn missing_keys_are_malformed_and_never_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": true, "summary": "..."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let renderer = CountingRenderer::new();
    let session = DiagramSession::new(Arc::new(client_for(&server)), renderer.clone());
    let err = session.submit_text("anything").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.state().status, SessionStatus::Failed);
}

#[tokio::test]
async fn server_error_carries_backend_message_and_skips_render() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Processing failed: GEMINI_API_KEY not found in environment variables"
        })))
        .mount(&server)
        .await;

    let renderer = CountingRenderer::new();
    let session = DiagramSession::new(Arc::new(client_for(&server)), renderer.clone());
    let err = session.submit_text("anything").await.unwrap_err();

    match &err {
        DiagramError::Server { status, message } => {
            assert_eq!(*status, 500);
            assert!(message.as_deref().unwrap().contains("GEMINI_API_KEY"));
        }
        other => panic!("expected Server, got {other:?}"),
    }
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);

    let failure = session.state().error.unwrap();
    assert_eq!(failure.kind, ErrorKind::Server);
    assert!(failure.message.contains("HTTP 500"));
}

#[tokio::test]
async fn html_error_page_is_reported_as_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server).submit_text("anything").await.unwrap_err();
    assert!(matches!(
        err,
        DiagramError::Server { status: 502, ref message } if message.as_deref() == Some("Bad Gateway")
    ));
}

#[tokio::test]
async fn empty_error_field_falls_back_to_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "",
            "message": "The requested URL was not found on the server."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).submit_text("anything").await.unwrap_err();
    match err {
        DiagramError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(
                message.as_deref(),
                Some("The requested URL was not found on the server.")
            );
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<pre class=\"mermaid\">"))
        .mount(&server)
        .await;

    let err = client_for(&server).submit_text("anything").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn unparseable_source_is_a_render_error_with_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"mermaid_code": "Here is the diagram you asked for"})),
        )
        .mount(&server)
        .await;

    let renderer = CountingRenderer::new();
    let session = DiagramSession::new(Arc::new(client_for(&server)), renderer.clone());
    let err = session.submit_text("anything").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    let state = session.state();
    assert_eq!(
        state.error.unwrap().source_code.as_deref(),
        Some("Here is the diagram you asked for")
    );
    assert_eq!(
        state.source.unwrap().as_str(),
        "Here is the diagram you asked for"
    );
}

// ── PDF endpoint ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_is_uploaded_as_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-pdf"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"story.pdf\""))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "mermaid_code": "flowchart TD\n  Start --> End"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = client_for(&server).submit_file(&sample_pdf()).await.unwrap();
    assert_eq!(source.as_str(), "flowchart TD\n  Start --> End");
}

#[tokio::test]
async fn pdf_type_rejection_is_unsupported_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-pdf"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "File must be a PDF"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit_file(&sample_pdf())
        .await
        .unwrap_err();
    assert!(matches!(err, DiagramError::UnsupportedFile { status: 400, .. }));
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[tokio::test]
async fn pdf_from_disk_goes_through_submit_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-pdf"))
        .and(body_string_contains("filename=\"notes.pdf\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"raw_mermaid": "pie\n  \"a\": 1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("notes.pdf");
    std::fs::write(&pdf, b"%PDF-1.7\n%%EOF\n").unwrap();

    let source = client_for(&server)
        .submit_pdf(pdf.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(source.as_str(), "pie\n  \"a\": 1");
}

#[tokio::test]
async fn pdf_url_is_downloaded_then_uploaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5\n%%EOF\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/process-pdf"))
        .and(body_string_contains("filename=\"paper.pdf\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"mermaid_code": "graph LR\n  P --> Q"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/files/paper.pdf", server.uri());
    let source = client_for(&server).submit_pdf(&url).await.unwrap();
    assert_eq!(source.as_str(), "graph LR\n  P --> Q");
}

// ── Transport and health ─────────────────────────────────────────────────────

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    // Bind and drop a listener so the port is known to be closed. Mock servers
    // are pooled and stay up after drop, so they can't be used for this.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::builder()
        .base_url(format!("http://127.0.0.1:{port}"))
        .build()
        .unwrap();
    let err = DiagramClient::new(config)
        .unwrap()
        .submit_text("anything")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"mermaid_code": "graph TD; A-->B;"}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let err = DiagramClient::new(config)
        .unwrap()
        .submit_text("anything")
        .await
        .unwrap_err();
    assert!(matches!(err, DiagramError::Timeout { secs: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn generate_sync_runs_on_a_plain_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"mermaid_code": "graph TD; A-->B;"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .output_format(OutputFormat::Markdown)
        .build()
        .unwrap();
    // generate_sync builds its own runtime, so it has to run off this one.
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let request = DiagramRequest::Text("A leads to B".into());
        let _ = tx.send(generate_sync(&request, &config));
    });

    let output = rx.await.unwrap().unwrap();
    assert_eq!(output.rendered.source.as_str(), "graph TD; A-->B;");
    assert_eq!(output.rendered.content, "```mermaid\ngraph TD; A-->B;\n```\n");
}

#[tokio::test]
async fn health_endpoint_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.unwrap();
    assert!(health.is_healthy());
}

#[tokio::test]
async fn backend_trait_returns_full_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "mermaid_code": "flowchart TD\n  A --> B",
            "summary": "OUTCOME: B",
            "stats": {"text_length": 5, "summary_length": 10, "mermaid_length": 22}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.process_text("A, B").await.unwrap();
    assert_eq!(response.success, Some(true));
    assert_eq!(response.summary.as_deref(), Some("OUTCOME: B"));
    assert_eq!(response.stats.unwrap().mermaid_length, Some(22));
}
