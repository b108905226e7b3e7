//! Input resolution: turn what the user typed into something we can send.
//!
//! PDF inputs are a local path or an HTTP/HTTPS URL. Either way the bytes end
//! up in memory as a [`PdfUpload`]: the backend takes the whole file as one
//! multipart part, so there is nothing to stream. We check the `%PDF` magic
//! bytes up front so a wrong file fails locally with a useful message instead
//! of a round trip and a 400.

use crate::error::DiagramError;
use crate::model::PdfUpload;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reject text the backend would refuse anyway.
pub fn validate_text(text: &str) -> Result<&str, DiagramError> {
    if text.trim().is_empty() {
        return Err(DiagramError::EmptyText);
    }
    Ok(text)
}

/// Resolve a path or URL to an in-memory PDF upload.
pub async fn resolve_pdf(input: &str, timeout_secs: u64) -> Result<PdfUpload, DiagramError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DiagramError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
async fn read_local(path: &Path) -> Result<PdfUpload, DiagramError> {
    let path: PathBuf = path.to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DiagramError::PermissionDenied { path });
        }
        Err(_) => return Err(DiagramError::FileNotFound { path }),
    };

    check_magic(&bytes, &path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfUpload::new(file_name, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfUpload, DiagramError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DiagramError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DiagramError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DiagramError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DiagramError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = filename_from_url(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DiagramError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&bytes, Path::new(&file_name))?;

    info!("Downloaded {} bytes as {}", bytes.len(), file_name);
    Ok(PdfUpload::new(file_name, bytes.to_vec()))
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), DiagramError> {
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(DiagramError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    if bytes.len() < 4 {
        let mut magic = [0u8; 4];
        magic[..bytes.len()].copy_from_slice(bytes);
        return Err(DiagramError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(validate_text(""), Err(DiagramError::EmptyText)));
        assert!(matches!(
            validate_text(" \n\t "),
            Err(DiagramError::EmptyText)
        ));
        assert_eq!(validate_text("A leads to B").unwrap(), "A leads to B");
    }

    #[test]
    fn filename_comes_from_last_segment() {
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/paper.v2.pdf"),
            "paper.v2.pdf"
        );
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/1706.03762"),
            "1706.03762"
        );
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn local_pdf_is_read_with_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4\n%%EOF\n")
            .unwrap();

        let upload = resolve_pdf(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(upload.file_name, "story.pdf");
        assert!(upload.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_pdf("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, DiagramError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"PK\x03\x04 not a pdf").unwrap();

        let err = resolve_pdf(tmp.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        match err {
            DiagramError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_file_is_not_a_pdf() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%P").unwrap();
        let err = resolve_pdf(tmp.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagramError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        let err = resolve_pdf("   ", 5).await.unwrap_err();
        assert!(matches!(err, DiagramError::InvalidInput { .. }));
    }
}
