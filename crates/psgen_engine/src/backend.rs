use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use psgen_logging::{psgen_debug, psgen_info};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::persist::{ArtifactWriter, PersistError};
use crate::{
    BackendError, FailureKind, GenerationReceipt, GenerationRequest, ProgressReport,
    UploadReceipt, UploadTarget,
};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Generation runs synchronously on the backend and can take minutes.
    pub generate_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// The REST contract the workflow consumes.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn upload(&self, target: UploadTarget, file: &Path) -> Result<UploadReceipt, BackendError>;

    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationReceipt, BackendError>;

    async fn progress(&self, job_id: &str) -> Result<ProgressReport, BackendError>;

    /// Streams `/download/{filename}` into `dest_dir` and returns the saved path.
    async fn download(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Appends path segments to the base url. Each segment is percent-encoded,
    /// including `/`, so ids and filenames cannot escape their segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::new(FailureKind::InvalidUrl, "base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn upload(&self, target: UploadTarget, file: &Path) -> Result<UploadReceipt, BackendError> {
        let url = self.endpoint(&[target.path()])?;
        let bytes = tokio::fs::read(file).await.map_err(|err| {
            BackendError::new(FailureKind::Io, format!("{}: {err}", file.display()))
        })?;
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document.docx")
            .to_string();

        psgen_debug!(
            "POST {} file={} bytes={}",
            url,
            file_name,
            bytes.len()
        );
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(DOCX_MIME)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let receipt: UploadReceipt = read_json(response).await?;
        psgen_info!(
            "{:?} uploaded as {} (stored as {:?})",
            target,
            receipt.doc_id,
            receipt.filename
        );
        Ok(receipt)
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReceipt, BackendError> {
        let url = self.endpoint(&["generate_new_ps"])?;
        psgen_debug!(
            "POST {} ps={} old_mock={} new_mock={}",
            url,
            request.ps_doc_id,
            request.old_mock_id,
            request.new_mock_id
        );
        let response = self
            .client
            .post(url)
            .timeout(self.settings.generate_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let receipt: GenerationReceipt = read_json(response).await?;
        psgen_info!(
            "generation job {} started for {}",
            receipt.job_id,
            receipt.updated_file
        );
        Ok(receipt)
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressReport, BackendError> {
        let url = self.endpoint(&["progress", job_id])?;
        psgen_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn download(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, BackendError> {
        validate_filename(filename)?;
        let url = self.endpoint(&["download", filename])?;
        psgen_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            return Err(error_from_payload(status, &body));
        }

        let mut writer = ArtifactWriter::create(dest_dir).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            writer.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        let written = writer.bytes_written();
        let path = writer.persist(filename).map_err(map_persist_error)?;
        psgen_info!("saved {} ({} bytes) to {:?}", filename, written, path);
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(error_from_payload(status, &body));
    }
    serde_json::from_slice(&body)
        .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

/// Prefers the backend's `{"error": ...}` text over the bare status line.
fn error_from_payload(status: StatusCode, body: &[u8]) -> BackendError {
    let message = serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| status.to_string());
    BackendError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

/// The artifact name becomes a local file name; it must be a single plain component.
fn validate_filename(filename: &str) -> Result<(), BackendError> {
    let invalid = filename.trim().is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(BackendError::new(
            FailureKind::InvalidFilename,
            format!("refusing to save artifact as {filename:?}"),
        ));
    }
    Ok(())
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> BackendError {
    BackendError::new(FailureKind::Io, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> ReqwestBackend {
        ReqwestBackend::new(BackendSettings {
            base_url: base.to_string(),
            ..BackendSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_segments_with_or_without_trailing_slash() {
        let plain = backend("http://localhost:5000");
        assert_eq!(
            plain.endpoint(&["upload_ps"]).unwrap().as_str(),
            "http://localhost:5000/upload_ps"
        );
        let slashed = backend("http://localhost:5000/api/");
        assert_eq!(
            slashed.endpoint(&["progress", "j1"]).unwrap().as_str(),
            "http://localhost:5000/api/progress/j1"
        );
    }

    #[test]
    fn endpoint_percent_encodes_filenames() {
        let backend = backend("http://localhost:5000");
        assert_eq!(
            backend
                .endpoint(&["download", "New PS #1/final.docx"])
                .unwrap()
                .as_str(),
            "http://localhost:5000/download/New%20PS%20%231%2Ffinal.docx"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(BackendSettings {
            base_url: "not a url".to_string(),
            ..BackendSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn error_payload_message_is_preferred() {
        let err = error_from_payload(StatusCode::BAD_REQUEST, br#"{"error":"bad format"}"#);
        assert_eq!(err.kind, FailureKind::HttpStatus(400));
        assert_eq!(err.message, "bad format");

        let err = error_from_payload(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err.message, "500 Internal Server Error");
    }

    #[test]
    fn filenames_with_path_components_are_refused() {
        for name in ["", " ", ".", "..", "../etc/passwd", "a/b.docx", "a\\b.docx"] {
            assert_eq!(
                validate_filename(name).unwrap_err().kind,
                FailureKind::InvalidFilename,
                "{name:?}"
            );
        }
        assert!(validate_filename("out file.docx").is_ok());
    }
}
