use reqwest::{header::CONTENT_TYPE, multipart, Client};
use serde_json::Value;
use shared::protocol::{DetectReport, DetectResponse};
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod project;
pub mod selection;

pub use error::SubmitError;
pub use selection::{FileSelection, PickedFile, SelectionError, MAX_TOTAL_UPLOAD_BYTES};

const DETECT_PATH: &str = "/api/detect";

/// Multipart field name shared by every uploaded file; the backend accepts
/// one or many files under this key.
const UPLOAD_FIELD: &str = "images";

/// Outcome of the latest submit. Exactly one state holds at a time; reports
/// live only as long as the state that carries them.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded(Vec<DetectReport>),
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn results(&self) -> Option<&[DetectReport]> {
        match self {
            Self::Succeeded(reports) => Some(reports),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Thin reqwest wrapper around the detection endpoint.
pub struct DetectClient {
    http: Client,
    base_url: String,
}

impl DetectClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// One best-effort round trip: upload the selection, validate the
    /// response shape, hand back the reports verbatim. No retries and no
    /// cancellation; callers enforce single-flight admission.
    pub async fn detect(&self, selection: &FileSelection) -> Result<Vec<DetectReport>, SubmitError> {
        let mut form = multipart::Form::new();
        for file in selection.files() {
            let part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            form = form.part(UPLOAD_FIELD, part);
        }

        let url = format!("{}{DETECT_PATH}", self.base_url);
        info!(
            url = %url,
            files = selection.len(),
            total_bytes = selection.total_bytes(),
            "detect: submitting selection"
        );
        let response = self.http.post(&url).multipart(form).send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            let body = recover_error_body(response, &content_type).await;
            warn!(status = status.as_u16(), "detect: server returned error status");
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // A success status with a non-JSON body is a disguised failure,
        // typically an HTML error page behind a 200.
        if !content_type.contains("application/json") {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(SubmitError::ContentType { content_type, body });
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;
        validate_payload(payload)
    }
}

/// Shape validation for a parsed response body: `ok` must be literally
/// `true` and `results` a non-empty array before any typed decoding.
fn validate_payload(payload: Value) -> Result<Vec<DetectReport>, SubmitError> {
    if payload.get("ok").and_then(Value::as_bool) != Some(true) {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("detection failed (server returned ok != true)")
            .to_string();
        return Err(SubmitError::Rejected(message));
    }

    // Missing, non-array and empty all converge on the same failure.
    let has_results = matches!(
        payload.get("results").and_then(Value::as_array),
        Some(results) if !results.is_empty()
    );
    if !has_results {
        return Err(SubmitError::NoResults);
    }

    let response: DetectResponse = serde_json::from_value(payload)?;
    Ok(response.results)
}

/// Best-effort body recovery for a non-success status. The recovered text
/// becomes part of the user-facing message, so a read failure is reported
/// as text rather than bubbling up.
async fn recover_error_body(response: reqwest::Response, content_type: &str) -> String {
    match response.text().await {
        Ok(text) => {
            if content_type.contains("application/json") {
                match serde_json::from_str::<Value>(&text) {
                    Ok(value) => value.to_string(),
                    Err(_) => text,
                }
            } else {
                text
            }
        }
        Err(err) => format!("could not read response body: {err}"),
    }
}

/// Interaction state for one page instance: the current selection plus the
/// outcome of the latest submit. Driven by discrete events from a single
/// caller; nothing here is shared or locked.
pub struct DetectPage {
    client: DetectClient,
    selection: FileSelection,
    state: SubmissionState,
    error: Option<String>,
}

impl DetectPage {
    pub fn new(client: DetectClient) -> Self {
        Self {
            client,
            selection: FileSelection::default(),
            state: SubmissionState::Idle,
            error: None,
        }
    }

    /// Picker change event. An in-bound batch replaces the selection and
    /// clears stale results and errors; an oversize batch is rejected
    /// wholesale and the selection resets to empty.
    pub fn pick_files(&mut self, picked: Vec<PickedFile>) {
        if self.state.is_in_flight() {
            return;
        }

        match FileSelection::from_picked(picked) {
            Ok(selection) => {
                self.selection = selection;
                self.state = SubmissionState::Idle;
                self.error = None;
            }
            Err(err) => {
                warn!(
                    total_bytes = err.total_bytes,
                    "selection rejected: over upload budget"
                );
                self.selection.clear();
                self.error = Some(err.to_string());
            }
        }
    }

    /// Form submit event. Refused while a request is in flight and for an
    /// empty selection; neither refusal touches the network. Every other
    /// path lands in `Succeeded` or `Failed`, so the in-flight flag cannot
    /// outlive the round trip.
    pub async fn submit(&mut self) {
        if self.state.is_in_flight() {
            return;
        }
        if self.selection.is_empty() {
            self.error = Some("please select one or more images".to_string());
            return;
        }

        self.error = None;
        self.state = SubmissionState::InFlight;
        self.state = match self.client.detect(&self.selection).await {
            Ok(reports) => SubmissionState::Succeeded(reports),
            Err(err) => SubmissionState::Failed(err.to_string()),
        };
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Inline message from selection or submit-guard refusals. Round-trip
    /// failures live in `SubmissionState::Failed` instead.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mirrors the submit control being disabled while a request is in
    /// flight or nothing is selected.
    pub fn can_submit(&self) -> bool {
        !self.state.is_in_flight() && !self.selection.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
