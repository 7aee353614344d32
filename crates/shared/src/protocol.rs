use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Envelope returned by `POST /api/detect`.
///
/// Every field the backend may omit is optional or defaulted; shape
/// validation beyond that (`ok == true`, non-empty `results`) happens at the
/// submission boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Vec<DetectReport>,
}

/// One per submitted image, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectReport {
    #[serde(default)]
    pub filename: String,
    /// Annotated image, either raw base64 or a full `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<DetectionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_class: Option<BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    /// Coordinates are passed through verbatim; units are backend-defined.
    pub bbox: [f64; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_full_payload() {
        let raw = r#"{
            "ok": true,
            "results": [{
                "filename": "a.jpg",
                "image_base64": "aGVsbG8=",
                "summary": { "total": 2, "by_class": { "car": 1, "person": 1 } },
                "detections": [
                    { "class_name": "car", "confidence": 0.9, "bbox": [1.0, 2.0, 3.0, 4.0] }
                ]
            }]
        }"#;

        let payload: DetectResponse = serde_json::from_str(raw).expect("payload");
        assert!(payload.ok);
        assert_eq!(payload.results.len(), 1);
        let report = &payload.results[0];
        assert_eq!(report.filename, "a.jpg");
        assert_eq!(report.summary.as_ref().and_then(|s| s.total), Some(2));
        assert_eq!(
            report.detections.as_ref().map(|d| d[0].class_name.as_str()),
            Some("car")
        );
    }

    #[test]
    fn missing_optional_fields_default_to_none() {
        let payload: DetectResponse =
            serde_json::from_str(r#"{ "ok": true, "results": [{ "filename": "b.png" }] }"#)
                .expect("payload");
        let report = &payload.results[0];
        assert!(report.image_base64.is_none());
        assert!(report.summary.is_none());
        assert!(report.detections.is_none());
    }

    #[test]
    fn missing_results_defaults_to_empty() {
        let payload: DetectResponse = serde_json::from_str(r#"{ "ok": false }"#).expect("payload");
        assert!(!payload.ok);
        assert!(payload.results.is_empty());
        assert!(payload.error.is_none());
    }
}
