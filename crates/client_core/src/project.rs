use shared::protocol::{DetectReport, Detection};

/// Renderable projection of one report. `None` image and empty detection
/// lists stand in for the "no annotated image" / "no detections"
/// placeholders; the rendering layer decides the wording.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub filename: String,
    /// Always a full `data:` URI when present.
    pub image_src: Option<String>,
    pub total: u64,
    /// `(class, count)` pairs sorted by class name; `None` when the server
    /// sent no per-class summary, so the block can be omitted entirely.
    pub class_counts: Option<Vec<(String, u64)>>,
    pub detections: Vec<DetectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionView {
    pub class_name: String,
    /// Confidence formatted to two decimal places.
    pub confidence: String,
    /// Coordinates rounded to the nearest integer, original order.
    pub bbox: [i64; 4],
}

/// Pure projection of validated reports into view data. Absent fields
/// degrade to placeholders; this never fails.
pub fn project(reports: &[DetectReport]) -> Vec<ReportView> {
    reports.iter().map(project_report).collect()
}

fn project_report(report: &DetectReport) -> ReportView {
    let total = report
        .summary
        .as_ref()
        .and_then(|summary| summary.total)
        .or_else(|| report.detections.as_ref().map(|d| d.len() as u64))
        .unwrap_or(0);

    let class_counts = report
        .summary
        .as_ref()
        .and_then(|summary| summary.by_class.as_ref())
        .map(|counts| {
            counts
                .iter()
                .map(|(class, count)| (class.clone(), *count))
                .collect()
        });

    let detections = report
        .detections
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(project_detection)
        .collect();

    ReportView {
        filename: report.filename.clone(),
        image_src: report.image_base64.as_deref().map(image_src),
        total,
        class_counts,
        detections,
    }
}

fn image_src(image_base64: &str) -> String {
    let trimmed = image_base64.trim();
    if trimmed.starts_with("data:") {
        trimmed.to_string()
    } else {
        format!("data:image/png;base64,{trimmed}")
    }
}

fn project_detection(detection: &Detection) -> DetectionView {
    DetectionView {
        class_name: detection.class_name.clone(),
        confidence: format!("{:.2}", detection.confidence),
        bbox: detection.bbox.map(|coord| coord.round() as i64),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use shared::protocol::DetectionSummary;

    use super::*;

    fn report_with_detections(detections: Vec<Detection>) -> DetectReport {
        DetectReport {
            filename: "a.jpg".into(),
            image_base64: None,
            summary: None,
            detections: Some(detections),
        }
    }

    #[test]
    fn formats_confidence_and_rounds_bbox() {
        let views = project(&[report_with_detections(vec![Detection {
            class_name: "car".into(),
            confidence: 0.8567,
            bbox: [1.2, 3.7, 100.4, 200.9],
        }])]);

        assert_eq!(views.len(), 1);
        let detection = &views[0].detections[0];
        assert_eq!(detection.class_name, "car");
        assert_eq!(detection.confidence, "0.86");
        assert_eq!(detection.bbox, [1, 4, 100, 201]);
    }

    #[test]
    fn projection_is_idempotent() {
        let reports = vec![DetectReport {
            filename: "a.jpg".into(),
            image_base64: Some("aGVsbG8=".into()),
            summary: Some(DetectionSummary {
                total: Some(3),
                by_class: Some(BTreeMap::from([
                    ("person".to_string(), 2),
                    ("car".to_string(), 1),
                ])),
            }),
            detections: Some(vec![Detection {
                class_name: "car".into(),
                confidence: 0.5,
                bbox: [0.0, 0.0, 1.0, 1.0],
            }]),
        }];

        assert_eq!(project(&reports), project(&reports));
    }

    #[test]
    fn wraps_raw_base64_as_png_data_uri() {
        let mut report = report_with_detections(Vec::new());
        report.image_base64 = Some(" aGVsbG8= ".into());
        let views = project(&[report]);
        assert_eq!(
            views[0].image_src.as_deref(),
            Some("data:image/png;base64,aGVsbG8=")
        );
    }

    #[test]
    fn keeps_existing_data_uri_verbatim() {
        let mut report = report_with_detections(Vec::new());
        report.image_base64 = Some("data:image/jpeg;base64,aGVsbG8=".into());
        let views = project(&[report]);
        assert_eq!(
            views[0].image_src.as_deref(),
            Some("data:image/jpeg;base64,aGVsbG8=")
        );
    }

    #[test]
    fn total_prefers_summary_then_detection_count_then_zero() {
        let mut with_summary = report_with_detections(vec![Detection {
            class_name: "car".into(),
            confidence: 0.5,
            bbox: [0.0; 4],
        }]);
        with_summary.summary = Some(DetectionSummary {
            total: Some(7),
            by_class: None,
        });

        let from_count = report_with_detections(vec![
            Detection {
                class_name: "car".into(),
                confidence: 0.5,
                bbox: [0.0; 4],
            },
            Detection {
                class_name: "person".into(),
                confidence: 0.5,
                bbox: [0.0; 4],
            },
        ]);

        let bare = DetectReport {
            filename: "bare.jpg".into(),
            image_base64: None,
            summary: None,
            detections: None,
        };

        let views = project(&[with_summary, from_count, bare]);
        assert_eq!(views[0].total, 7);
        assert_eq!(views[1].total, 2);
        assert_eq!(views[2].total, 0);
    }

    #[test]
    fn bare_report_degrades_to_placeholders() {
        let views = project(&[DetectReport {
            filename: String::new(),
            image_base64: None,
            summary: None,
            detections: None,
        }]);

        let view = &views[0];
        assert!(view.image_src.is_none());
        assert!(view.class_counts.is_none());
        assert!(view.detections.is_empty());
    }

    #[test]
    fn class_counts_are_sorted_by_class_name() {
        let mut report = report_with_detections(Vec::new());
        report.summary = Some(DetectionSummary {
            total: None,
            by_class: Some(BTreeMap::from([
                ("person".to_string(), 2),
                ("car".to_string(), 1),
                ("helmet".to_string(), 4),
            ])),
        });

        let views = project(&[report]);
        assert_eq!(
            views[0].class_counts,
            Some(vec![
                ("car".to_string(), 1),
                ("helmet".to_string(), 4),
                ("person".to_string(), 2),
            ])
        );
    }
}
