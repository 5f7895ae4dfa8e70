//! Enhanced source detection
//!
//! Fuses the content-based platform heuristic with the OS-level active
//! application into a single attribution decision, and always attaches an
//! independent content classification. Total: both halves have guaranteed
//! fallbacks, so detection can never fail.

use super::app_tracker::OWN_PROCESS_LABEL;
use super::classifier::{Classification, Classifier};
use super::platform::detect_platform;

/// Heuristic confidence above which content fingerprints beat the OS signal
const HEURISTIC_TRUST_THRESHOLD: u8 = 70;

/// Confidence assigned to an adopted OS-tracked application
const OS_APP_CONFIDENCE: u8 = 60;

/// Floor applied when falling back to a low-confidence heuristic guess
const FALLBACK_CONFIDENCE_FLOOR: u8 = 30;

/// Labels that only tell us the user was in a file browser; too generic
/// to be a useful attribution.
const GENERIC_BROWSER_LABELS: &[&str] = &["finder", "explorer", "explorer.exe", "files"];

/// Where a captured item came from, with the decision trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub source_app: String,
    pub confidence: u8,
    pub reasoning: Vec<String>,
}

/// Combined attribution + classification for one capture.
#[derive(Debug, Clone)]
pub struct Detection {
    pub attribution: Attribution,
    pub classification: Classification,
}

/// Fusion component combining heuristics with tracker output.
pub struct EnhancedDetector {
    classifier: Classifier,
}

impl Default for EnhancedDetector {
    fn default() -> Self {
        Self::new(Classifier::new())
    }
}

impl EnhancedDetector {
    pub fn new(classifier: Classifier) -> Self {
        EnhancedDetector { classifier }
    }

    /// Decide attribution for `content` copied while `os_app` (if known)
    /// was frontmost. Never fails; both outputs are always populated.
    pub fn detect(&self, content: &str, os_app: Option<&str>) -> Detection {
        let guess = detect_platform(content);
        let mut reasoning: Vec<String> = Vec::new();

        let attribution = if guess.confidence > HEURISTIC_TRUST_THRESHOLD {
            reasoning.push(format!(
                "content fingerprints match {} ({}%)",
                guess.platform.as_str(),
                guess.confidence
            ));
            for indicator in &guess.indicators {
                reasoning.push(format!("indicator: {}", indicator));
            }
            Attribution {
                source_app: guess.platform.as_str().to_string(),
                confidence: guess.confidence,
                reasoning,
            }
        } else if let Some(app) = usable_os_app(os_app) {
            reasoning.push(format!("tracked active application: {}", app));
            reasoning.push(format!(
                "platform heuristic inconclusive ({} at {}%)",
                guess.platform.as_str(),
                guess.confidence
            ));
            Attribution {
                source_app: app.to_string(),
                confidence: OS_APP_CONFIDENCE,
                reasoning,
            }
        } else {
            reasoning.push(format!(
                "no usable OS attribution, falling back to heuristic {} ({}%)",
                guess.platform.as_str(),
                guess.confidence
            ));
            Attribution {
                source_app: guess.platform.as_str().to_string(),
                confidence: guess.confidence.max(FALLBACK_CONFIDENCE_FLOOR),
                reasoning,
            }
        };

        let classification = self.classifier.classify(content);
        let mut attribution = attribution;
        attribution.reasoning.push(format!(
            "content classified as {} ({}%)",
            classification.kind.as_str(),
            classification.confidence
        ));

        Detection {
            attribution,
            classification,
        }
    }
}

/// OS labels we refuse to attribute to: our own process and generic
/// filesystem browsers.
fn usable_os_app(os_app: Option<&str>) -> Option<&str> {
    let app = os_app?.trim();
    if app.is_empty() {
        return None;
    }
    if app.eq_ignore_ascii_case(OWN_PROCESS_LABEL) {
        return None;
    }
    if GENERIC_BROWSER_LABELS
        .iter()
        .any(|label| app.eq_ignore_ascii_case(label))
    {
        return None;
    }
    Some(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::classifier::ContentKind;

    fn detector() -> EnhancedDetector {
        EnhancedDetector::default()
    }

    #[test]
    fn test_confident_heuristic_wins_over_os_app() {
        let detection = detector().detect("$ cargo test --workspace", Some("Safari"));
        assert_eq!(detection.attribution.source_app, "Terminal");
        assert_eq!(detection.attribution.confidence, 80);
    }

    #[test]
    fn test_os_app_adopted_when_heuristic_weak() {
        let detection = detector().detect("some plain sentence", Some("Slack"));
        assert_eq!(detection.attribution.source_app, "Slack");
        assert_eq!(detection.attribution.confidence, 60);
    }

    #[test]
    fn test_own_process_label_is_rejected() {
        let detection = detector().detect("some plain sentence", Some("clipstack"));
        assert_eq!(detection.attribution.source_app, "Unknown");
        assert_eq!(detection.attribution.confidence, 30);
    }

    #[test]
    fn test_generic_file_browser_is_rejected() {
        let detection = detector().detect("some plain sentence", Some("Finder"));
        assert_eq!(detection.attribution.source_app, "Unknown");
        // Unknown heuristic confidence (20) floored at 30
        assert_eq!(detection.attribution.confidence, 30);
    }

    #[test]
    fn test_missing_os_app_falls_back_to_heuristic_label() {
        let detection = detector().detect("some plain sentence", None);
        assert_eq!(detection.attribution.source_app, "Unknown");
        assert_eq!(detection.attribution.confidence, 30);
    }

    #[test]
    fn test_classification_always_populated() {
        let detection = detector().detect("https://example.com/path", Some("Safari"));
        assert_eq!(detection.classification.kind, ContentKind::Url);
        assert_eq!(detection.classification.confidence, 95);
        // Attribution is orthogonal and still present
        assert_eq!(detection.attribution.source_app, "Safari");
    }

    #[test]
    fn test_reasoning_trail_mentions_classification() {
        let detection = detector().detect("#FF5733", Some("Figma"));
        assert!(detection
            .attribution
            .reasoning
            .iter()
            .any(|line| line.contains("classified as color")));
    }

    #[test]
    fn test_detect_is_total_on_odd_input() {
        for content in ["", "\u{0}", "🎉🎉", "\x1b["] {
            let detection = detector().detect(content, None);
            assert!(!detection.attribution.source_app.is_empty());
            assert!(detection.attribution.confidence >= 20);
        }
    }
}
