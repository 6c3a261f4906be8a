use serde::{Deserialize, Serialize};
use swf_data::ErrorFlags;

/// Settings shared by every read an [`Extractor`](crate::Extractor) performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Fault categories that abort an operation. Disabled categories are logged and recovered.
    pub errors: ErrorFlags,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            errors: ErrorFlags::default(),
        }
    }
}

impl ExtractOptions {
    /// Strict mode: every fault category aborts, invalid tags included.
    pub fn strict() -> Self {
        Self {
            errors: ErrorFlags::all(),
        }
    }

    /// Lenient mode: every fault is recovered.
    pub fn lenient() -> Self {
        Self {
            errors: ErrorFlags::empty(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.errors.contains(ErrorFlags::OUT_OF_BOUNDS));
        assert!(!options.errors.contains(ErrorFlags::INVALID_TAG));
    }

    #[test]
    fn test_options_from_json() {
        let options = ExtractOptions::from_json(r#"{"errors": "CIRCULAR_REFERENCE | INVALID_TAG"}"#).unwrap();
        assert_eq!(options.errors, ErrorFlags::CIRCULAR_REFERENCE | ErrorFlags::INVALID_TAG);

        let options = ExtractOptions::from_json("{}").unwrap();
        assert_eq!(options, ExtractOptions::default());
    }
}
