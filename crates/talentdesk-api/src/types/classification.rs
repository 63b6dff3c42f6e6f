//! AI thread classification.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Classification of a thread returned by `POST /ai/classify-thread`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Category label as produced by the classifier (e.g. `Deal`, `Scam`).
    pub category: String,
    /// Confidence in percent, clamped to 0..=100.
    pub confidence: u8,
    /// Human-readable reasons for the classification.
    pub reasons: Vec<String>,
}

impl ClassificationResult {
    /// Creates a classification result.
    #[must_use]
    pub fn new(category: impl Into<String>, confidence: u8) -> Self {
        Self {
            category: category.into(),
            confidence: confidence.min(100),
            reasons: Vec::new(),
        }
    }

    /// Adds a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }
}

/// Raw classifier response; every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClassificationPayload {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasons: Vec<String>,
}

impl ClassificationPayload {
    /// Validates the payload. A response without a category is never a result.
    pub(crate) fn into_result(self) -> Result<ClassificationResult> {
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::InvalidResponse("classification has no category".into()))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map_or(0, |c| c.round().clamp(0.0, 100.0) as u8);

        Ok(ClassificationResult {
            category,
            confidence,
            reasons: self.reasons,
        })
    }
}
