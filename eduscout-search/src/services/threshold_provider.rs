//! Adaptive Threshold Provider
//!
//! Thresholds are a pure function of the context's subject family and grade
//! band: base values plus additive adjustments, clamped to configured floors
//! (and to 100 for confidences).

use crate::config::{ThresholdAdjustment, ThresholdConfig};
use crate::models::{SearchContext, Thresholds};

pub struct ThresholdProvider {
    config: ThresholdConfig,
}

impl ThresholdProvider {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Thresholds for `context`
    pub fn thresholds(&self, context: &SearchContext) -> Thresholds {
        let c = &self.config;
        let subject = self.adjustment(&c.subject_adjustments, context.subject_kind().key());
        let grade = self.adjustment(&c.grade_adjustments, context.grade_band().key());

        let min_confidence = i64::from(c.base_min_confidence)
            + i64::from(subject.min_confidence)
            + i64::from(grade.min_confidence);
        let min_result_count = c.base_min_result_count as i64
            + i64::from(subject.min_result_count)
            + i64::from(grade.min_result_count);
        let fallback_confidence = i64::from(c.base_fallback_confidence)
            + i64::from(subject.fallback_confidence)
            + i64::from(grade.fallback_confidence);

        Thresholds {
            min_confidence: clamp_percent(min_confidence, c.floor_min_confidence),
            min_result_count: min_result_count.max(c.floor_min_result_count as i64) as usize,
            fallback_confidence_threshold: clamp_percent(
                fallback_confidence,
                c.floor_fallback_confidence,
            ),
        }
    }

    fn adjustment(
        &self,
        table: &std::collections::BTreeMap<String, ThresholdAdjustment>,
        key: &str,
    ) -> ThresholdAdjustment {
        table.get(key).copied().unwrap_or_default()
    }
}

fn clamp_percent(value: i64, floor: u8) -> u8 {
    value.clamp(i64::from(floor.min(100)), 100) as u8
}
