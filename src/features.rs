//! Feature derivation
//!
//! This module derives per-record engagement features from observations:
//! - Screen-on time in minutes
//! - Engagement ratio (in-app time / screen-on time)
//! - Engagement ratio clipped for display

use crate::config::DEFAULT_ENGAGEMENT_CLIP;
use crate::error::AnalysisError;
use crate::types::{DerivedObservation, Observation, QualityFlag};

const MINUTES_PER_HOUR: f64 = 60.0;

/// Derive engagement features for every observation using the default clip ceiling.
///
/// Output has the same length and order as the input.
pub fn derive_metrics(observations: &[Observation]) -> Result<Vec<DerivedObservation>, AnalysisError> {
    MetricsDeriver::default().derive(observations)
}

/// Feature deriver for engagement metrics
#[derive(Debug, Clone, Copy)]
pub struct MetricsDeriver {
    clip_ceiling: f64,
}

impl Default for MetricsDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_ENGAGEMENT_CLIP)
    }
}

impl MetricsDeriver {
    pub fn new(clip_ceiling: f64) -> Self {
        Self { clip_ceiling }
    }

    /// Derive features for a batch. An empty batch is rejected; a zero screen-on
    /// time only leaves that record's ratio undefined.
    pub fn derive(
        &self,
        observations: &[Observation],
    ) -> Result<Vec<DerivedObservation>, AnalysisError> {
        if observations.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let derived: Vec<DerivedObservation> = observations
            .iter()
            .cloned()
            .map(|obs| self.derive_one(obs))
            .collect();

        let undefined = derived
            .iter()
            .filter(|d| d.engagement_ratio.is_none())
            .count();
        if undefined > 0 {
            tracing::warn!(undefined, "engagement ratio undefined for some records");
        }
        tracing::debug!(records = derived.len(), "derived engagement metrics");

        Ok(derived)
    }

    /// Derive features for a single observation
    pub fn derive_one(&self, observation: Observation) -> DerivedObservation {
        let screen_on_time_min_per_day = screen_minutes(observation.screen_on_time_hours_per_day);
        let engagement_ratio =
            compute_engagement_ratio(observation.app_usage_time_min_per_day, screen_on_time_min_per_day);
        let engagement_ratio_clipped = engagement_ratio.map(|r| r.min(self.clip_ceiling));

        let mut quality_flags = Vec::new();
        match engagement_ratio {
            None if screen_on_time_min_per_day > 0.0 => quality_flags.push(QualityFlag::NonFiniteRatio),
            None => quality_flags.push(QualityFlag::ZeroScreenTime),
            Some(r) if r > self.clip_ceiling => quality_flags.push(QualityFlag::RatioClipped),
            Some(_) => {}
        }

        DerivedObservation {
            observation,
            screen_on_time_min_per_day,
            engagement_ratio,
            engagement_ratio_clipped,
            quality_flags,
        }
    }
}

fn screen_minutes(hours: f64) -> f64 {
    hours * MINUTES_PER_HOUR
}

/// Fraction of screen-on time spent in apps; undefined without screen-on time
fn compute_engagement_ratio(app_usage_min: f64, screen_on_min: f64) -> Option<f64> {
    if screen_on_min > 0.0 {
        let ratio = app_usage_min / screen_on_min;
        ratio.is_finite().then_some(ratio)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BehaviorClass, Demographics};

    fn make_observation(app_min: f64, screen_hours: f64) -> Observation {
        Observation {
            app_usage_time_min_per_day: app_min,
            screen_on_time_hours_per_day: screen_hours,
            number_of_apps_installed: 40,
            user_behavior_class: BehaviorClass::new(3).unwrap(),
            demographics: Demographics::default(),
        }
    }

    #[test]
    fn test_screen_minutes() {
        let derived = derive_metrics(&[make_observation(120.0, 4.5)]).unwrap();
        assert_eq!(derived[0].screen_on_time_min_per_day, 4.5 * 60.0);
    }

    #[test]
    fn test_engagement_ratio() {
        let derived = derive_metrics(&[make_observation(120.0, 4.0)]).unwrap();
        // 120 / 240 = 0.5
        assert!((derived[0].engagement_ratio.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(derived[0].engagement_ratio_clipped, Some(0.5));
        assert!(derived[0].quality_flags.is_empty());
    }

    #[test]
    fn test_ratio_clipped_at_ceiling() {
        // 300 / 120 = 2.5, clipped to 1.2
        let derived = derive_metrics(&[make_observation(300.0, 2.0)]).unwrap();
        assert!((derived[0].engagement_ratio.unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(derived[0].engagement_ratio_clipped, Some(1.2));
        assert_eq!(derived[0].quality_flags, vec![QualityFlag::RatioClipped]);
    }

    #[test]
    fn test_zero_screen_time_is_per_record() {
        let derived = derive_metrics(&[
            make_observation(60.0, 1.0),
            make_observation(30.0, 0.0),
            make_observation(0.0, 0.0),
        ])
        .unwrap();

        assert_eq!(derived.len(), 3);
        assert_eq!(derived[0].engagement_ratio, Some(1.0));
        assert_eq!(derived[1].engagement_ratio, None);
        assert_eq!(derived[1].engagement_ratio_clipped, None);
        assert_eq!(derived[1].quality_flags, vec![QualityFlag::ZeroScreenTime]);
        assert_eq!(derived[2].engagement_ratio, None);
    }

    #[test]
    fn test_overflowing_ratio_is_not_zero_screen_time() {
        let derived = MetricsDeriver::default().derive_one(make_observation(1e300, 1e-300));

        assert!(derived.screen_on_time_min_per_day > 0.0);
        assert_eq!(derived.engagement_ratio, None);
        assert_eq!(derived.quality_flags, vec![QualityFlag::NonFiniteRatio]);
    }

    #[test]
    fn test_preserves_order() {
        let input: Vec<Observation> = (1..=5)
            .map(|i| make_observation(i as f64 * 10.0, i as f64))
            .collect();
        let derived = derive_metrics(&input).unwrap();

        for (obs, d) in input.iter().zip(&derived) {
            assert_eq!(&d.observation, obs);
        }
    }

    #[test]
    fn test_custom_ceiling() {
        let deriver = MetricsDeriver::new(1.0);
        let derived = deriver.derive_one(make_observation(130.0, 2.0));
        assert_eq!(derived.engagement_ratio_clipped, Some(1.0));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(derive_metrics(&[]), Err(AnalysisError::EmptyDataset)));
    }
}
