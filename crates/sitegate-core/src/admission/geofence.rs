//! Geofence evaluation: great-circle distance and admissibility.
//!
//! Pure functions only. The evaluator holds nothing but its accuracy policy,
//! so it is `Copy` and can be shared freely.

use tracing::debug;

use crate::domain::{
    AccuracyPolicy, GeoPoint, Geofence, GeofenceEvaluation, GeofenceReason, Position,
};

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
///
/// Identical points return exactly `0.0`.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Decides whether an observed position is acceptable for a geofence.
///
/// Order of rules:
/// 1. `distance <= radius` is always admissible.
/// 2. Non-strict fences also admit `distance <= radius + allowedVariance`.
/// 3. If the policy is lenient and the fix is poor, admit when
///    `distance - min(accuracy, cap) <= radius`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceEvaluator {
    policy: AccuracyPolicy,
}

impl GeofenceEvaluator {
    pub fn new(policy: AccuracyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccuracyPolicy {
        &self.policy
    }

    pub fn evaluate(&self, position: &Position, fence: &Geofence) -> GeofenceEvaluation {
        let distance = haversine_distance(&position.point, &fence.center);
        let inside_radius = distance <= fence.radius;
        let allowed_radius = fence.effective_radius();
        let gps_quality = self.policy.classify(position.accuracy);
        let buffer = self.policy.buffer_for(position.accuracy);

        let reason = if inside_radius {
            GeofenceReason::InsideRadius
        } else if distance <= allowed_radius {
            GeofenceReason::WithinAllowedVariance
        } else if buffer.is_some_and(|b| distance - b <= fence.radius) {
            GeofenceReason::WithinAccuracyBuffer
        } else {
            GeofenceReason::OutsideGeofence
        };

        let evaluation = GeofenceEvaluation {
            distance_meters: distance,
            inside_radius,
            admissible: reason != GeofenceReason::OutsideGeofence,
            radius_meters: fence.radius,
            allowed_radius_meters: allowed_radius,
            accuracy_buffer_meters: buffer,
            gps_quality,
            reason,
        };
        debug!(
            distance_m = distance,
            radius_m = fence.radius,
            strict = fence.strict_mode,
            ?gps_quality,
            ?reason,
            "geofence evaluated"
        );
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GpsQuality;
    use rstest::rstest;

    fn nyc() -> GeoPoint {
        GeoPoint::new(40.7128, -74.0060).unwrap()
    }

    fn strict_fence(radius: f64) -> Geofence {
        Geofence::strict(nyc(), radius)
    }

    #[test]
    fn identical_points_are_exactly_zero() {
        let p = nyc();
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = nyc();
        let b = GeoPoint::new(40.7200, -74.0060).unwrap();
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(1.0, 0.0).unwrap();
        let d = haversine_distance(&a, &b);
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 180.0).unwrap();
        let d = haversine_distance(&a, &b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn nearby_fix_is_admissible() {
        let position = Position::new(40.7130, -74.0058).unwrap();
        let eval = GeofenceEvaluator::default().evaluate(&position, &strict_fence(100.0));

        assert!(eval.distance_meters > 20.0 && eval.distance_meters < 32.0);
        assert!(eval.inside_radius);
        assert!(eval.admissible);
        assert_eq!(eval.reason, GeofenceReason::InsideRadius);
    }

    #[test]
    fn fix_800m_away_is_rejected() {
        let position = Position::new(40.7200, -74.0060).unwrap();
        let eval = GeofenceEvaluator::default().evaluate(&position, &strict_fence(100.0));

        assert!((eval.distance_meters - 800.0).abs() < 10.0, "got {}", eval.distance_meters);
        assert!(!eval.inside_radius);
        assert!(!eval.admissible);
        assert_eq!(eval.reason, GeofenceReason::OutsideGeofence);
    }

    #[test]
    fn exact_radius_is_inside_and_one_meter_less_is_outside() {
        let position = Position::new(40.7140, -74.0049).unwrap();
        let d = haversine_distance(&position.point, &nyc());
        let evaluator = GeofenceEvaluator::new(AccuracyPolicy::strict());

        let on_edge = evaluator.evaluate(&position, &strict_fence(d));
        assert!(on_edge.inside_radius);
        assert!(on_edge.admissible);

        let past_edge = evaluator.evaluate(&position, &strict_fence(d - 1.0));
        assert!(!past_edge.inside_radius);
        assert!(!past_edge.admissible);
    }

    #[rstest]
    #[case::within_variance(50.0, true)]
    #[case::beyond_variance(5.0, false)]
    fn variance_applies_only_when_not_strict(#[case] variance: f64, #[case] admissible: bool) {
        // ~111 m north of center
        let position = Position::new(40.7138, -74.0060).unwrap();
        let evaluator = GeofenceEvaluator::new(AccuracyPolicy::strict());

        let lenient = Geofence::lenient(nyc(), 100.0, variance);
        let eval = evaluator.evaluate(&position, &lenient);
        assert!(!eval.inside_radius);
        assert_eq!(eval.admissible, admissible);

        let mut strict = lenient;
        strict.strict_mode = true;
        assert!(!evaluator.evaluate(&position, &strict).admissible);
    }

    #[rstest]
    #[case::good_fix_gets_no_credit(Some(30.0), false, GpsQuality::Good)]
    #[case::poor_fix_gets_credit(Some(80.0), true, GpsQuality::Poor)]
    #[case::very_poor_fix_gets_credit(Some(150.0), true, GpsQuality::VeryPoor)]
    #[case::no_accuracy(None, false, GpsQuality::Unknown)]
    fn accuracy_buffer(
        #[case] accuracy: Option<f64>,
        #[case] admissible: bool,
        #[case] quality: GpsQuality,
    ) {
        // ~155 m north: outside 100 m, inside 100 m + 80 m credit.
        let mut position = Position::new(40.7142, -74.0060).unwrap();
        if let Some(a) = accuracy {
            position = position.with_accuracy(a);
        }
        let eval = GeofenceEvaluator::default().evaluate(&position, &strict_fence(100.0));

        assert!(!eval.inside_radius);
        assert_eq!(eval.admissible, admissible);
        assert_eq!(eval.gps_quality, quality);
        if admissible {
            assert_eq!(eval.reason, GeofenceReason::WithinAccuracyBuffer);
        }
    }

    #[test]
    fn accuracy_credit_is_capped() {
        // ~800 m away: even a 5 km accuracy circle only earns the 200 m cap.
        let position = Position::new(40.7200, -74.0060)
            .unwrap()
            .with_accuracy(5_000.0);
        let eval = GeofenceEvaluator::default().evaluate(&position, &strict_fence(100.0));
        assert_eq!(eval.accuracy_buffer_meters, Some(200.0));
        assert!(!eval.admissible);
    }

    #[test]
    fn strict_policy_ignores_accuracy() {
        let position = Position::new(40.7142, -74.0060).unwrap().with_accuracy(150.0);
        let eval = GeofenceEvaluator::new(AccuracyPolicy::strict())
            .evaluate(&position, &strict_fence(100.0));
        assert!(!eval.admissible);
        assert_eq!(eval.accuracy_buffer_meters, None);
    }
}
