//! Circle selections: bounding-box prefilter, exact distance test, category tally

use artmap_core::models::{AggregateResult, Artifact, Bounds, CircleSelection};

use crate::distance::{distance_meters, EARTH_RADIUS_METERS};

/// Slack added to the prefilter box so boundary points survive rounding
const PREFILTER_SLACK_DEGREES: f64 = 1e-9;

/// Bounding box guaranteed to contain every point within `circle.radius`.
///
/// The latitude extent is the angular radius on the sphere; the longitude
/// extent is the widest the circle gets at any latitude it covers. A circle
/// reaching a pole spans every longitude. The box is clamped to the valid
/// coordinate range and does not wrap the antimeridian. Only a candidate
/// filter: results must still go through [`within_circle`].
pub fn prefilter_bounds(circle: &CircleSelection) -> Bounds {
    let center = circle.center;
    let angular = (circle.radius / EARTH_RADIUS_METERS).max(0.0);
    let lat_delta = angular.to_degrees() + PREFILTER_SLACK_DEGREES;

    let north = center.lat + lat_delta;
    let south = center.lat - lat_delta;

    if north >= 90.0 || south <= -90.0 {
        return Bounds::new(north.min(90.0), south.max(-90.0), 180.0, -180.0);
    }

    let ratio = angular.sin() / center.lat.to_radians().cos();
    let lng_delta = if ratio >= 1.0 || angular >= std::f64::consts::FRAC_PI_2 {
        180.0
    } else {
        ratio.asin().to_degrees() + PREFILTER_SLACK_DEGREES
    };

    Bounds::new(
        north,
        south,
        (center.lng + lng_delta).min(180.0),
        (center.lng - lng_delta).max(-180.0),
    )
}

/// Exact inclusive distance test: a point at exactly `radius` is inside
pub fn within_circle(circle: &CircleSelection, lat: f64, lng: f64) -> bool {
    distance_meters(circle.center.lat, circle.center.lng, lat, lng) <= circle.radius
}

/// Count matches per category; categories with no matches are absent
pub fn tally_categories(artifacts: Vec<Artifact>) -> AggregateResult {
    let mut result = AggregateResult::default();
    for artifact in &artifacts {
        *result.categories.entry(artifact.category.clone()).or_insert(0) += 1;
    }
    result.count = artifacts.len();
    result.artifacts = artifacts;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use artmap_core::models::{ArtifactId, InsertArtifact};
    use proptest::prelude::*;

    fn artifact(category: &str) -> Artifact {
        InsertArtifact::new("a", category, 0.0, 0.0).into_artifact(ArtifactId::new())
    }

    #[test]
    fn test_within_circle_is_inclusive() {
        let circle = CircleSelection::new(41.5, -72.7, 0.0);
        let radius = distance_meters(41.5, -72.7, 41.5045, -72.7);
        let circle = CircleSelection { radius, ..circle };

        assert!(within_circle(&circle, 41.5045, -72.7));
        assert!(within_circle(&circle, 41.5, -72.7));
        assert!(!within_circle(&circle, 41.5046, -72.7));
    }

    #[test]
    fn test_prefilter_covers_pole() {
        let bounds = prefilter_bounds(&CircleSelection::new(89.9, 10.0, 50_000.0));
        assert_eq!(bounds.north, 90.0);
        assert_eq!(bounds.east, 180.0);
        assert_eq!(bounds.west, -180.0);
    }

    #[test]
    fn test_prefilter_widens_longitude_at_high_latitude() {
        let bounds = prefilter_bounds(&CircleSelection::new(60.0, 0.0, 100_000.0));
        let lat_extent = bounds.north - 60.0;
        let lng_extent = bounds.east;
        assert!(lng_extent > lat_extent * 1.9, "{} vs {}", lng_extent, lat_extent);
    }

    #[test]
    fn test_prefilter_whole_earth() {
        let bounds = prefilter_bounds(&CircleSelection::new(0.0, 0.0, 40_075_000.0));
        assert_eq!(bounds, Bounds::world());
    }

    #[test]
    fn test_tally_categories() {
        let result = tally_categories(vec![artifact("well"), artifact("shrine"), artifact("well")]);

        assert_eq!(result.count, 3);
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories["well"], 2);
        assert_eq!(result.categories["shrine"], 1);
        assert_eq!(result.artifacts.len(), 3);
    }

    #[test]
    fn test_tally_empty() {
        let result = tally_categories(Vec::new());
        assert_eq!(result.count, 0);
        assert!(result.categories.is_empty());
    }

    proptest! {
        #[test]
        fn prop_prefilter_contains_every_point_in_circle(
            lat in -80.0f64..80.0,
            lng in -170.0f64..170.0,
            radius in 1.0f64..500_000.0,
            bearing in 0.0f64..360.0,
            fraction in 0.0f64..=1.0,
        ) {
            // Destination point at `fraction * radius` along `bearing`
            let d = fraction * radius / EARTH_RADIUS_METERS;
            let (phi1, lambda1, theta) = (lat.to_radians(), lng.to_radians(), bearing.to_radians());
            let phi2 = (phi1.sin() * d.cos() + phi1.cos() * d.sin() * theta.cos()).asin();
            let lambda2 = lambda1
                + (theta.sin() * d.sin() * phi1.cos()).atan2(d.cos() - phi1.sin() * phi2.sin());
            let (plat, plng) = (phi2.to_degrees(), lambda2.to_degrees());
            prop_assume!((-180.0..=180.0).contains(&plng));

            let circle = CircleSelection::new(lat, lng, radius);
            let bounds = prefilter_bounds(&circle);
            prop_assert!(bounds.contains(plat, plng), "{:?} missing ({}, {})", bounds, plat, plng);
        }
    }
}
