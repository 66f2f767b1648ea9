//! Spatial query commands: bounds, circle, aggregate, viewport, count

use crate::cli::{BoundsArgs, CircleArgs, LayerArgs, ViewportArgs};
use crate::errors::invalid_argument;
use crate::geojson_output::{artifacts_collection, viewport_collection};
use crate::output::OutputWriter;
use crate::output_types::{ArtifactRow, CategoryRow, ClusterRow, CountOutput};
use crate::storage::Storage;
use anyhow::Result;
use artmap_core::models::{Artifact, Bounds, CircleSelection};
use artmap_geo::distance::EARTH_CIRCUMFERENCE_METERS;
use artmap_geo::is_valid_coordinate;

/// Boundary checks the store relies on callers to make
fn check_bounds(bounds: &Bounds, output: &OutputWriter) -> Result<()> {
    if !is_valid_coordinate(bounds.north, bounds.east) || !is_valid_coordinate(bounds.south, bounds.west) {
        return Err(invalid_argument(
            "north/south must be within [-90, 90] and east/west within [-180, 180]",
        )
        .into());
    }
    if bounds.north < bounds.south {
        return Err(invalid_argument(format!(
            "north ({}) must not be less than south ({})",
            bounds.north, bounds.south
        ))
        .into());
    }
    if bounds.east < bounds.west {
        output.warning("Boxes crossing the antimeridian (east < west) are not supported and match nothing");
    }
    Ok(())
}

fn check_circle(circle: &CircleSelection) -> Result<()> {
    if !is_valid_coordinate(circle.center.lat, circle.center.lng) {
        return Err(invalid_argument(format!(
            "center ({}, {}) is not a valid coordinate",
            circle.center.lat, circle.center.lng
        ))
        .into());
    }
    if !(circle.radius.is_finite() && circle.radius > 0.0) {
        return Err(invalid_argument(format!("radius must be a positive number of meters, got {}", circle.radius)).into());
    }
    if circle.radius > EARTH_CIRCUMFERENCE_METERS {
        return Err(invalid_argument(format!(
            "radius must not exceed {} meters, got {}",
            EARTH_CIRCUMFERENCE_METERS, circle.radius
        ))
        .into());
    }
    Ok(())
}

fn print_artifacts(artifacts: &[Artifact], geojson: bool, output: &OutputWriter) -> Result<()> {
    if geojson {
        return output.data(&artifacts_collection(artifacts)?);
    }
    if output.is_json() {
        return output.result(artifacts);
    }

    output.table(artifacts.iter().map(ArtifactRow::from).collect());
    output.info(format!("{} artifact(s)", artifacts.len()));
    Ok(())
}

pub async fn bounds(args: BoundsArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let bounds = args.bounds.bounds();
    check_bounds(&bounds, output)?;

    let artifacts = storage.store.get_in_bounds(&bounds, &args.layers.filter()).await?;
    print_artifacts(&artifacts, args.geojson, output)
}

pub async fn circle(args: CircleArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let circle = args.circle();
    check_circle(&circle)?;

    let artifacts = storage.store.get_in_circle(&circle, &args.layers.filter()).await?;
    print_artifacts(&artifacts, args.geojson, output)
}

pub async fn aggregate(args: CircleArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let circle = args.circle();
    check_circle(&circle)?;

    let result = storage.store.aggregate(&circle, &args.layers.filter()).await?;

    if args.geojson {
        return output.data(&artifacts_collection(&result.artifacts)?);
    }
    if output.is_json() {
        return output.result(&result);
    }

    output.section("Categories");
    output.table(
        result
            .categories
            .iter()
            .map(|(category, count)| CategoryRow { category: category.clone(), count: *count })
            .collect(),
    );
    output.kv("Total", result.count);
    Ok(())
}

pub async fn viewport(
    args: ViewportArgs,
    default_limit: usize,
    storage: &Storage,
    output: &OutputWriter,
) -> Result<()> {
    let bounds = args.bounds.bounds();
    check_bounds(&bounds, output)?;
    let limit = args.limit.unwrap_or(default_limit);

    let response = storage
        .store
        .get_viewport_data(&bounds, args.zoom, limit, &args.layers.filter())
        .await?;

    if args.geojson {
        return output.data(&viewport_collection(&response)?);
    }
    if output.is_json() {
        return output.result(&response);
    }

    if !response.clusters.is_empty() {
        output.section("Clusters");
        output.table(response.clusters.iter().map(ClusterRow::from).collect());
    }
    output.section("Singles");
    output.table(response.singles.iter().map(ArtifactRow::from).collect());

    output.kv("Total in view", response.total);
    if response.truncated {
        output.warning(format!("Truncated to {} item(s); zoom in to see more", limit));
    }
    Ok(())
}

pub async fn count(args: LayerArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let count = storage.store.count(&args.filter()).await?;

    if output.is_json() {
        return output.result(CountOutput { count, layers: args.layers });
    }

    output.kv("Artifacts", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> OutputWriter {
        OutputWriter::new(true)
    }

    #[test]
    fn test_check_bounds_accepts_world() {
        assert!(check_bounds(&Bounds::world(), &quiet()).is_ok());
    }

    #[test]
    fn test_check_bounds_rejects_inverted_latitude() {
        assert!(check_bounds(&Bounds::new(-10.0, 10.0, 5.0, -5.0), &quiet()).is_err());
    }

    #[test]
    fn test_check_bounds_rejects_out_of_range() {
        assert!(check_bounds(&Bounds::new(95.0, 0.0, 5.0, -5.0), &quiet()).is_err());
        assert!(check_bounds(&Bounds::new(10.0, 0.0, 181.0, -5.0), &quiet()).is_err());
    }

    #[test]
    fn test_check_bounds_allows_antimeridian_with_warning() {
        assert!(check_bounds(&Bounds::new(10.0, -10.0, -170.0, 170.0), &quiet()).is_ok());
    }

    #[test]
    fn test_check_circle() {
        assert!(check_circle(&CircleSelection::new(41.5, -72.7, 1000.0)).is_ok());
        assert!(check_circle(&CircleSelection::new(41.5, -72.7, 0.0)).is_err());
        assert!(check_circle(&CircleSelection::new(41.5, -72.7, f64::NAN)).is_err());
        assert!(check_circle(&CircleSelection::new(91.0, 0.0, 10.0)).is_err());
    }

    #[test]
    fn test_check_circle_caps_radius_at_earth_circumference() {
        assert!(check_circle(&CircleSelection::new(0.0, 0.0, EARTH_CIRCUMFERENCE_METERS)).is_ok());
        assert!(check_circle(&CircleSelection::new(0.0, 0.0, EARTH_CIRCUMFERENCE_METERS + 1.0)).is_err());
        assert!(check_circle(&CircleSelection::new(0.0, 0.0, f64::INFINITY)).is_err());
    }
}
