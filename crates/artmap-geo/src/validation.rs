use artmap_core::models::InsertArtifact;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }
}

pub const MAX_NAME_LEN: usize = 500;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_LAYER_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// lat in [-90, 90], lng in [-180, 180]; NaN and infinities are never valid
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Boundary check for an artifact before it is handed to a store
pub fn validate_insert(insert: &InsertArtifact) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if !is_valid_coordinate(insert.lat, insert.lng) {
        result.add_error(
            format!("Point({}, {})", insert.lat, insert.lng),
            "Coordinates must be finite with lat in [-90, 90] and lng in [-180, 180]"
                .to_string(),
        );
    }

    check_length(&mut result, "name", &insert.name, 1, MAX_NAME_LEN);
    check_length(&mut result, "category", &insert.category, 1, MAX_CATEGORY_LEN);

    if let Some(layer) = &insert.layer {
        check_length(&mut result, "layer", layer, 1, MAX_LAYER_LEN);
    }

    if let Some(description) = &insert.description {
        check_length(&mut result, "description", description, 0, MAX_DESCRIPTION_LEN);
    }

    result
}

fn check_length(result: &mut ValidationResult, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        result.add_error(
            field.to_string(),
            format!("length must be between {} and {} characters, found {}", min, max, len),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(is_valid_coordinate(90.0, 180.0));
        assert!(is_valid_coordinate(-90.0, -180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
    }

    #[test]
    fn test_non_finite_coordinates_are_invalid() {
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
        assert!(!is_valid_coordinate(f64::NEG_INFINITY, f64::NAN));
    }

    #[test]
    fn test_validate_insert_accepts_well_formed() {
        let insert = InsertArtifact::new("Shrine", "heritage", -8.5, 115.26).with_layer("bali");
        assert!(validate_insert(&insert).is_valid);
    }

    #[test]
    fn test_validate_insert_collects_every_error() {
        let mut insert = InsertArtifact::new("", "c".repeat(101), 95.0, 0.0);
        insert.layer = Some(String::new());

        let result = validate_insert(&insert);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 4);
        assert!(result.errors.iter().any(|e| e.location == "name"));
        assert!(result.errors.iter().any(|e| e.location == "category"));
    }
}
