use crate::data::point::AccidentPoint;

/// Keeps the accident records that can be placed on a map.
///
/// A point is usable when both coordinates are present and finite and they
/// are not both exactly zero; the feed encodes "no location" as (0, 0).
/// Output order follows input order and never contains a point that was not
/// in the input.
pub struct CoordinateValidator;

impl CoordinateValidator {
    pub fn is_usable(point: &AccidentPoint) -> bool {
        point
            .position()
            .map_or(false, |position| position.is_finite() && !position.is_null_island())
    }

    pub fn validate(points: &[AccidentPoint]) -> Vec<AccidentPoint> {
        points
            .iter()
            .filter(|point| Self::is_usable(point))
            .cloned()
            .collect()
    }

    /// Borrowing variant used on the render path
    pub fn validate_refs(points: &[AccidentPoint]) -> Vec<&AccidentPoint> {
        points.iter().filter(|point| Self::is_usable(point)).collect()
    }
}
