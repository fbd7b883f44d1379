//! Tests for BoundingBox parsing and geometry used by map extents.

use wmts_common::bbox::{BboxParseError, BoundingBox};
use wmts_common::WmtsError;

// ============================================================================
// Extent parsing
// ============================================================================

#[test]
fn test_parse_extent_integer() {
    let bbox = BoundingBox::from_csv("0,0,100,100").unwrap();
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn test_parse_extent_floating() {
    let bbox = BoundingBox::from_csv("-125.5,24.75,-66.25,50.125").unwrap();
    assert!((bbox.min_x - (-125.5)).abs() < 0.001);
    assert!((bbox.min_y - 24.75).abs() < 0.001);
    assert!((bbox.max_x - (-66.25)).abs() < 0.001);
    assert!((bbox.max_y - 50.125).abs() < 0.001);
}

#[test]
fn test_parse_extent_tolerates_spaces() {
    // Command-line extents are often typed with spaces after commas
    let bbox = BoundingBox::from_csv(" -180, -90, 180, 90 ").unwrap();
    assert_eq!(bbox, BoundingBox::global());
}

#[test]
fn test_parse_extent_too_few_values() {
    let result = BoundingBox::from_csv("0,0,100");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_extent_invalid_number() {
    let result = BoundingBox::from_csv("abc,0,100,100");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_extent_inverted() {
    let result = BoundingBox::from_csv("10,10,5,5");
    assert!(matches!(result, Err(BboxParseError::Inverted(_))));
}

#[test]
fn test_parse_error_converts_to_wmts_error() {
    let err: WmtsError = BoundingBox::from_csv("").unwrap_err().into();
    assert!(matches!(err, WmtsError::InvalidBbox(_)));
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_global_aspect_ratio() {
    let bbox = BoundingBox::global();
    assert_eq!(bbox.width(), 360.0);
    assert_eq!(bbox.height(), 180.0);
    assert_eq!(bbox.aspect_ratio(), 2.0);
}

#[test]
fn test_is_valid() {
    assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
    assert!(!BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_valid());
    assert!(!BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0).is_valid());
}

#[test]
fn test_intersects_adjacent_edge() {
    // Touching at an edge is not an overlap
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
}

#[test]
fn test_intersection_with_self() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(bbox.intersection(&bbox).unwrap(), bbox);
}

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(-1.0, 5.0));
    assert!(!bbox.contains_point(5.0, 11.0));
}

#[test]
fn test_enclosing_points() {
    let bbox = BoundingBox::enclosing([(10.0, -5.0), (-20.0, 30.0), (0.0, 0.0)]).unwrap();
    assert_eq!(bbox, BoundingBox::new(-20.0, -5.0, 10.0, 30.0));
}
