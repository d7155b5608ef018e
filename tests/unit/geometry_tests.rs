// Tile geometry properties over a range of angles and text sizes

use rstest::rstest;
use tilemark::geometry::{compute_tile, degree_to_radian};
use tilemark::TextMetrics;

const EPS: f64 = 1e-6;

fn text() -> TextMetrics {
    TextMetrics::new(158.4, 13.0)
}

#[rstest]
#[case(0.0)]
#[case(-22.0)]
#[case(22.0)]
#[case(90.0)]
#[case(-90.0)]
#[case(180.0)]
#[case(360.0)]
#[case(13.5)]
fn test_tile_is_positive_for_non_degenerate_text(#[case] degree: f64) {
    let tile = compute_tile(text(), degree);
    assert!(tile.tile_width > 0.0, "width at {}", degree);
    assert!(tile.tile_height > 0.0, "height at {}", degree);
    assert!(tile.tile_width.is_finite() && tile.tile_height.is_finite());
}

#[rstest]
#[case(0.0)]
#[case(180.0)]
#[case(360.0)]
#[case(-180.0)]
fn test_horizontal_text_tile_is_text_box(#[case] degree: f64) {
    let tile = compute_tile(text(), degree);
    assert!((tile.tile_width - 158.4).abs() < EPS);
    assert!((tile.tile_height - 13.0).abs() < EPS);
}

#[rstest]
#[case(90.0)]
#[case(-90.0)]
#[case(270.0)]
fn test_vertical_text_tile_swaps_dimensions(#[case] degree: f64) {
    let tile = compute_tile(text(), degree);
    assert!((tile.tile_width - 13.0).abs() < EPS);
    assert!((tile.tile_height - 158.4).abs() < EPS);
}

#[rstest]
#[case(-22.0)]
#[case(13.5)]
#[case(45.0)]
#[case(123.0)]
#[case(-301.0)]
fn test_tile_is_periodic_in_full_turns(#[case] degree: f64) {
    let a = compute_tile(text(), degree);
    let b = compute_tile(text(), degree + 360.0);
    let c = compute_tile(text(), degree - 720.0);
    assert!((a.tile_width - b.tile_width).abs() < EPS);
    assert!((a.tile_height - b.tile_height).abs() < EPS);
    assert!((a.tile_width - c.tile_width).abs() < EPS);
    assert!((a.tile_height - c.tile_height).abs() < EPS);
}

#[rstest]
#[case(22.0)]
#[case(45.0)]
#[case(67.5)]
#[case(150.0)]
fn test_tile_is_symmetric_in_sign(#[case] degree: f64) {
    let a = compute_tile(text(), degree);
    let b = compute_tile(text(), -degree);
    assert!((a.tile_width - b.tile_width).abs() < EPS);
    assert!((a.tile_height - b.tile_height).abs() < EPS);
}

#[test]
fn test_watermark_at_minus_22_matches_closed_form() {
    let (w, h) = (108.0, 25.0);
    let r = degree_to_radian(-22.0);
    let tile = compute_tile(TextMetrics::new(w, h), -22.0);

    let expected_width = r.sin().abs() * h + r.cos().abs() * w;
    let expected_height = r.sin().abs() * w + r.cos().abs() * h;
    assert!((tile.tile_width - expected_width).abs() < EPS);
    assert!((tile.tile_height - expected_height).abs() < EPS);
    // 0.3746 * 25 + 0.9272 * 108 and 0.3746 * 108 + 0.9272 * 25
    assert!((tile.tile_width - 109.50).abs() < 0.01);
    assert!((tile.tile_height - 63.64).abs() < 0.01);
    assert_eq!(tile.raster_size(), (110, 64));
}

#[test]
fn test_rotated_text_fits_inside_tile() {
    let metrics = TextMetrics::new(96.0, 18.0);
    let mut degree = -360.0;
    while degree <= 360.0 {
        let tile = compute_tile(metrics, degree);
        for corner in tile.text_corners(metrics) {
            assert!(
                corner.x >= -EPS && corner.x <= tile.tile_width + EPS,
                "x {} outside [0, {}] at {} degrees",
                corner.x,
                tile.tile_width,
                degree
            );
            assert!(
                corner.y >= -EPS && corner.y <= tile.tile_height + EPS,
                "y {} outside [0, {}] at {} degrees",
                corner.y,
                tile.tile_height,
                degree
            );
        }
        degree += 7.5;
    }
}

#[test]
fn test_rotated_text_touches_every_tile_edge() {
    let metrics = TextMetrics::new(96.0, 18.0);
    let tile = compute_tile(metrics, -22.0);
    let corners = tile.text_corners(metrics);

    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    assert!(min_x.abs() < EPS && (max_x - tile.tile_width).abs() < EPS);
    assert!(min_y.abs() < EPS && (max_y - tile.tile_height).abs() < EPS);
}

#[test]
fn test_huge_angles_stay_accurate() {
    let reduced = compute_tile(text(), 30.0);
    let huge = compute_tile(text(), 30.0 + 360.0 * 1e9);
    assert!((reduced.tile_width - huge.tile_width).abs() < EPS);
    assert!((reduced.tile_height - huge.tile_height).abs() < EPS);
}

#[test]
fn test_empty_text_yields_empty_tile() {
    let tile = compute_tile(TextMetrics::new(0.0, 0.0), -22.0);
    assert_eq!(tile.tile_width, 0.0);
    assert_eq!(tile.tile_height, 0.0);
    assert_eq!(tile.raster_size(), (0, 0));
}

#[test]
fn test_geometry_serializes_for_reports() {
    let tile = compute_tile(TextMetrics::new(100.0, 20.0), 0.0);
    let json = serde_json::to_value(tile).unwrap();
    assert_eq!(json["tile_width"], 100.0);
    assert_eq!(json["origin"]["x"], 50.0);
    assert_eq!(json["origin"]["y"], 10.0);
}
