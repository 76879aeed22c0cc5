//! Planar distance from a point to an arbitrary geometry.
//!
//! Distances are computed in the coordinate units of the grid's projected
//! reference system (metres for UTM). A point inside or on an areal
//! geometry is at distance zero.

use geo::{Contains, Coord, Geometry, Line, LineString, Point, Polygon};

/// Distance from `point` to the nearest part of `geometry`, in coordinate
/// units.
///
/// Returns `f64::INFINITY` for geometries with no coordinates (an empty
/// line string or collection), so callers can fold with `min` without a
/// separate emptiness check.
#[must_use]
pub fn point_geometry_distance(point: Coord<f64>, geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::Point(p) => point_point(point, p.0),
        Geometry::MultiPoint(points) => points
            .iter()
            .map(|p| point_point(point, p.0))
            .fold(f64::INFINITY, f64::min),
        Geometry::Line(line) => point_segment(point, line),
        Geometry::LineString(line) => point_line_string(point, line),
        Geometry::MultiLineString(lines) => lines
            .iter()
            .map(|line| point_line_string(point, line))
            .fold(f64::INFINITY, f64::min),
        Geometry::Polygon(polygon) => point_polygon(point, polygon),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .map(|polygon| point_polygon(point, polygon))
            .fold(f64::INFINITY, f64::min),
        Geometry::Rect(rect) => point_polygon(point, &rect.to_polygon()),
        Geometry::Triangle(triangle) => point_polygon(point, &triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => collection
            .iter()
            .map(|member| point_geometry_distance(point, member))
            .fold(f64::INFINITY, f64::min),
    }
}

fn point_point(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Distance to a segment: project onto the segment and clamp the
/// parameter to its endpoints.
fn point_segment(point: Coord<f64>, segment: &Line<f64>) -> f64 {
    let d = segment.end - segment.start;
    let length_sq = d.x * d.x + d.y * d.y;
    if length_sq == 0.0 {
        return point_point(point, segment.start);
    }
    let w = point - segment.start;
    let t = ((w.x * d.x + w.y * d.y) / length_sq).clamp(0.0, 1.0);
    let nearest = Coord {
        x: segment.start.x + t * d.x,
        y: segment.start.y + t * d.y,
    };
    point_point(point, nearest)
}

fn point_line_string(point: Coord<f64>, line: &LineString<f64>) -> f64 {
    if line.0.len() == 1 {
        return line
            .0
            .first()
            .map_or(f64::INFINITY, |only| point_point(point, *only));
    }
    line.lines()
        .map(|segment| point_segment(point, &segment))
        .fold(f64::INFINITY, f64::min)
}

fn point_polygon(point: Coord<f64>, polygon: &Polygon<f64>) -> f64 {
    if polygon.contains(&Point::from(point)) {
        return 0.0;
    }
    polygon
        .interiors()
        .iter()
        .chain(std::iter::once(polygon.exterior()))
        .map(|ring| point_line_string(point, ring))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{GeometryCollection, MultiPolygon, Rect, polygon};
    use rstest::rstest;

    fn unit_square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]
    }

    #[rstest]
    #[case(Coord { x: 5.0, y: 5.0 }, 0.0)]
    #[case(Coord { x: 10.0, y: 5.0 }, 0.0)]
    #[case(Coord { x: 13.0, y: 5.0 }, 3.0)]
    #[case(Coord { x: 13.0, y: 14.0 }, 5.0)]
    fn polygon_distances(#[case] point: Coord<f64>, #[case] expected: f64) {
        let geometry = Geometry::Polygon(unit_square());
        let distance = point_geometry_distance(point, &geometry);
        assert!((distance - expected).abs() < 1e-9, "got {distance}");
    }

    #[rstest]
    fn segment_distance_clamps_to_endpoints() {
        let geometry = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]));
        let mid = point_geometry_distance(Coord { x: 5.0, y: 4.0 }, &geometry);
        let past_end = point_geometry_distance(Coord { x: 13.0, y: 4.0 }, &geometry);
        assert!((mid - 4.0).abs() < 1e-9);
        assert!((past_end - 5.0).abs() < 1e-9);
    }

    #[rstest]
    fn point_geometry_is_euclidean() {
        let geometry = Geometry::Point(Point::new(3.0, 4.0));
        let distance = point_geometry_distance(Coord { x: 0.0, y: 0.0 }, &geometry);
        assert!((distance - 5.0).abs() < 1e-9);
    }

    #[rstest]
    fn multi_polygon_takes_nearest_member() {
        let far = polygon![
            (x: 100.0, y: 100.0),
            (x: 110.0, y: 100.0),
            (x: 110.0, y: 110.0),
            (x: 100.0, y: 110.0),
        ];
        let geometry = Geometry::MultiPolygon(MultiPolygon(vec![unit_square(), far]));
        let distance = point_geometry_distance(Coord { x: 12.0, y: 5.0 }, &geometry);
        assert!((distance - 2.0).abs() < 1e-9);
    }

    #[rstest]
    fn rect_is_treated_as_area() {
        let geometry = Geometry::Rect(Rect::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
        ));
        assert_eq!(
            point_geometry_distance(Coord { x: 1.0, y: 1.0 }, &geometry),
            0.0
        );
    }

    #[rstest]
    fn empty_collection_is_infinitely_far() {
        let geometry = Geometry::GeometryCollection(GeometryCollection::default());
        assert_eq!(
            point_geometry_distance(Coord { x: 0.0, y: 0.0 }, &geometry),
            f64::INFINITY
        );
    }
}
