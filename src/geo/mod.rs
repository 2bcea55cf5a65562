//! Geometric helpers shared across the planning pipeline: great-circle
//! distance, polyline codec, and point-in-polygon containment.

use geo::algorithm::haversine_distance::HaversineDistance;
use geo::algorithm::contains::Contains;
use geo_types::{Coord, LineString, Point, Polygon};

/// Great-circle distance between two `(lat, lng)` points, in meters.
pub fn haversine_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let p1 = Point::new(a.1, a.0);
    let p2 = Point::new(b.1, b.0);
    p1.haversine_distance(&p2)
}

/// Encodes a sequence of `(lat, lng)` points as a Google-style encoded
/// polyline (precision 5, matching the road service's `geometries=polyline`).
pub fn encode_polyline(points: &[(f64, f64)]) -> Result<String, String> {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|(lat, lng)| Coord { x: *lng, y: *lat })
        .collect();
    polyline::encode_coordinates(coords, 5)
}

/// Decodes an encoded polyline back into `(lat, lng)` points.
pub fn decode_polyline(encoded: &str) -> Result<Vec<(f64, f64)>, String> {
    let line: LineString<f64> = polyline::decode_polyline(encoded, 5)?;
    Ok(line.into_iter().map(|c| (c.y, c.x)).collect())
}

/// Point-in-polygon containment test, stable under vertex rotation.
/// `point` and `vertices` are `(lat, lng)` pairs.
pub fn is_point_in_polygon(point: (f64, f64), vertices: &[(f64, f64)]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let exterior: Vec<Coord<f64>> = vertices
        .iter()
        .map(|(lat, lng)| Coord { x: *lng, y: *lat })
        .collect();
    let polygon = Polygon::new(LineString::from(exterior), vec![]);
    let p = Point::new(point.1, point.0);
    polygon.contains(&p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_symmetric_and_zero_at_origin() {
        let a = (12.9716, 77.5946);
        let b = (13.0827, 80.2707);
        let d_ab = haversine_distance_m(a, b);
        let d_ba = haversine_distance_m(b, a);
        assert!((d_ab - d_ba).abs() < 1e-6);
        assert!(d_ab >= 0.0);
        assert_eq!(haversine_distance_m(a, a), 0.0);
    }

    #[test]
    fn polyline_round_trips() {
        let points = vec![(12.9716, 77.5946), (12.9352, 77.6146), (13.0827, 80.2707)];
        let encoded = encode_polyline(&points).expect("encode");
        let decoded = decode_polyline(&encoded).expect("decode");
        assert_eq!(decoded.len(), points.len());
        for ((lat, lng), (dlat, dlng)) in points.iter().zip(decoded.iter()) {
            assert!((lat - dlat).abs() < 1e-4);
            assert!((lng - dlng).abs() < 1e-4);
        }
        let re_encoded = encode_polyline(&decoded).expect("re-encode");
        assert_eq!(encoded, re_encoded);
    }

    #[test]
    fn point_in_polygon_is_stable_under_rotation() {
        let square = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        let rotated: Vec<(f64, f64)> = square
            .iter()
            .cycle()
            .skip(2)
            .take(square.len())
            .cloned()
            .collect();
        let inside = (0.5, 0.5);
        let outside = (2.0, 2.0);
        assert_eq!(
            is_point_in_polygon(inside, &square),
            is_point_in_polygon(inside, &rotated)
        );
        assert_eq!(
            is_point_in_polygon(outside, &square),
            is_point_in_polygon(outside, &rotated)
        );
        assert!(is_point_in_polygon(inside, &square));
        assert!(!is_point_in_polygon(outside, &square));
    }
}
