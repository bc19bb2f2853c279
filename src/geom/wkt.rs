use geo::{LineString, Polygon};

fn ring_to_wkt(ring: &LineString<f64>) -> String {
    let coords = ring.coords()
        .map(|coord| format!("{} {}", coord.x, coord.y))
        .collect::<Vec<_>>();
    format!("({})", coords.join(", "))
}

/// Render a polygon as well-known text: `POLYGON ((x y, ...), (x y, ...))`.
pub(crate) fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    if polygon.exterior().0.is_empty() {
        return "POLYGON EMPTY".to_string();
    }

    let rings = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_to_wkt)
        .collect::<Vec<_>>();
    format!("POLYGON ({})", rings.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, polygon};

    #[test]
    fn square_without_holes() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0)];
        assert_eq!(
            polygon_to_wkt(&square),
            "POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))"
        );
    }

    #[test]
    fn empty_polygon_has_empty_text() {
        let empty = Polygon::new(LineString::new(vec![]), vec![]);
        assert_eq!(polygon_to_wkt(&empty), "POLYGON EMPTY");
    }

    #[test]
    fn holes_follow_exterior() {
        let exterior = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0)]);
        let polygon = Polygon::new(exterior, vec![hole]);
        assert_eq!(
            polygon_to_wkt(&polygon),
            "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 1 2, 2 2, 1 1))"
        );
    }
}
