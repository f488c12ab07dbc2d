use crate::model::Point;

/// Ray-casting containment test.
///
/// Edges are walked as `(i, i - 1)` pairs and the crossing test uses strict
/// `>` on y, so a vertex shared by two edges is only counted once.
pub(super) fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].x, polygon[i].y);
        let (xj, yj) = (polygon[j].x, polygon[j].y);
        let intersect =
            ((yi > point.y) != (yj > point.y)) && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi);
        if intersect {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Arithmetic mean of the vertices.
///
/// This is not the area centroid of the polygon; it is only used as the
/// default label anchor, where the approximation is good enough.
pub(super) fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Image space to canvas space. Regions are anchored to the image, so no
/// offset term applies.
pub(super) fn image_to_screen(point: Point, scale: f32) -> Point {
    Point::new(point.x * scale, point.y * scale)
}

pub(super) fn screen_to_image(point: Point, scale: f32) -> Point {
    Point::new(point.x / scale, point.y / scale)
}
