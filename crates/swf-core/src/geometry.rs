use kurbo::{Affine, Rect};
use swf_data::{Matrix, Rectangle};

pub fn to_affine(matrix: &Matrix) -> Affine {
    Affine::new([
        matrix.scale_x,
        matrix.rotate_skew0,
        matrix.rotate_skew1,
        matrix.scale_y,
        f64::from(matrix.translate_x),
        f64::from(matrix.translate_y),
    ])
}

/// Bounding box of `bounds` placed through `matrix`. Empty bounds stay empty.
pub fn transform_bounds(bounds: &Rectangle, matrix: &Matrix) -> Rectangle {
    if bounds.is_empty() {
        return Rectangle::ZERO;
    }
    let rect = Rect::new(
        f64::from(bounds.x_min),
        f64::from(bounds.y_min),
        f64::from(bounds.x_max),
        f64::from(bounds.y_max),
    );
    let placed = to_affine(matrix).transform_rect_bbox(rect);
    Rectangle::new(
        placed.x0.floor() as i32,
        placed.x1.ceil() as i32,
        placed.y0.floor() as i32,
        placed.y1.ceil() as i32,
    )
}
