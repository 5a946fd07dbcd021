//! Utility functions for GLB construction

/// Compute the component-wise bounding box of a point set.
///
/// Returns `None` for an empty set, where bounds are undefined.
pub fn compute_bounds(points: &[[f32; 3]]) -> Option<([f32; 3], [f32; 3])> {
    let (first, rest) = points.split_first()?;
    let mut min = *first;
    let mut max = *first;

    for point in rest {
        for i in 0..3 {
            min[i] = min[i].min(point[i]);
            max[i] = max[i].max(point[i]);
        }
    }

    Some((min, max))
}

/// Pad JSON text with trailing spaces to a 4-byte boundary
pub fn pad_json(json: String) -> Vec<u8> {
    let mut bytes = json.into_bytes();
    let padding = (4 - bytes.len() % 4) % 4;
    bytes.extend(std::iter::repeat_n(b' ', padding));
    bytes
}
