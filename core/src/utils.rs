use tracing::warn;

/// Outcome of [`normalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Normalization {
    // Field was rescaled from [min, max] to [0, 1]
    Scaled { min: f32, max: f32 },
    // Every value was equal; the field is now all zeros
    Degenerate,
}

// Min–max normalize in place. A constant field has no range to divide by,
// so it becomes all zeros.
pub fn normalize(values: &mut [f32]) -> Normalization {
    let (min, max) = min_max(values);
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        warn!(len = values.len(), value = min, "degenerate field, emitting zeros");
        values.iter_mut().for_each(|v| *v = 0.0);
        return Normalization::Degenerate;
    }
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
    Normalization::Scaled { min, max }
}

pub fn min_max(values: &[f32]) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

// Quantize a [0, 1] sample to a byte. Values are truncated, not rounded.
#[inline]
pub fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

// Flat row-major index of (x, y, z) in a cube of side `resolution`.
#[inline]
pub fn flat_index(resolution: usize, x: usize, y: usize, z: usize) -> usize {
    (z * resolution + y) * resolution + x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_hits_both_ends() {
        let mut v = vec![-3.0, 1.0, 5.0, 0.0];
        let n = normalize(&mut v);
        assert_eq!(n, Normalization::Scaled { min: -3.0, max: 5.0 });
        assert_eq!(v[0], 0.0);
        assert_eq!(v[2], 1.0);
        assert!((v[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn constant_field_becomes_zero() {
        let mut v = vec![0.7; 16];
        assert_eq!(normalize(&mut v), Normalization::Degenerate);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn quantize_truncates_and_clamps() {
        assert_eq!(to_u8(0.0), 0);
        assert_eq!(to_u8(1.0), 255);
        assert_eq!(to_u8(0.999), 254);
        assert_eq!(to_u8(2.0), 255);
        assert_eq!(to_u8(-1.0), 0);
    }
}
