use crate::config::{Dimensionality, FractalParams};
use crate::field::ScalarField;
use crate::perlin::perlin_field;
use crate::utils::normalize;

// Seed offset for the second potential, so the two Perlin fields never share
// a permutation table.
const SECOND_POTENTIAL_SEED: i64 = 42;

/// Discrete curl of two independent Perlin potentials A and B:
/// `dA/d(axis 1) - dB/d(axis 0)`, normalized.
///
/// Axes count from the outermost array dimension: for 2D, axis 0 is y and
/// axis 1 is x; for 3D, axis 0 is z and axis 1 is y. Derivatives are central
/// differences that wrap at the tile edge, so the result tiles like its inputs.
pub fn curl_field(
    dimensionality: Dimensionality,
    resolution: u32,
    seed: i64,
    params: &FractalParams,
) -> ScalarField {
    let a = perlin_field(dimensionality, resolution, seed, params);
    let b = perlin_field(
        dimensionality,
        resolution,
        seed.wrapping_add(SECOND_POTENTIAL_SEED),
        params,
    );
    let mut data = curl_from_potentials(&a, &b);
    normalize(&mut data);
    ScalarField::from_vec(dimensionality, resolution, data)
}

/// Unnormalized curl of two potentials of identical shape.
pub fn curl_from_potentials(a: &ScalarField, b: &ScalarField) -> Vec<f32> {
    debug_assert_eq!(a.len(), b.len());
    let dim = a.dimensionality();
    let res = a.resolution() as usize;
    let da = periodic_gradient(a.values(), res, axis_stride(dim, res, 1));
    let db = periodic_gradient(b.values(), res, axis_stride(dim, res, 0));
    da.iter().zip(&db).map(|(x, y)| x - y).collect()
}

// Distance in the flat buffer between neighbours along `axis`.
fn axis_stride(dimensionality: Dimensionality, res: usize, axis: usize) -> usize {
    let axes = dimensionality.axes();
    res.pow((axes - 1 - axis) as u32)
}

// Central difference along the axis with the given stride, wrapping at the
// tile boundary.
fn periodic_gradient(values: &[f32], res: usize, stride: usize) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let c = (i / stride) % res;
            let base = i - c * stride;
            let next = base + ((c + 1) % res) * stride;
            let prev = base + ((c + res - 1) % res) * stride;
            (values[next] - values[prev]) * 0.5
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_wraps_at_the_edges() {
        // one row of four along x
        let values = [0.0, 1.0, 2.0, 3.0];
        let g = periodic_gradient(&values, 4, 1);
        assert_eq!(g, vec![-1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn strides_follow_axis_order() {
        assert_eq!(axis_stride(Dimensionality::TwoD, 16, 0), 16);
        assert_eq!(axis_stride(Dimensionality::TwoD, 16, 1), 1);
        assert_eq!(axis_stride(Dimensionality::ThreeD, 16, 0), 256);
        assert_eq!(axis_stride(Dimensionality::ThreeD, 16, 1), 16);
    }

    #[test]
    fn curl_is_normalized_and_deterministic() {
        let params = FractalParams {
            scale: 8.0,
            octaves: 3,
            ..FractalParams::default()
        };
        let a = curl_field(Dimensionality::TwoD, 32, 9, &params);
        let b = curl_field(Dimensionality::TwoD, 32, 9, &params);
        assert!(a.bit_identical(&b));
        assert_eq!(a.min_max(), (0.0, 1.0));
    }

    #[test]
    fn potentials_use_distinct_seeds() {
        let params = FractalParams {
            scale: 8.0,
            ..FractalParams::default()
        };
        let a = perlin_field(Dimensionality::TwoD, 16, 1, &params);
        let b = perlin_field(Dimensionality::TwoD, 16, 1 + SECOND_POTENTIAL_SEED, &params);
        assert!(!a.bit_identical(&b));
    }

    #[test]
    fn curl_has_no_seam() {
        // rolling the potentials one cell along x rolls the curl by the same
        // amount, including the column that crosses the tile edge
        let res = 16usize;
        let params = FractalParams {
            scale: 4.0,
            octaves: 2,
            ..FractalParams::default()
        };
        let a = perlin_field(Dimensionality::TwoD, res as u32, 3, &params);
        let b = perlin_field(Dimensionality::TwoD, res as u32, 4, &params);
        let roll = |f: &ScalarField| {
            let mut out = vec![0.0; f.len()];
            for y in 0..res {
                for x in 0..res {
                    out[y * res + (x + 1) % res] = f.values()[y * res + x];
                }
            }
            ScalarField::from_vec(Dimensionality::TwoD, res as u32, out)
        };
        let curl = curl_from_potentials(&a, &b);
        let rolled = curl_from_potentials(&roll(&a), &roll(&b));
        for y in 0..res {
            for x in 0..res {
                assert_eq!(rolled[y * res + (x + 1) % res], curl[y * res + x]);
            }
        }
    }

    #[test]
    fn volume_curl_has_no_depth_seam() {
        let res = 16usize;
        let plane = res * res;
        let params = FractalParams {
            scale: 4.0,
            octaves: 2,
            ..FractalParams::default()
        };
        let a = perlin_field(Dimensionality::ThreeD, res as u32, 3, &params);
        let b = perlin_field(Dimensionality::ThreeD, res as u32, 4, &params);
        let roll = |f: &ScalarField| {
            let mut out = vec![0.0; f.len()];
            for z in 0..res {
                let to = ((z + 1) % res) * plane;
                out[to..to + plane].copy_from_slice(&f.values()[z * plane..(z + 1) * plane]);
            }
            ScalarField::from_vec(Dimensionality::ThreeD, res as u32, out)
        };
        let curl = curl_from_potentials(&a, &b);
        let rolled = curl_from_potentials(&roll(&a), &roll(&b));
        for z in 0..res {
            let from = z * plane;
            let to = ((z + 1) % res) * plane;
            assert_eq!(rolled[to..to + plane], curl[from..from + plane]);
        }
    }
}
