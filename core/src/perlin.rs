use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use crate::NoiseGenerator;
use crate::config::{Dimensionality, FractalParams};
use crate::field::ScalarField;
use crate::utils::normalize;

// One layer of the fractal sum. `period` is the number of lattice cells that
// fit in one tile, so the layer repeats exactly every `resolution` grid units.
#[derive(Clone, Copy, Debug)]
struct Octave {
    frequency: f64,
    period: i64,
    amplitude: f64,
}

/// Layered gradient noise that wraps with period `resolution` on every axis.
///
/// Each octave's frequency is snapped so a whole number of lattice cells
/// covers one tile; the lattice coordinates are then taken modulo that count
/// before hashing. Sampling at `x` and at `x + resolution` gives the same value.
pub struct PeriodicPerlin {
    perm: [u8; 512], // permutation table (256 duplicated)
    octaves: Vec<Octave>,
    max_amp: f64,
}

impl PeriodicPerlin {
    pub fn new(seed: i64, resolution: u32, params: &FractalParams) -> Self {
        let resolution = resolution as f64;
        let mut octaves = Vec::with_capacity(params.octaves as usize);
        let mut amplitude = 1.0;
        let mut freq = 1.0 / params.scale;
        let mut max_amp = 0.0;

        for _ in 0..params.octaves {
            let period = (resolution * freq).round().max(1.0) as i64;
            octaves.push(Octave {
                frequency: period as f64 / resolution,
                period,
                amplitude,
            });
            max_amp += amplitude;
            amplitude *= params.persistence;
            freq *= params.lacunarity;
        }

        Self {
            perm: Self::permutation(seed),
            octaves,
            max_amp,
        }
    }

    // Seeded shuffle of 0..=255, duplicated so corner lookups never wrap.
    fn permutation(seed: i64) -> [u8; 512] {
        let mut p: Vec<u8> = (0..=255).collect();
        let mut rng = StdRng::seed_from_u64(seed as u64);
        p.shuffle(&mut rng);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }
        perm
    }

    // 6t^5 - 15t^4 + 10t^3
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    #[inline]
    fn grad2(hash: u8, x: f64, y: f64) -> f64 {
        let h = hash & 0xF;
        let u = if h < 8 { x } else { y };
        let v = if h < 8 { y } else { x };
        let sign_u = if (h & 1) == 0 { u } else { -u };
        let sign_v = if (h & 2) == 0 { v } else { -v };
        sign_u + sign_v
    }

    // 12 edge directions of the cube, indexed by the low 4 bits
    #[inline]
    fn grad3(hash: u8, x: f64, y: f64, z: f64) -> f64 {
        let h = hash & 0xF;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let sign_u = if (h & 1) == 0 { u } else { -u };
        let sign_v = if (h & 2) == 0 { v } else { -v };
        sign_u + sign_v
    }

    // Lattice coordinate wrapped into [0, period), plus its successor.
    #[inline]
    fn wrap(cell: f64, period: i64) -> (usize, usize) {
        let i0 = (cell as i64).rem_euclid(period);
        let i1 = (i0 + 1) % period;
        ((i0 & 255) as usize, (i1 & 255) as usize)
    }

    #[inline]
    fn hash2(&self, x: usize, y: usize) -> u8 {
        self.perm[self.perm[x] as usize + y]
    }

    #[inline]
    fn hash3(&self, x: usize, y: usize, z: usize) -> u8 {
        self.perm[self.perm[self.perm[x] as usize + y] as usize + z]
    }

    // Single octave at (x, y) in lattice units, wrapping every `period` cells.
    fn noise2(&self, x: f64, y: f64, period: i64) -> f64 {
        let (fx, fy) = (x.floor(), y.floor());
        let (x0, x1) = Self::wrap(fx, period);
        let (y0, y1) = Self::wrap(fy, period);
        let xf = x - fx;
        let yf = y - fy;
        let u = Self::fade(xf);
        let v = Self::fade(yf);

        let a = Self::lerp(
            Self::grad2(self.hash2(x0, y0), xf, yf),
            Self::grad2(self.hash2(x1, y0), xf - 1.0, yf),
            u,
        );
        let b = Self::lerp(
            Self::grad2(self.hash2(x0, y1), xf, yf - 1.0),
            Self::grad2(self.hash2(x1, y1), xf - 1.0, yf - 1.0),
            u,
        );
        Self::lerp(a, b, v)
    }

    fn noise3(&self, x: f64, y: f64, z: f64, period: i64) -> f64 {
        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
        let (x0, x1) = Self::wrap(fx, period);
        let (y0, y1) = Self::wrap(fy, period);
        let (z0, z1) = Self::wrap(fz, period);
        let xf = x - fx;
        let yf = y - fy;
        let zf = z - fz;
        let u = Self::fade(xf);
        let v = Self::fade(yf);
        let w = Self::fade(zf);

        let near = Self::lerp(
            Self::lerp(
                Self::grad3(self.hash3(x0, y0, z0), xf, yf, zf),
                Self::grad3(self.hash3(x1, y0, z0), xf - 1.0, yf, zf),
                u,
            ),
            Self::lerp(
                Self::grad3(self.hash3(x0, y1, z0), xf, yf - 1.0, zf),
                Self::grad3(self.hash3(x1, y1, z0), xf - 1.0, yf - 1.0, zf),
                u,
            ),
            v,
        );
        let far = Self::lerp(
            Self::lerp(
                Self::grad3(self.hash3(x0, y0, z1), xf, yf, zf - 1.0),
                Self::grad3(self.hash3(x1, y0, z1), xf - 1.0, yf, zf - 1.0),
                u,
            ),
            Self::lerp(
                Self::grad3(self.hash3(x0, y1, z1), xf, yf - 1.0, zf - 1.0),
                Self::grad3(self.hash3(x1, y1, z1), xf - 1.0, yf - 1.0, zf - 1.0),
                u,
            ),
            v,
        );
        Self::lerp(near, far, w)
    }
}

impl NoiseGenerator for PeriodicPerlin {
    // Fractal sum at grid coordinates (x, y), roughly in [-1, 1].
    fn get2(&self, x: f64, y: f64) -> f64 {
        let total: f64 = self
            .octaves
            .iter()
            .map(|o| self.noise2(x * o.frequency, y * o.frequency, o.period) * o.amplitude)
            .sum();
        total / self.max_amp
    }

    fn get3(&self, x: f64, y: f64, z: f64) -> f64 {
        let total: f64 = self
            .octaves
            .iter()
            .map(|o| {
                self.noise3(x * o.frequency, y * o.frequency, z * o.frequency, o.period)
                    * o.amplitude
            })
            .sum();
        total / self.max_amp
    }
}

/// Evaluate `noise` at every integer grid site. Rows are filled in parallel.
pub fn sample_grid<N>(noise: &N, dimensionality: Dimensionality, resolution: u32) -> Vec<f32>
where
    N: NoiseGenerator + Sync,
{
    let res = resolution as usize;
    let mut data = vec![0.0f32; dimensionality.cell_count(resolution)];
    data.par_chunks_mut(res).enumerate().for_each(|(row, out)| {
        let y = (row % res) as f64;
        let z = (row / res) as f64;
        for (x, v) in out.iter_mut().enumerate() {
            *v = match dimensionality {
                Dimensionality::TwoD => noise.get2(x as f64, y),
                Dimensionality::ThreeD => noise.get3(x as f64, y, z),
            } as f32;
        }
    });
    data
}

/// Normalized, tileable Perlin field.
pub fn perlin_field(
    dimensionality: Dimensionality,
    resolution: u32,
    seed: i64,
    params: &FractalParams,
) -> ScalarField {
    let noise = PeriodicPerlin::new(seed, resolution, params);
    let mut data = sample_grid(&noise, dimensionality, resolution);
    normalize(&mut data);
    ScalarField::from_vec(dimensionality, resolution, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FractalParams {
        FractalParams {
            scale: 8.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    #[test]
    fn perlin_determinism() {
        let p1 = PeriodicPerlin::new(1234, 32, &params());
        let p2 = PeriodicPerlin::new(1234, 32, &params());
        assert_eq!(p1.get2(10.5, 3.7).to_bits(), p2.get2(10.5, 3.7).to_bits());
        assert_eq!(
            p1.get3(1.23, 4.56, 7.89).to_bits(),
            p2.get3(1.23, 4.56, 7.89).to_bits()
        );
    }

    #[test]
    fn seeds_change_the_table() {
        assert_ne!(PeriodicPerlin::permutation(1), PeriodicPerlin::permutation(2));
    }

    #[test]
    fn wraps_at_resolution_2d() {
        let res = 48;
        let p = PeriodicPerlin::new(7, res, &params());
        for i in 0..res {
            let t = i as f64 + 0.25;
            assert!((p.get2(0.0, t) - p.get2(res as f64, t)).abs() < 1e-9);
            assert!((p.get2(t, 0.0) - p.get2(t, res as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn wraps_at_resolution_3d() {
        let res = 16;
        let p = PeriodicPerlin::new(99, res, &params());
        let r = res as f64;
        for &(a, b) in &[(0.5, 3.0), (7.25, 11.0), (15.0, 2.5)] {
            assert!((p.get3(0.0, a, b) - p.get3(r, a, b)).abs() < 1e-9);
            assert!((p.get3(a, 0.0, b) - p.get3(a, r, b)).abs() < 1e-9);
            assert!((p.get3(a, b, 0.0) - p.get3(a, b, r)).abs() < 1e-9);
        }
    }

    #[test]
    fn octave_periods_are_whole_cells() {
        let p = PeriodicPerlin::new(0, 64, &FractalParams {
            scale: 30.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
        });
        let periods: Vec<i64> = p.octaves.iter().map(|o| o.period).collect();
        assert_eq!(periods, vec![2, 4, 9, 17, 34]);
    }

    #[test]
    fn field_is_normalized() {
        let field = perlin_field(Dimensionality::TwoD, 32, 5, &params());
        let (min, max) = field.min_max();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn lattice_aligned_field_is_degenerate() {
        // scale 1, single octave: every site sits on a lattice point where
        // gradient noise is zero
        let flat = FractalParams {
            scale: 1.0,
            octaves: 1,
            ..params()
        };
        let field = perlin_field(Dimensionality::TwoD, 16, 3, &flat);
        assert!(field.values().iter().all(|&v| v == 0.0));
    }
}
