use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::config::{CombinationMode, Dimensionality, DistanceMetric};

/// Feature points scattered over one tile, in grid units `[0, resolution)`.
/// 2D point sets keep `z = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct FeaturePoints {
    dimensionality: Dimensionality,
    points: Vec<[f64; 3]>,
}

impl FeaturePoints {
    /// Uniform random points. The unit-cube draws depend only on
    /// `(seed, num_points, dimensionality)`; `resolution` just scales them.
    pub fn generate(
        seed: i64,
        num_points: u32,
        dimensionality: Dimensionality,
        resolution: u32,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed as u64);
        let scale = resolution as f64;
        let points = (0..num_points)
            .map(|_| {
                let x = rng.random::<f64>() * scale;
                let y = rng.random::<f64>() * scale;
                let z = match dimensionality {
                    Dimensionality::TwoD => 0.0,
                    Dimensionality::ThreeD => rng.random::<f64>() * scale,
                };
                [x, y, z]
            })
            .collect();
        Self {
            dimensionality,
            points,
        }
    }

    /// Caller-placed points. The z coordinate of 2D points is forced to 0.
    pub fn from_points(dimensionality: Dimensionality, mut points: Vec<[f64; 3]>) -> Self {
        if dimensionality == Dimensionality::TwoD {
            points.iter_mut().for_each(|p| p[2] = 0.0);
        }
        Self {
            dimensionality,
            points,
        }
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // The point set copied into each of the 3^d neighbouring tiles
    // (offsets of -resolution, 0, +resolution per active axis).
    fn tiled(&self, resolution: u32) -> Vec<[f64; 3]> {
        let r = resolution as f64;
        let z_shifts: &[f64] = match self.dimensionality {
            Dimensionality::TwoD => &[0.0],
            Dimensionality::ThreeD => &[-r, 0.0, r],
        };
        let copies = 3usize.pow(self.dimensionality.axes() as u32);
        let mut out = Vec::with_capacity(self.points.len() * copies);
        for &dz in z_shifts {
            for dy in [-r, 0.0, r] {
                for dx in [-r, 0.0, r] {
                    out.extend(self.points.iter().map(|p| [p[0] + dx, p[1] + dy, p[2] + dz]));
                }
            }
        }
        out
    }
}

#[inline]
fn distance(metric: DistanceMetric, a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = (a[0] - b[0]).abs();
    let dy = (a[1] - b[1]).abs();
    let dz = (a[2] - b[2]).abs();
    match metric {
        DistanceMetric::Euclidean => (dx * dx + dy * dy + dz * dz).sqrt(),
        DistanceMetric::Manhattan => dx + dy + dz,
        DistanceMetric::Chebyshev => dx.max(dy).max(dz),
    }
}

/// Nearest and second-nearest feature distance for every grid site, in grid
/// units, same layout as [`crate::ScalarField`].
#[derive(Clone, Debug, PartialEq)]
pub struct CellDistances {
    pub resolution: u32,
    pub nearest: Vec<f32>,
    pub second: Vec<f32>,
}

impl CellDistances {
    /// Reduce to one value per site. Distances are divided by the resolution
    /// so the result does not grow with the tile size.
    pub fn combine(&self, mode: CombinationMode) -> Vec<f32> {
        let inv = 1.0 / self.resolution as f32;
        match mode {
            CombinationMode::Nearest => self.nearest.iter().map(|d| d * inv).collect(),
            CombinationMode::SecondNearest => self.second.iter().map(|d| d * inv).collect(),
            CombinationMode::Difference => self
                .nearest
                .iter()
                .zip(&self.second)
                .map(|(n, s)| (s - n) * inv)
                .collect(),
        }
    }
}

/// Toroidal nearest-neighbour search over a tile of side `resolution`.
pub struct CellularSearch<'a> {
    points: &'a FeaturePoints,
    resolution: u32,
    metric: DistanceMetric,
}

impl<'a> CellularSearch<'a> {
    pub fn new(points: &'a FeaturePoints, resolution: u32, metric: DistanceMetric) -> Self {
        Self {
            points,
            resolution,
            metric,
        }
    }

    /// Every site is tested against every point in all 3^d translated copies
    /// of the tile, so points near one edge reach sites near the opposite one.
    /// Cost is O(resolution^d * num_points * 3^d); rows run in parallel.
    pub fn run(&self) -> CellDistances {
        let res = self.resolution as usize;
        let dimensionality = self.points.dimensionality;
        let count = dimensionality.cell_count(self.resolution);
        let tiled = self.points.tiled(self.resolution);
        let metric = self.metric;

        let mut nearest = vec![f32::MAX; count];
        let mut second = vec![f32::MAX; count];
        nearest
            .par_chunks_mut(res)
            .zip(second.par_chunks_mut(res))
            .enumerate()
            .for_each(|(row, (near_row, second_row))| {
                let y = (row % res) as f64;
                let z = (row / res) as f64;
                for x in 0..res {
                    let site = [x as f64, y, z];
                    let mut d1 = f64::MAX;
                    let mut d2 = f64::MAX;
                    for &p in &tiled {
                        let d = distance(metric, site, p);
                        if d < d1 {
                            d2 = d1;
                            d1 = d;
                        } else if d < d2 {
                            d2 = d;
                        }
                    }
                    near_row[x] = d1 as f32;
                    second_row[x] = d2 as f32;
                }
            });

        CellDistances {
            resolution: self.resolution,
            nearest,
            second,
        }
    }
}
