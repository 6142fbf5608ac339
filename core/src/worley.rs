use crate::cellular::{CellularSearch, FeaturePoints};
use crate::config::{CellularParams, Dimensionality};
use crate::field::ScalarField;
use crate::utils::normalize;

/// Tileable cellular noise: `1 - distance`, then min–max normalized, so
/// sites close to a feature point are bright.
pub fn worley_field(
    dimensionality: Dimensionality,
    resolution: u32,
    seed: i64,
    params: &CellularParams,
) -> ScalarField {
    let points = FeaturePoints::generate(seed, params.num_points, dimensionality, resolution);
    worley_from_points(&points, resolution, params)
}

/// Same as [`worley_field`] with an explicit point set.
pub fn worley_from_points(
    points: &FeaturePoints,
    resolution: u32,
    params: &CellularParams,
) -> ScalarField {
    let distances = CellularSearch::new(points, resolution, params.distance_metric).run();
    let mut data = distances.combine(params.combination);
    data.iter_mut().for_each(|d| *d = 1.0 - *d);
    normalize(&mut data);
    ScalarField::from_vec(points.dimensionality(), resolution, data)
}
