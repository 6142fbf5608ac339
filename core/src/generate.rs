use std::time::Instant;

use tracing::debug;

use crate::config::{CellularParams, ChannelConfig, Dimensionality, FractalParams, validate_resolution};
use crate::curl::curl_field;
use crate::error::Result;
use crate::field::ScalarField;
use crate::perlin::perlin_field;
use crate::worley::worley_field;

/// Build the field a channel config describes. Parameters are validated
/// before any work starts; identical inputs give bit-identical output.
/// `ChannelConfig::None` yields zeros.
pub fn generate(
    config: &ChannelConfig,
    dimensionality: Dimensionality,
    resolution: u32,
    seed: i64,
) -> Result<ScalarField> {
    validate_resolution(resolution)?;
    config.validate()?;

    let start = Instant::now();
    let field = match config {
        ChannelConfig::None => ScalarField::zeros(dimensionality, resolution),
        ChannelConfig::Perlin(fractal) => perlin_field(dimensionality, resolution, seed, fractal),
        ChannelConfig::Worley(cellular) => worley_field(dimensionality, resolution, seed, cellular),
        ChannelConfig::Curl(fractal) => curl_field(dimensionality, resolution, seed, fractal),
        ChannelConfig::PerlinWorley { fractal, cellular } => {
            perlin_worley_field(dimensionality, resolution, seed, fractal, cellular)
        }
    };
    debug!(
        kind = ?config.kind(),
        ?dimensionality,
        resolution,
        seed,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "generated field"
    );
    Ok(field)
}

/// Element-wise mean of a Perlin and a Worley field. Both inputs are already
/// in [0, 1], so the mean is left as is.
pub fn perlin_worley_field(
    dimensionality: Dimensionality,
    resolution: u32,
    seed: i64,
    fractal: &FractalParams,
    cellular: &CellularParams,
) -> ScalarField {
    let (perlin, worley) = rayon::join(
        || perlin_field(dimensionality, resolution, seed, fractal),
        || worley_field(dimensionality, resolution, seed, cellular),
    );
    let data = perlin
        .values()
        .iter()
        .zip(worley.values())
        .map(|(p, w)| (p + w) * 0.5)
        .collect();
    ScalarField::from_vec(dimensionality, resolution, data)
}
