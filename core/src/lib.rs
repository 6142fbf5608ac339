// core holds the noise generators, the periodic cellular search, the channel
// pipeline with its cache and the compositor
pub mod cache;
pub mod cellular;
pub mod composite;
pub mod config;
pub mod curl;
pub mod error;
pub mod field;
pub mod generate;
pub mod perlin;
pub mod pipeline;
pub mod utils;
pub mod worley;

pub use cache::{CacheKey, FieldCache};
pub use cellular::{CellDistances, CellularSearch, FeaturePoints};
pub use composite::{CompositeImage, DisplayImage, ExportComposite, display_composite};
pub use config::{
    CellularParams, Channel, ChannelConfig, ChannelConfigs, CombinationMode, Dimensionality,
    DistanceMetric, FractalParams, GenerationRequest, NoiseKind,
};
pub use error::NoiseError;
pub use field::ScalarField;
pub use generate::generate;
pub use perlin::PeriodicPerlin;
pub use pipeline::{ChannelFields, ChannelPipeline};

// Noise that can be sampled at continuous 2D or 3D grid coordinates.
pub trait NoiseGenerator {
    // Sample 2D noise at (x, y).
    fn get2(&self, x: f64, y: f64) -> f64;

    // Sample 3D noise at (x, y, z).
    fn get3(&self, x: f64, y: f64, z: f64) -> f64;
}
