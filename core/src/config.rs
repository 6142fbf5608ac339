use std::{fs, ops::RangeInclusive, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};

pub const RESOLUTION_RANGE: RangeInclusive<u32> = 16..=512;
pub const OCTAVE_RANGE: RangeInclusive<u32> = 1..=8;
pub const PERSISTENCE_RANGE: RangeInclusive<f64> = 0.1..=1.0;
pub const LACUNARITY_RANGE: RangeInclusive<f64> = 1.0..=4.0;
pub const FEATURE_POINT_RANGE: RangeInclusive<u32> = 1..=256;

/// Which generator a channel uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    None,
    Perlin,
    Worley,
    Curl,
    PerlinWorley,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

/// How nearest / second-nearest cellular distances reduce to one value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationMode {
    #[default]
    Nearest,
    SecondNearest,
    Difference,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimensionality {
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl Dimensionality {
    pub fn axes(self) -> usize {
        match self {
            Dimensionality::TwoD => 2,
            Dimensionality::ThreeD => 3,
        }
    }

    // Number of samples in a field of this dimensionality.
    pub fn cell_count(self, resolution: u32) -> usize {
        (resolution as usize).pow(self.axes() as u32)
    }

    // Number of 2D slices along z.
    pub fn depth(self, resolution: u32) -> u32 {
        match self {
            Dimensionality::TwoD => 1,
            Dimensionality::ThreeD => resolution,
        }
    }
}

/// Output channel of the composite, in RGBA order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

/// Layered gradient noise parameters (Perlin, Curl and the Perlin half of
/// Perlin-Worley).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    pub scale: f64,       // grid units per noise lattice cell at octave 0
    pub octaves: u32,     // number of layers to sum
    pub persistence: f64, // amplitude multiplier per octave
    pub lacunarity: f64,  // frequency multiplier per octave
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl FractalParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(NoiseError::invalid(
                "scale",
                format!("must be finite and > 0, got {}", self.scale),
            ));
        }
        if !OCTAVE_RANGE.contains(&self.octaves) {
            return Err(NoiseError::invalid(
                "octaves",
                format!("must be in {OCTAVE_RANGE:?}, got {}", self.octaves),
            ));
        }
        if !PERSISTENCE_RANGE.contains(&self.persistence) {
            return Err(NoiseError::invalid(
                "persistence",
                format!("must be in {PERSISTENCE_RANGE:?}, got {}", self.persistence),
            ));
        }
        if !LACUNARITY_RANGE.contains(&self.lacunarity) {
            return Err(NoiseError::invalid(
                "lacunarity",
                format!("must be in {LACUNARITY_RANGE:?}, got {}", self.lacunarity),
            ));
        }
        Ok(())
    }

    fn push_canonical(&self, out: &mut Vec<u64>) {
        out.extend([
            canonical_f64(self.scale),
            self.octaves as u64,
            canonical_f64(self.persistence),
            canonical_f64(self.lacunarity),
        ]);
    }
}

/// Feature-point parameters (Worley and the Worley half of Perlin-Worley).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CellularParams {
    pub num_points: u32,
    pub distance_metric: DistanceMetric,
    pub combination: CombinationMode,
}

impl Default for CellularParams {
    fn default() -> Self {
        Self {
            num_points: 20,
            distance_metric: DistanceMetric::Euclidean,
            combination: CombinationMode::Nearest,
        }
    }
}

impl CellularParams {
    pub fn validate(&self) -> Result<()> {
        if !FEATURE_POINT_RANGE.contains(&self.num_points) {
            return Err(NoiseError::invalid(
                "num_points",
                format!("must be in {FEATURE_POINT_RANGE:?}, got {}", self.num_points),
            ));
        }
        Ok(())
    }

    fn push_canonical(&self, out: &mut Vec<u64>) {
        out.extend([
            self.num_points as u64,
            self.distance_metric as u64,
            self.combination as u64,
        ]);
    }
}

/// One channel's generator together with exactly the parameters it needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelConfig {
    #[default]
    None,
    Perlin(FractalParams),
    Worley(CellularParams),
    Curl(FractalParams),
    PerlinWorley {
        #[serde(default)]
        fractal: FractalParams,
        #[serde(default)]
        cellular: CellularParams,
    },
}

impl ChannelConfig {
    pub fn kind(&self) -> NoiseKind {
        match self {
            ChannelConfig::None => NoiseKind::None,
            ChannelConfig::Perlin(_) => NoiseKind::Perlin,
            ChannelConfig::Worley(_) => NoiseKind::Worley,
            ChannelConfig::Curl(_) => NoiseKind::Curl,
            ChannelConfig::PerlinWorley { .. } => NoiseKind::PerlinWorley,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ChannelConfig::None => Ok(()),
            ChannelConfig::Perlin(fractal) | ChannelConfig::Curl(fractal) => fractal.validate(),
            ChannelConfig::Worley(cellular) => cellular.validate(),
            ChannelConfig::PerlinWorley { fractal, cellular } => {
                fractal.validate()?;
                cellular.validate()
            }
        }
    }

    /// Every output-affecting parameter as exact integers. Floats are stored
    /// by bit pattern so two keys compare equal only for identical inputs.
    pub fn canonical_params(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(7);
        match self {
            ChannelConfig::None => {}
            ChannelConfig::Perlin(fractal) | ChannelConfig::Curl(fractal) => {
                fractal.push_canonical(&mut out)
            }
            ChannelConfig::Worley(cellular) => cellular.push_canonical(&mut out),
            ChannelConfig::PerlinWorley { fractal, cellular } => {
                fractal.push_canonical(&mut out);
                cellular.push_canonical(&mut out);
            }
        }
        out
    }
}

// -0.0 and 0.0 produce identical fields, so they share a key.
fn canonical_f64(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfigs {
    pub red: ChannelConfig,
    pub green: ChannelConfig,
    pub blue: ChannelConfig,
    pub alpha: ChannelConfig,
}

impl ChannelConfigs {
    pub fn get(&self, channel: Channel) -> &ChannelConfig {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
            Channel::Alpha => &self.alpha,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelConfig {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Alpha => &mut self.alpha,
        }
    }
}

/// A fully resolved request: everything the core needs for one preview or
/// export, passed by value. Nothing in the core reads ambient state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub dimensionality: Dimensionality,
    pub resolution: u32,
    pub seed: i64,
    pub z_slice: u32, // preview slice for 3D, ignored for 2D
    pub show_channels: Vec<Channel>,
    pub channels: ChannelConfigs,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            dimensionality: Dimensionality::TwoD,
            resolution: 64,
            seed: 42,
            z_slice: 0,
            show_channels: vec![Channel::Red],
            channels: ChannelConfigs::default(),
        }
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        validate_resolution(self.resolution)?;
        if self.z_slice >= self.resolution {
            return Err(NoiseError::invalid(
                "z_slice",
                format!(
                    "must be below the resolution {}, got {}",
                    self.resolution, self.z_slice
                ),
            ));
        }
        for (i, channel) in self.show_channels.iter().enumerate() {
            if self.show_channels[..i].contains(channel) {
                return Err(NoiseError::invalid(
                    "show_channels",
                    format!("{channel:?} listed more than once"),
                ));
            }
        }
        for channel in Channel::ALL {
            self.channels.get(channel).validate()?;
        }
        Ok(())
    }

    /// Parse and validate a request from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let request: GenerationRequest = toml::from_str(text)?;
        request.validate()?;
        Ok(request)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn is_shown(&self, channel: Channel) -> bool {
        self.show_channels.contains(&channel)
    }
}

pub fn validate_resolution(resolution: u32) -> Result<()> {
    if !RESOLUTION_RANGE.contains(&resolution) {
        return Err(NoiseError::invalid(
            "resolution",
            format!("must be in {RESOLUTION_RANGE:?}, got {resolution}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let mut request = GenerationRequest::default();
        request.channels.red = ChannelConfig::Perlin(FractalParams::default());
        request.channels.alpha = ChannelConfig::PerlinWorley {
            fractal: FractalParams::default(),
            cellular: CellularParams::default(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn out_of_range_octaves_rejected() {
        let params = FractalParams {
            octaves: 9,
            ..FractalParams::default()
        };
        match ChannelConfig::Perlin(params).validate() {
            Err(NoiseError::InvalidParameter { name, .. }) => assert_eq!(name, "octaves"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn nan_scale_rejected() {
        let params = FractalParams {
            scale: f64::NAN,
            ..FractalParams::default()
        };
        assert!(ChannelConfig::Curl(params).validate().is_err());
    }

    #[test]
    fn zero_points_rejected() {
        let params = CellularParams {
            num_points: 0,
            ..CellularParams::default()
        };
        assert!(ChannelConfig::Worley(params).validate().is_err());
    }

    #[test]
    fn resolution_and_slice_bounds() {
        let mut request = GenerationRequest {
            resolution: 8,
            ..GenerationRequest::default()
        };
        assert!(request.validate().is_err());
        request.resolution = 16;
        request.z_slice = 16;
        assert!(request.validate().is_err());
        request.z_slice = 15;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn duplicate_show_channels_rejected() {
        let request = GenerationRequest {
            show_channels: vec![Channel::Red, Channel::Red],
            ..GenerationRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn parses_toml_request() {
        let text = r#"
            dimensionality = "3d"
            resolution = 32
            seed = 7
            z_slice = 4
            show_channels = ["red", "alpha"]

            [channels.red]
            kind = "perlin"
            scale = 12.0
            octaves = 3

            [channels.alpha]
            kind = "perlin_worley"
            [channels.alpha.cellular]
            num_points = 8
            distance_metric = "chebyshev"
            combination = "difference"
        "#;
        let request = GenerationRequest::from_toml_str(text).unwrap();
        assert_eq!(request.dimensionality, Dimensionality::ThreeD);
        assert_eq!(request.resolution, 32);
        assert_eq!(request.show_channels, vec![Channel::Red, Channel::Alpha]);
        match request.channels.red {
            ChannelConfig::Perlin(p) => {
                assert_eq!(p.scale, 12.0);
                assert_eq!(p.octaves, 3);
                assert_eq!(p.persistence, 0.5);
            }
            other => panic!("unexpected red config {other:?}"),
        }
        assert_eq!(request.channels.green, ChannelConfig::None);
        match request.channels.alpha {
            ChannelConfig::PerlinWorley { fractal, cellular } => {
                assert_eq!(fractal, FractalParams::default());
                assert_eq!(cellular.num_points, 8);
                assert_eq!(cellular.distance_metric, DistanceMetric::Chebyshev);
                assert_eq!(cellular.combination, CombinationMode::Difference);
            }
            other => panic!("unexpected alpha config {other:?}"),
        }
    }

    #[test]
    fn invalid_toml_values_fail_validation() {
        let text = r#"
            resolution = 64
            [channels.green]
            kind = "worley"
            num_points = 0
        "#;
        assert!(matches!(
            GenerationRequest::from_toml_str(text),
            Err(NoiseError::InvalidParameter { name: "num_points", .. })
        ));
    }

    #[test]
    fn canonical_params_distinguish_single_changes() {
        let base = FractalParams::default();
        let a = ChannelConfig::Perlin(base).canonical_params();
        let b = ChannelConfig::Perlin(FractalParams {
            lacunarity: 2.1,
            ..base
        })
        .canonical_params();
        assert_ne!(a, b);
        assert_eq!(a, ChannelConfig::Perlin(base).canonical_params());
    }
}
