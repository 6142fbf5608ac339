use crate::config::Dimensionality;
use crate::utils::{flat_index, min_max};

/// Dense scalar field of side `resolution`, row-major with x fastest, then y,
/// then z. Values are in [0, 1] once a generator has normalized them.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    dimensionality: Dimensionality,
    resolution: u32,
    data: Vec<f32>,
}

impl ScalarField {
    pub fn zeros(dimensionality: Dimensionality, resolution: u32) -> Self {
        Self {
            dimensionality,
            resolution,
            data: vec![0.0; dimensionality.cell_count(resolution)],
        }
    }

    pub(crate) fn from_vec(dimensionality: Dimensionality, resolution: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), dimensionality.cell_count(resolution));
        Self {
            dimensionality,
            resolution,
            data,
        }
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // `z` is ignored for 2D fields.
    pub fn get(&self, x: u32, y: u32, z: u32) -> f32 {
        let z = match self.dimensionality {
            Dimensionality::TwoD => 0,
            Dimensionality::ThreeD => z as usize,
        };
        self.data[flat_index(self.resolution as usize, x as usize, y as usize, z)]
    }

    /// One z plane of `resolution * resolution` values. A 2D field has a
    /// single plane, returned for any `z`.
    pub fn slice(&self, z: u32) -> &[f32] {
        let plane = (self.resolution as usize).pow(2);
        match self.dimensionality {
            Dimensionality::TwoD => &self.data,
            Dimensionality::ThreeD => {
                let start = z as usize * plane;
                &self.data[start..start + plane]
            }
        }
    }

    pub fn min_max(&self) -> (f32, f32) {
        min_max(&self.data)
    }

    /// Exact equality down to the bit pattern of every sample.
    pub fn bit_identical(&self, other: &ScalarField) -> bool {
        self.dimensionality == other.dimensionality
            && self.resolution == other.resolution
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
