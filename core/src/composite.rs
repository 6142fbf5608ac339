use image::{RgbImage, RgbaImage};

use crate::config::{Channel, Dimensionality};
use crate::pipeline::ChannelFields;
use crate::utils::{flat_index, to_u8};

/// Preview image: one RGB triple in [0, 1] per pixel, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayImage {
    resolution: u32,
    rgb: Vec<f32>,
}

impl DisplayImage {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = 3 * (y as usize * self.resolution as usize + x as usize);
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    pub fn values(&self) -> &[f32] {
        &self.rgb
    }

    pub fn to_rgb8(&self) -> Vec<u8> {
        self.rgb.iter().map(|&v| to_u8(v)).collect()
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let side = self.resolution;
        RgbImage::from_fn(side, side, |x, y| image::Rgb(self.pixel(x, y).map(to_u8)))
    }
}

/// Preview composite of the channels listed in `show_channels`.
///
/// With exactly one shown channel the result is that channel in grey. With
/// any other number, shown channels fill their RGBA slot, hidden colour
/// slots stay 0 and a hidden alpha counts as opaque; the RGBA result is then
/// laid over white (`rgb * a + (1 - a)`). 3D fields contribute their
/// `z_slice` plane, clamped to the last layer. This transform is for display
/// only; see [`ExportComposite`] for what gets written.
pub fn display_composite(
    fields: &ChannelFields,
    show_channels: &[Channel],
    z_slice: u32,
) -> DisplayImage {
    let resolution = fields.resolution();
    let z_slice = z_slice.min(fields.dimensionality().depth(resolution).saturating_sub(1));
    let plane = (resolution as usize).pow(2);

    let rgb = if let [channel] = show_channels {
        let values = fields.get(*channel).slice(z_slice);
        values.iter().flat_map(|&v| [v, v, v]).collect()
    } else {
        let slot = |channel: Channel| {
            show_channels
                .contains(&channel)
                .then(|| fields.get(channel).slice(z_slice))
        };
        let red = slot(Channel::Red);
        let green = slot(Channel::Green);
        let blue = slot(Channel::Blue);
        let alpha = slot(Channel::Alpha);

        let mut rgb = Vec::with_capacity(plane * 3);
        for i in 0..plane {
            let a = alpha.map_or(1.0, |s| s[i]);
            for color in [red, green, blue] {
                let c = color.map_or(0.0, |s| s[i]);
                rgb.push(c * a + (1.0 - a));
            }
        }
        rgb
    };

    DisplayImage { resolution, rgb }
}

/// Eagerly rendered export: one RGBA8 buffer per depth slice.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeImage {
    pub resolution: u32,
    pub slices: Vec<Vec<u8>>,
}

/// Export-side composite. Each RGBA byte comes straight from its channel:
/// a selected channel contributes its field scaled to 0..=255, an unselected
/// colour channel is 0 and an unselected alpha is 255. No blending.
#[derive(Clone, Debug)]
pub struct ExportComposite {
    fields: ChannelFields,
    selected: [bool; 4],
}

impl ExportComposite {
    pub fn new(fields: ChannelFields, show_channels: &[Channel]) -> Self {
        let selected = Channel::ALL.map(|c| show_channels.contains(&c));
        Self { fields, selected }
    }

    pub fn fields(&self) -> &ChannelFields {
        &self.fields
    }

    pub fn resolution(&self) -> u32 {
        self.fields.resolution()
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.fields.dimensionality()
    }

    /// 1 for 2D, `resolution` for 3D.
    pub fn slice_count(&self) -> u32 {
        self.dimensionality().depth(self.resolution())
    }

    /// RGBA8 bytes of depth slice `z`, row-major.
    pub fn rgba_slice(&self, z: u32) -> Vec<u8> {
        let planes = Channel::ALL
            .map(|c| self.selected[c.index()].then(|| self.fields.get(c).slice(z)));
        let count = (self.resolution() as usize).pow(2);
        let mut out = Vec::with_capacity(count * 4);
        for i in 0..count {
            for channel in Channel::ALL {
                out.push(match planes[channel.index()] {
                    Some(plane) => to_u8(plane[i]),
                    None if channel == Channel::Alpha => 255,
                    None => 0,
                });
            }
        }
        out
    }

    pub fn slice_image(&self, z: u32) -> RgbaImage {
        let side = self.resolution();
        // from_raw only fails on a length mismatch, which rgba_slice rules out
        RgbaImage::from_raw(side, side, self.rgba_slice(z))
            .unwrap_or_else(|| RgbaImage::new(side, side))
    }

    pub fn render(&self) -> CompositeImage {
        CompositeImage {
            resolution: self.resolution(),
            slices: (0..self.slice_count()).map(|z| self.rgba_slice(z)).collect(),
        }
    }

    /// All four channel volumes interleaved as RGBA `f32`, x fastest, then y,
    /// then z, with the same selection rules as the byte slices (hidden colour
    /// = 0.0, hidden alpha = 1.0).
    pub fn volume_rgba_f32(&self) -> Vec<f32> {
        let res = self.resolution() as usize;
        let depth = self.slice_count() as usize;
        let mut out = Vec::with_capacity(res * res * depth * 4);
        for z in 0..depth {
            for y in 0..res {
                for x in 0..res {
                    for channel in Channel::ALL {
                        let field = self.fields.get(channel);
                        out.push(if self.selected[channel.index()] {
                            field.slice(z as u32)[flat_index(res, x, y, 0)]
                        } else if channel == Channel::Alpha {
                            1.0
                        } else {
                            0.0
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::ScalarField;

    fn constant(dim: Dimensionality, res: u32, v: f32) -> Arc<ScalarField> {
        let data = vec![v; dim.cell_count(res)];
        Arc::new(ScalarField::from_vec(dim, res, data))
    }

    fn fields(dim: Dimensionality, values: [f32; 4]) -> ChannelFields {
        ChannelFields::new(dim, 16, values.map(|v| constant(dim, 16, v)))
    }

    #[test]
    fn single_channel_is_grey() {
        let f = fields(Dimensionality::TwoD, [0.25, 0.5, 0.75, 0.0]);
        let img = display_composite(&f, &[Channel::Green], 0);
        assert_eq!(img.pixel(3, 4), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn single_red_ignores_alpha_field() {
        // alpha of 0 would blank the pixel if it were applied
        let f = fields(Dimensionality::TwoD, [0.3, 0.9, 0.9, 0.0]);
        let img = display_composite(&f, &[Channel::Red], 0);
        assert!(img.values().iter().all(|&v| v == 0.3));
    }

    #[test]
    fn hidden_alpha_is_opaque() {
        let f = fields(Dimensionality::TwoD, [0.2, 0.4, 0.6, 0.0]);
        let img = display_composite(&f, &[Channel::Red, Channel::Blue], 0);
        // green hidden -> 0, alpha hidden -> 1, so no white shows through
        assert_eq!(img.pixel(0, 0), [0.2, 0.0, 0.6]);
    }

    #[test]
    fn shown_alpha_blends_over_white() {
        let f = fields(Dimensionality::TwoD, [1.0, 0.0, 0.0, 0.5]);
        let img = display_composite(&f, &[Channel::Red, Channel::Alpha], 0);
        assert_eq!(img.pixel(0, 0), [1.0, 0.5, 0.5]);
    }

    #[test]
    fn preview_bytes_match_the_image() {
        let f = fields(Dimensionality::TwoD, [1.0, 0.5, 0.0, 0.0]);
        let img = display_composite(&f, &[Channel::Red, Channel::Green], 0);
        let bytes = img.to_rgb8();
        assert_eq!(bytes.len(), 16 * 16 * 3);
        assert_eq!(&bytes[..3], &[255, 127, 0]);
        assert_eq!(img.to_rgb_image().as_raw(), &bytes);
    }

    #[test]
    fn no_shown_channels_is_black() {
        let f = fields(Dimensionality::TwoD, [1.0, 1.0, 1.0, 1.0]);
        let img = display_composite(&f, &[], 0);
        assert!(img.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn display_takes_the_requested_slice() {
        let data: Vec<f32> = (0..16u32 * 16 * 16).map(|i| (i / 256) as f32 / 15.0).collect();
        let red = Arc::new(ScalarField::from_vec(Dimensionality::ThreeD, 16, data));
        let zero = constant(Dimensionality::ThreeD, 16, 0.0);
        let f = ChannelFields::new(
            Dimensionality::ThreeD,
            16,
            [red, zero.clone(), zero.clone(), zero],
        );
        let img = display_composite(&f, &[Channel::Red], 5);
        assert_eq!(img.pixel(7, 7), [5.0 / 15.0; 3]);
    }

    #[test]
    fn slice_past_the_end_shows_the_last_layer() {
        let data: Vec<f32> = (0..16u32 * 16 * 16).map(|i| (i / 256) as f32 / 15.0).collect();
        let red = Arc::new(ScalarField::from_vec(Dimensionality::ThreeD, 16, data));
        let zero = constant(Dimensionality::ThreeD, 16, 0.0);
        let f = ChannelFields::new(
            Dimensionality::ThreeD,
            16,
            [red, zero.clone(), zero.clone(), zero],
        );
        let img = display_composite(&f, &[Channel::Red], 40);
        assert_eq!(img.pixel(2, 9), [1.0; 3]);
    }

    #[test]
    fn export_bytes_follow_selection() {
        let f = fields(Dimensionality::TwoD, [1.0, 0.5, 0.25, 0.0]);
        let export = ExportComposite::new(f.clone(), &[Channel::Red, Channel::Green]);
        let bytes = export.rgba_slice(0);
        assert_eq!(bytes.len(), 16 * 16 * 4);
        assert_eq!(&bytes[..4], &[255, 127, 0, 255]);

        let with_alpha = ExportComposite::new(f, &[Channel::Blue, Channel::Alpha]);
        assert_eq!(&with_alpha.rgba_slice(0)[..4], &[0, 0, 63, 0]);
    }

    #[test]
    fn export_of_a_volume_has_one_slice_per_layer() {
        let f = fields(Dimensionality::ThreeD, [0.5; 4]);
        let export = ExportComposite::new(f, &[Channel::Red]);
        let image = export.render();
        assert_eq!(export.slice_count(), 16);
        assert_eq!(image.slices.len(), 16);
        assert_eq!(export.slice_image(3).dimensions(), (16, 16));
    }

    #[test]
    fn volume_buffer_is_interleaved() {
        let f = fields(Dimensionality::ThreeD, [0.1, 0.2, 0.3, 0.4]);
        let export = ExportComposite::new(f, &[Channel::Red, Channel::Blue]);
        let volume = export.volume_rgba_f32();
        assert_eq!(volume.len(), 16 * 16 * 16 * 4);
        assert_eq!(&volume[..4], &[0.1, 0.0, 0.3, 1.0]);
    }
}
