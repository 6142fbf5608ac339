use cloud_core::{
    CellularParams, ChannelConfig, CombinationMode, Dimensionality, FractalParams, ScalarField,
    generate, utils::to_u8,
};
use image::{GrayImage, Luma};
use std::path::Path;

const RES: u32 = 128;
const SEED: i64 = 42;

fn save_gray(field: &ScalarField, z: u32, filename: &str) {
    let plane = field.slice(z);
    let img = GrayImage::from_fn(RES, RES, |x, y| {
        Luma([to_u8(plane[(y * RES + x) as usize])])
    });
    img.save(Path::new(filename)).unwrap();
    println!("Saved {}", filename);
}

// Tiles the field 2x2 so seams are easy to spot.
fn save_tiled(field: &ScalarField, filename: &str) {
    let plane = field.slice(0);
    let img = GrayImage::from_fn(RES * 2, RES * 2, |x, y| {
        Luma([to_u8(plane[((y % RES) * RES + x % RES) as usize])])
    });
    img.save(Path::new(filename)).unwrap();
    println!("Saved {}", filename);
}

fn main() {
    let fractal = FractalParams {
        scale: 8.0,
        ..FractalParams::default()
    };
    let cellular = CellularParams {
        num_points: 24,
        ..CellularParams::default()
    };
    let configs = [
        ("perlin", ChannelConfig::Perlin(fractal)),
        ("worley", ChannelConfig::Worley(cellular)),
        (
            "worley_difference",
            ChannelConfig::Worley(CellularParams {
                combination: CombinationMode::Difference,
                ..cellular
            }),
        ),
        ("curl", ChannelConfig::Curl(fractal)),
        (
            "perlin_worley",
            ChannelConfig::PerlinWorley { fractal, cellular },
        ),
    ];

    for (name, config) in &configs {
        let field = generate(config, Dimensionality::TwoD, RES, SEED).unwrap();
        save_gray(&field, 0, &format!("{name}_2d.png"));
        save_tiled(&field, &format!("{name}_2d_tiled.png"));
    }

    let volume = generate(&configs[4].1, Dimensionality::ThreeD, RES, SEED).unwrap();
    save_gray(&volume, RES / 2, "perlin_worley_3d_mid.png");
}
