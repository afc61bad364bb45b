// ============================================================
// Layer 4 — Degradation
// ============================================================
// Turns one decoded image into a training pair:
//
//   file ──decode──▶ RGB ──resize──▶ high-res (H × W)
//                                      │
//                          Gaussian blur (σ = 1.0)
//                                      │
//                          Catmull-Rom resize ──▶ low-res (h × w)
//
// Both halves are returned as planar CHW floats in [0, 1].

use anyhow::{Context, Result};
use image::{imageops, imageops::FilterType, RgbImage};
use std::path::Path;

pub const BLUR_SIGMA: f32 = 1.0;

/// One training pair, planar CHW, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SrSample {
    pub high_res: Vec<f32>,
    pub low_res:  Vec<f32>,
}

/// Target sizes for both halves of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairDims {
    pub high_width:  u32,
    pub high_height: u32,
    pub low_width:   u32,
    pub low_height:  u32,
}

impl PairDims {
    pub fn high_len(&self) -> usize {
        3 * self.high_width as usize * self.high_height as usize
    }

    pub fn low_len(&self) -> usize {
        3 * self.low_width as usize * self.low_height as usize
    }
}

pub fn load_pair(path: &Path, dims: PairDims) -> Result<SrSample> {
    let decoded = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?
        .to_rgb8();
    Ok(degrade(&decoded, dims))
}

pub fn degrade(image: &RgbImage, dims: PairDims) -> SrSample {
    let high = imageops::resize(image, dims.high_width, dims.high_height, FilterType::CatmullRom);
    let blurred = imageops::blur(&high, BLUR_SIGMA);
    let low = imageops::resize(&blurred, dims.low_width, dims.low_height, FilterType::CatmullRom);

    SrSample { high_res: to_planar(&high), low_res: to_planar(&low) }
}

/// Interleaved RGB8 → planar CHW floats in [0, 1].
pub fn to_planar(image: &RgbImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let plane = (w * h) as usize;
    let mut out = vec![0.0f32; 3 * plane];
    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            out[c * plane + i] = pixel[c] as f32 / 255.0;
        }
    }
    out
}

/// Planar CHW values in [0, 255] → interleaved RGB8, clipping out-of-range values.
pub fn from_planar(values: &[f32], width: u32, height: u32) -> RgbImage {
    let plane = (width * height) as usize;
    RgbImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        let px = |c: usize| values[c * plane + i].clamp(0.0, 255.0) as u8;
        image::Rgb([px(0), px(1), px(2)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: PairDims = PairDims { high_width: 16, high_height: 12, low_width: 8, low_height: 6 };

    #[test]
    fn test_pair_sizes() {
        let img = RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
        let sample = degrade(&img, DIMS);
        assert_eq!(sample.high_res.len(), DIMS.high_len());
        assert_eq!(sample.low_res.len(), DIMS.low_len());
    }

    #[test]
    fn test_solid_colour_survives_blur_and_resize() {
        let img = RgbImage::from_pixel(32, 32, image::Rgb([255, 0, 51]));
        let sample = degrade(&img, DIMS);
        let plane = 8 * 6;
        for (c, expected) in [1.0f32, 0.0, 0.2].iter().enumerate() {
            for v in &sample.low_res[c * plane..(c + 1) * plane] {
                assert!((v - expected).abs() < 0.01, "channel {c}: {v}");
            }
        }
    }

    #[test]
    fn test_planar_layout_and_back() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        let planar = to_planar(&img);
        assert_eq!(planar, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);

        let pixels: Vec<f32> = planar.iter().map(|v| v * 255.0).collect();
        assert_eq!(from_planar(&pixels, 2, 1), img);
    }

    #[test]
    fn test_from_planar_clips() {
        let img = from_planar(&[300.0, -5.0, 127.9], 1, 1);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 127]);
    }
}
