// ============================================================
// Layer 6 — Validation Images
// ============================================================
// Writes each validation sample as a pair of PNGs so progress
// can be inspected by eye:
//
//   val_images/epoch_1_iteration_100_num_1_real_.png
//   val_images/epoch_1_iteration_100_num_1_generated.png
//
// Sample numbers are 1-based.

use anyhow::{Context, Result};
use image::RgbImage;
use std::{fs, path::PathBuf};

pub struct ValidationWriter {
    dir: PathBuf,
}

impl ValidationWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create validation directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn pair_paths(&self, epoch: usize, iteration: usize, num: usize) -> (PathBuf, PathBuf) {
        let stem = format!("epoch_{epoch}_iteration_{iteration}_num_{num}");
        (
            self.dir.join(format!("{stem}_real_.png")),
            self.dir.join(format!("{stem}_generated.png")),
        )
    }

    pub fn write_pair(
        &self,
        epoch:     usize,
        iteration: usize,
        num:       usize,
        real:      &RgbImage,
        generated: &RgbImage,
    ) -> Result<()> {
        let (real_path, generated_path) = self.pair_paths(epoch, iteration, num);
        real.save(&real_path)
            .with_context(|| format!("Cannot write '{}'", real_path.display()))?;
        generated
            .save(&generated_path)
            .with_context(|| format!("Cannot write '{}'", generated_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_written_with_expected_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ValidationWriter::new(dir.path().join("val_images")).unwrap();
        let img = RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        writer.write_pair(2, 150, 1, &img, &img).unwrap();

        let (real, generated) = writer.pair_paths(2, 150, 1);
        assert!(real.ends_with("epoch_2_iteration_150_num_1_real_.png"));
        assert!(generated.ends_with("epoch_2_iteration_150_num_1_generated.png"));
        assert_eq!(image::open(&generated).unwrap().to_rgb8(), img);
    }
}
