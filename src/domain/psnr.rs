// ============================================================
// Layer 3 — PSNR
// ============================================================
// Peak signal-to-noise ratio between a reference image and a
// reconstruction, both given as flat pixel slices on the same
// scale:
//
//   PSNR = 10 · log10(peak² / MSE)
//
// Identical images have zero error and an infinite PSNR.

/// PSNR in decibels. Returns `f64::INFINITY` when the images are identical.
///
/// # Panics
/// Panics if the slices differ in length or are empty.
pub fn psnr(reference: &[f32], candidate: &[f32], peak: f64) -> f64 {
    assert_eq!(
        reference.len(),
        candidate.len(),
        "PSNR needs equally sized images"
    );
    assert!(!reference.is_empty(), "PSNR of an empty image");

    let mse = reference
        .iter()
        .zip(candidate)
        .map(|(&r, &c)| {
            let d = r as f64 - c as f64;
            d * d
        })
        .sum::<f64>()
        / reference.len() as f64;

    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (peak * peak / mse).log10()
    }
}

/// Mean PSNR over a batch of equally sized images laid out back to back.
pub fn batch_psnr(reference: &[f32], candidate: &[f32], images: usize, peak: f64) -> f64 {
    let per_image = reference.len() / images.max(1);
    reference
        .chunks(per_image)
        .zip(candidate.chunks(per_image))
        .map(|(r, c)| psnr(r, c, peak))
        .sum::<f64>()
        / images.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_images_are_infinite() {
        let img = vec![0.25f32; 48];
        assert!(psnr(&img, &img, 1.0).is_infinite());
    }

    #[test]
    fn test_uniform_offset_matches_closed_form() {
        let reference: Vec<f32> = (0..300).map(|i| (i % 200) as f32).collect();
        let shifted:   Vec<f32> = reference.iter().map(|p| p + 10.0).collect();
        let expected = 10.0 * (255.0f64 * 255.0 / 100.0).log10();
        assert!((psnr(&reference, &shifted, 255.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_batch_mean() {
        let reference = vec![0.0f32; 8];
        let mut candidate = vec![0.0f32; 8];
        // one exact reconstruction makes the batch mean infinite
        for p in &mut candidate[4..] {
            *p = 0.1;
        }
        let avg = batch_psnr(&reference, &candidate, 2, 1.0);
        assert!(avg.is_infinite());

        let both_off = vec![0.1f32; 8];
        let avg = batch_psnr(&reference, &both_off, 2, 1.0);
        assert!((avg - 20.0).abs() < 1e-4);
    }

    #[test]
    #[should_panic]
    fn test_length_mismatch_panics() {
        psnr(&[0.0, 1.0], &[0.0], 1.0);
    }
}
