//! Channel ↔ space rearrangement used by the generator's upscale blocks.
//!
//! `depth_to_space` turns `[B, C·r², H, W]` into `[B, C, H·r, W·r]`;
//! `space_to_depth` is its exact inverse. Both are pure reshapes and
//! axis swaps, so no element is ever recomputed.

use burn::prelude::*;

pub fn depth_to_space<B: Backend>(input: Tensor<B, 4>, factor: usize) -> Tensor<B, 4> {
    let [batch, channels, height, width] = input.dims();
    let area = factor * factor;
    assert_eq!(
        channels % area,
        0,
        "depth_to_space: {channels} channels not divisible by {area}"
    );
    let out_channels = channels / area;

    // [B, C, r, r, H, W] -> [B, C, H, r, W, r]
    input
        .reshape([batch, out_channels, factor, factor, height, width])
        .swap_dims(2, 4)
        .swap_dims(3, 4)
        .swap_dims(4, 5)
        .reshape([batch, out_channels, height * factor, width * factor])
}

pub fn space_to_depth<B: Backend>(input: Tensor<B, 4>, factor: usize) -> Tensor<B, 4> {
    let [batch, channels, height, width] = input.dims();
    assert!(
        height % factor == 0 && width % factor == 0,
        "space_to_depth: {height}x{width} not divisible by {factor}"
    );
    let (h, w) = (height / factor, width / factor);

    // [B, C, H, r, W, r] -> [B, C, r, r, H, W]
    input
        .reshape([batch, channels, h, factor, w, factor])
        .swap_dims(4, 5)
        .swap_dims(3, 4)
        .swap_dims(2, 4)
        .reshape([batch, channels * factor * factor, h, w])
}
