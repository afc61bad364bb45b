//! Registry entries built from live Burn layers.
//!
//! Each subnetwork lists its weighted layers in forward order with
//! the shapes of the parameters it would write to an archive.

use burn::{
    nn::{conv::Conv2d, BatchNorm, Linear},
    prelude::*,
};

use crate::domain::registry::{LayerEntry, LayerRegistry};

/// A subnetwork that can describe its own weighted layers.
pub trait WeightRegistry {
    /// Prefix shared by every layer name of this subnetwork.
    const PREFIX: &'static str;
    /// Human readable name used in errors and logs.
    const NETWORK: &'static str;

    fn registry(&self) -> LayerRegistry;
}

pub fn conv_entry<B: Backend>(name: impl Into<String>, conv: &Conv2d<B>) -> LayerEntry {
    let mut shapes = vec![conv.weight.val().dims().to_vec()];
    if let Some(bias) = &conv.bias {
        shapes.push(bias.val().dims().to_vec());
    }
    LayerEntry::new(name, shapes)
}

/// gamma, beta, running mean, running variance.
pub fn norm_entry<B: Backend>(name: impl Into<String>, norm: &BatchNorm<B, 2>) -> LayerEntry {
    LayerEntry::new(
        name,
        vec![
            norm.gamma.val().dims().to_vec(),
            norm.beta.val().dims().to_vec(),
            norm.running_mean.value().dims().to_vec(),
            norm.running_var.value().dims().to_vec(),
        ],
    )
}

pub fn dense_entry<B: Backend>(name: impl Into<String>, linear: &Linear<B>) -> LayerEntry {
    let mut shapes = vec![linear.weight.val().dims().to_vec()];
    if let Some(bias) = &linear.bias {
        shapes.push(bias.val().dims().to_vec());
    }
    LayerEntry::new(name, shapes)
}

/// Collect entries into a registry, preserving order.
pub fn collect(entries: impl IntoIterator<Item = LayerEntry>) -> LayerRegistry {
    let mut registry = LayerRegistry::new();
    for entry in entries {
        registry.push(entry);
    }
    registry
}
