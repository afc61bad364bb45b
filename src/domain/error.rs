use thiserror::Error;

/// Fatal conditions raised by the trainer itself.
///
/// I/O and decoding failures travel as `anyhow::Error` with context;
/// this enum covers the cases callers may want to match on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SrganError {
    /// A configured image dimension is below the supported minimum.
    #[error("image {dimension} must be at least {minimum} pixels, got {actual}")]
    ImageTooSmall {
        dimension: &'static str,
        minimum:   usize,
        actual:    usize,
    },

    /// The archive records a different number of layers than the network has.
    #[error(
        "weight archive '{archive}' records {found} layers but the {network} network has {expected}"
    )]
    LayerCountMismatch {
        archive:  String,
        network:  &'static str,
        expected: usize,
        found:    usize,
    },

    /// Same layer count, but a layer appears under a different name.
    #[error("layer {index} of '{archive}' is named '{found}', expected '{expected}'")]
    LayerNameMismatch {
        archive:  String,
        index:    usize,
        expected: String,
        found:    String,
    },

    /// A layer's parameter shapes differ between archive and network.
    #[error("layer '{layer}' in '{archive}' has shapes {found:?}, network expects {expected:?}")]
    LayerShapeMismatch {
        archive:  String,
        layer:    String,
        expected: Vec<Vec<usize>>,
        found:    Vec<Vec<usize>>,
    },

    /// A composite graph was asked for a subnetwork its mode does not build.
    #[error("{mode} graph has no {subnetwork}")]
    MissingSubnetwork {
        mode:       &'static str,
        subnetwork: &'static str,
    },

    /// The image directory contained no readable image files.
    #[error("no images found under '{0}'")]
    EmptyImageDirectory(String),
}
