//! Layout error types
//!
//! Every failure the layout core reports to its callers.

use crate::data::LayerId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Operation attempted before the layout finished initializing
    #[error("layout is not ready")]
    NotReady,

    /// Operation attempted after the layout was torn down
    #[error("layout has been torn down")]
    TornDown,

    /// Layer was never registered with this layout
    #[error("unknown layer: {0}")]
    UnknownLayer(LayerId),

    /// Initialization finished with declared layers left unbound
    #[error("layout configuration error: layers never bound: {}", format_layers(.missing))]
    Configuration { missing: Vec<LayerId> },

    /// Layer bound twice during initialization
    #[error("layer bound twice: {0}")]
    DuplicateLayer(LayerId),

    /// Registration attempted after initialization completed
    #[error("layer registry is sealed; cannot bind {0}")]
    RegistrySealed(LayerId),

    /// Async class resolution failed
    #[error("failed to load widget class '{class}': {reason}")]
    LoadFailed { class: String, reason: String },

    /// Widget factory could not build an instance
    #[error("failed to construct widget '{class}': {reason}")]
    WidgetConstruction { class: String, reason: String },

    /// Async push requested outside a tokio runtime
    #[error("async widget loads need a running tokio runtime")]
    NoAsyncRuntime,
}

fn format_layers(layers: &[LayerId]) -> String {
    layers
        .iter()
        .map(LayerId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
