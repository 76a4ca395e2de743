//! Layer identifiers and per-layer policy
//!
//! Layers are named by hierarchical tags (`UI.Layer.Modal`). The set of layers
//! a layout owns comes from configuration; the well-known tags below are the
//! defaults every shipped layout declares.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Tag of the in-world HUD layer (lowest)
pub const GAME_LAYER_TAG: &str = "UI.Layer.Game";
/// Tag of the in-game menu layer (inventory, pause menu)
pub const GAME_MENU_LAYER_TAG: &str = "UI.Layer.GameMenu";
/// Tag of the front-end menu layer (settings, main menu)
pub const MENU_LAYER_TAG: &str = "UI.Layer.Menu";
/// Tag of the modal layer (confirmation prompts, errors)
pub const MODAL_LAYER_TAG: &str = "UI.Layer.Modal";

/// Stable identifier of one layer
///
/// Cheap to clone - the tag string is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LayerId(Arc<str>);

impl LayerId {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(Arc::from(tag.as_ref()))
    }

    pub fn game() -> Self {
        Self::new(GAME_LAYER_TAG)
    }

    pub fn game_menu() -> Self {
        Self::new(GAME_MENU_LAYER_TAG)
    }

    pub fn menu() -> Self {
        Self::new(MENU_LAYER_TAG)
    }

    pub fn modal() -> Self {
        Self::new(MODAL_LAYER_TAG)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the tag (`UI.Layer.Modal` -> `Modal`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Match either the full tag or its short name, ignoring case
    pub fn matches_name(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name) || self.short_name().eq_ignore_ascii_case(name)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for LayerId {
    fn from(tag: String) -> Self {
        Self(Arc::from(tag))
    }
}

impl From<LayerId> for String {
    fn from(id: LayerId) -> Self {
        id.0.to_string()
    }
}

/// Input policy of a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPolicy {
    /// An active widget on a modal layer blocks input to every layer below it.
    /// Non-modal layers let input pass through to lower layers.
    #[serde(default)]
    pub modal: bool,
}

impl LayerPolicy {
    pub fn modal() -> Self {
        Self { modal: true }
    }

    pub fn passthrough() -> Self {
        Self { modal: false }
    }
}

/// Declaration of one layer, in bottom-to-top order within a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDef {
    pub id: LayerId,
    #[serde(flatten)]
    pub policy: LayerPolicy,
}

impl LayerDef {
    pub fn new(id: impl Into<LayerId>, policy: LayerPolicy) -> Self {
        Self {
            id: id.into(),
            policy,
        }
    }

    /// The four layers every default layout declares
    pub fn standard_layers() -> Vec<LayerDef> {
        vec![
            LayerDef::new(GAME_LAYER_TAG, LayerPolicy::passthrough()),
            LayerDef::new(GAME_MENU_LAYER_TAG, LayerPolicy::passthrough()),
            LayerDef::new(MENU_LAYER_TAG, LayerPolicy::modal()),
            LayerDef::new(MODAL_LAYER_TAG, LayerPolicy::modal()),
        ]
    }
}
