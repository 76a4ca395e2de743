//! Configurable stand-in widget
//!
//! One struct covers every widget variant the catalog can describe; behavior
//! that differs per variant (default focus, theme color) dispatches on `WidgetKind`.

use super::traits::LayerWidget;
use crate::data::{FocusTarget, WidgetClass};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::trace;

/// Widget variants with their own focus and theming behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Generic panel, no focusable content
    #[default]
    Panel,
    /// In-world overlay (health bars, reticle), never takes focus
    Hud,
    /// List of selectable entries
    Menu,
    /// Confirmation dialog
    Prompt,
}

impl WidgetKind {
    fn default_focus(&self) -> Option<&'static str> {
        match self {
            WidgetKind::Panel | WidgetKind::Hud => None,
            WidgetKind::Menu => Some("first_entry"),
            WidgetKind::Prompt => Some("confirm_button"),
        }
    }

    fn background_color_key(&self) -> &'static str {
        match self {
            WidgetKind::Panel | WidgetKind::Hud => "panel_background",
            WidgetKind::Menu => "menu_background",
            WidgetKind::Prompt => "modal_background",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BasicWidget {
    class: WidgetClass,
    kind: WidgetKind,
    focus_override: Option<FocusTarget>,
    theme_name: Option<String>,
    background: Option<String>,
    activations: u32,
    deactivations: u32,
    removed: bool,
}

impl BasicWidget {
    pub fn new(class: WidgetClass, kind: WidgetKind) -> Self {
        Self {
            class,
            kind,
            focus_override: None,
            theme_name: None,
            background: None,
            activations: 0,
            deactivations: 0,
            removed: false,
        }
    }

    pub fn with_focus_target(mut self, target: FocusTarget) -> Self {
        self.focus_override = Some(target);
        self
    }

    pub fn class(&self) -> &WidgetClass {
        &self.class
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Name of the last theme applied
    pub fn theme_name(&self) -> Option<&str> {
        self.theme_name.as_deref()
    }

    /// Background color picked from the last theme
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn activation_count(&self) -> u32 {
        self.activations
    }

    pub fn deactivation_count(&self) -> u32 {
        self.deactivations
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

impl LayerWidget for BasicWidget {
    fn desired_focus_target(&self) -> Option<FocusTarget> {
        self.focus_override
            .clone()
            .or_else(|| self.kind.default_focus().map(FocusTarget::new))
    }

    fn apply_theme(&mut self, theme: &Theme) {
        self.theme_name = Some(theme.name.clone());
        self.background = theme
            .color(self.kind.background_color_key())
            .map(str::to_string);
    }

    fn on_activated(&mut self) {
        self.activations += 1;
        trace!(class = %self.class, "widget activated");
    }

    fn on_deactivated(&mut self) {
        self.deactivations += 1;
        trace!(class = %self.class, "widget deactivated");
    }

    fn on_removed(&mut self) {
        self.removed = true;
        trace!(class = %self.class, "widget removed");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
