//! Capability traits for layer widgets
//!
//! Widgets opt into behaviors by overriding the defaulted methods instead of
//! inheriting from a base widget.

use crate::data::{FocusTarget, WidgetClass};
use crate::theme::Theme;
use anyhow::Result;
use std::any::Any;

/// Trait every widget pushed onto a layer implements
pub trait LayerWidget {
    /// Element that should receive focus when this widget becomes the input target
    fn desired_focus_target(&self) -> Option<FocusTarget> {
        None
    }

    /// Restyle with the layout's current theme
    fn apply_theme(&mut self, _theme: &Theme) {}

    /// Became the top of its layer
    fn on_activated(&mut self) {}

    /// Covered by a newer widget, or about to be removed
    fn on_deactivated(&mut self) {}

    /// Popped or torn down; the widget will not be activated again
    fn on_removed(&mut self) {}

    /// Downcast to concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Builds widget instances from loaded classes
pub trait WidgetFactory {
    fn construct(&self, class: &WidgetClass) -> Result<Box<dyn LayerWidget>>;
}

impl<F> WidgetFactory for F
where
    F: Fn(&WidgetClass) -> Result<Box<dyn LayerWidget>>,
{
    fn construct(&self, class: &WidgetClass) -> Result<Box<dyn LayerWidget>> {
        self(class)
    }
}
