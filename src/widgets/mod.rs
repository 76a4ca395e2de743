//! Widgets that live on layout layers
//!
//! The layout core only talks to widgets through the `LayerWidget` capability
//! trait. `BasicWidget` and `WidgetCatalog` are the concrete widget and
//! factory used by the CLI host and by tests; real hosts plug in their own.

pub mod basic;
pub mod catalog;
pub mod traits;

pub use basic::{BasicWidget, WidgetKind};
pub use catalog::{WidgetCatalog, WidgetClassDef};
pub use traits::{LayerWidget, WidgetFactory};
