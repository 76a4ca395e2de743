//! Data layer - identifiers and handles shared by the layout core
//!
//! This module contains the value types the layout core passes around:
//! layer tags, widget classes, priorities and the handles that wrap live widgets.
//! NO imports from core/ - the core builds on these, never the other way around.

pub mod layer;
pub mod widget;

pub use layer::*;
pub use widget::*;
