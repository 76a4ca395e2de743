//! layerstack - layered widget stacks for game UIs
//!
//! A layout owns a fixed set of named layers (Game, GameMenu, Menu, Modal),
//! each a LIFO stack of widgets. Widgets are pushed synchronously from a
//! loaded class, or asynchronously from a soft class reference while player
//! input stays suspended.

pub mod config;
pub mod core;
pub mod data;
pub mod logging;
pub mod script;
pub mod theme;
pub mod widgets;

pub use crate::core::{LayoutController, LayoutError, LayoutServices, UiSubsystem};
pub use crate::data::{LayerDef, LayerId, Priority};
