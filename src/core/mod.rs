//! Layout core
//!
//! Layer registry, widget stacks, async class loading and the layout
//! controller that ties them together. No rendering or host-specific code;
//! hosts reach widgets through the traits in `widgets`.

pub mod async_loader;
pub mod error;
pub mod input_suspension;
pub mod layer_registry;
pub mod layout;
pub mod subsystem;
pub mod widget_stack;

pub use async_loader::{AsyncLoadCoordinator, ClassResolver, LoadId, ResolveFuture};
pub use error::LayoutError;
pub use input_suspension::{InputSink, InputSuspension, LoggingInputSink, SuspensionToken};
pub use layer_registry::LayerRegistry;
pub use layout::{
    AsyncPushOutcome, AsyncPushReport, AsyncPushRequest, AsyncPushResult, LayerLoadState,
    LayoutController, LayoutServices, LayoutSnapshot, LayoutStatus, PendingLoad, ToggleOutcome,
};
pub use subsystem::UiSubsystem;
pub use widget_stack::WidgetStack;
