//! Widget identity and handle types
//!
//! A `WidgetHandle` is the strong reference a layer stack holds to a live
//! widget. Anything outside the stack that wants to observe a widget should
//! keep a `WeakWidgetHandle` and upgrade it on use.

use super::layer::LayerId;
use crate::theme::Theme;
use crate::widgets::LayerWidget;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Ordering hint for pushes onto the same layer
///
/// The stack stays LIFO; priority only decides which of two competing async
/// pushes to the same layer wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Parse a priority name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defines a cheaply clonable string newtype with serde, Display and From impls
macro_rules! shared_name {
    ($(#[$meta:meta])* $name:ident, $getter:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            pub fn $getter(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

shared_name!(
    /// A loaded widget type the factory knows how to instantiate
    WidgetClass,
    name
);

shared_name!(
    /// Deferred reference to a widget class, resolved asynchronously
    SoftClassRef,
    path
);

shared_name!(
    /// Identity of the subsystem (plugin) that asked for a push
    RequestingSubsystem,
    name
);

/// Unique id of a widget instance within one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element inside a widget that should receive keyboard/gamepad focus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FocusTarget(pub String);

impl FocusTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Lifecycle of a widget instance inside a layer stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    /// Constructed, not yet pushed
    Inactive,
    /// Top of its stack
    Active,
    /// Covered by a newer widget on the same layer
    Suspended,
    /// Popped or torn down
    Removed,
}

struct WidgetEntry {
    id: WidgetId,
    layer: LayerId,
    class: WidgetClass,
    priority: Priority,
    requester: RequestingSubsystem,
    state: Cell<ActivationState>,
    widget: RefCell<Box<dyn LayerWidget>>,
}

/// Strong reference to a live widget plus the request that created it
#[derive(Clone)]
pub struct WidgetHandle {
    inner: Rc<WidgetEntry>,
}

impl WidgetHandle {
    pub(crate) fn new(
        id: WidgetId,
        layer: LayerId,
        class: WidgetClass,
        priority: Priority,
        requester: RequestingSubsystem,
        widget: Box<dyn LayerWidget>,
    ) -> Self {
        Self {
            inner: Rc::new(WidgetEntry {
                id,
                layer,
                class,
                priority,
                requester,
                state: Cell::new(ActivationState::Inactive),
                widget: RefCell::new(widget),
            }),
        }
    }

    pub fn id(&self) -> WidgetId {
        self.inner.id
    }

    pub fn layer(&self) -> &LayerId {
        &self.inner.layer
    }

    pub fn class(&self) -> &WidgetClass {
        &self.inner.class
    }

    pub fn priority(&self) -> Priority {
        self.inner.priority
    }

    pub fn requester(&self) -> &RequestingSubsystem {
        &self.inner.requester
    }

    pub fn activation(&self) -> ActivationState {
        self.inner.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.activation() == ActivationState::Active
    }

    /// Ask the widget which element should take focus
    pub fn desired_focus_target(&self) -> Option<FocusTarget> {
        self.inner.widget.borrow().desired_focus_target()
    }

    /// Read-only access to the widget instance
    pub fn with_widget<R>(&self, f: impl FnOnce(&dyn LayerWidget) -> R) -> R {
        f(self.inner.widget.borrow().as_ref())
    }

    pub fn downgrade(&self) -> WeakWidgetHandle {
        WeakWidgetHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &WidgetHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn apply_theme(&self, theme: &Theme) {
        self.inner.widget.borrow_mut().apply_theme(theme);
    }

    /// Move the widget to a new lifecycle state, firing the matching hooks
    pub(crate) fn set_activation(&self, next: ActivationState) {
        let previous = self.inner.state.replace(next);
        if previous == next {
            return;
        }

        let mut widget = self.inner.widget.borrow_mut();
        match next {
            ActivationState::Active => widget.on_activated(),
            ActivationState::Suspended => widget.on_deactivated(),
            ActivationState::Removed => {
                if previous == ActivationState::Active {
                    widget.on_deactivated();
                }
                widget.on_removed();
            }
            ActivationState::Inactive => {}
        }
    }
}

impl PartialEq for WidgetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetHandle")
            .field("id", &self.inner.id)
            .field("layer", &self.inner.layer)
            .field("class", &self.inner.class)
            .field("priority", &self.inner.priority)
            .field("requester", &self.inner.requester)
            .field("state", &self.inner.state.get())
            .finish()
    }
}

/// Non-owning reference for listener registries
#[derive(Clone)]
pub struct WeakWidgetHandle {
    inner: Weak<WidgetEntry>,
}

impl WeakWidgetHandle {
    pub fn upgrade(&self) -> Option<WidgetHandle> {
        self.inner.upgrade().map(|inner| WidgetHandle { inner })
    }

    /// True while a stack (or some caller) still holds the widget
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakWidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(handle) => write!(f, "WeakWidgetHandle({})", handle.id()),
            None => f.write_str("WeakWidgetHandle(<dropped>)"),
        }
    }
}
