//! Ordered widget stack for one layer
//!
//! The last entry is the top: the only widget on the layer that is active.
//! Pushing suspends the previous top, popping resumes the new top. Only the
//! owning layout mutates a stack, so push/pop are crate-private.

use crate::data::{ActivationState, LayerId, LayerPolicy, WidgetHandle, WidgetId};
use tracing::debug;

#[derive(Debug)]
pub struct WidgetStack {
    layer: LayerId,
    policy: LayerPolicy,
    entries: Vec<WidgetHandle>,
}

impl WidgetStack {
    pub fn new(layer: LayerId, policy: LayerPolicy) -> Self {
        Self {
            layer,
            policy,
            entries: Vec::new(),
        }
    }

    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn policy(&self) -> LayerPolicy {
        self.policy
    }

    /// Topmost (active) widget
    pub fn top(&self) -> Option<&WidgetHandle> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Widgets from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &WidgetHandle> {
        self.entries.iter()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.entries.iter().any(|h| h.id() == id)
    }

    pub(crate) fn push(&mut self, handle: WidgetHandle) {
        if let Some(previous) = self.entries.last() {
            previous.set_activation(ActivationState::Suspended);
        }
        handle.set_activation(ActivationState::Active);
        debug!(
            target: "layerstack::layout",
            layer = %self.layer,
            widget = %handle.id(),
            class = %handle.class(),
            depth = self.entries.len() + 1,
            "pushed widget"
        );
        self.entries.push(handle);
    }

    pub(crate) fn pop(&mut self) -> Option<WidgetHandle> {
        let top = self.entries.pop()?;
        top.set_activation(ActivationState::Removed);
        if let Some(new_top) = self.entries.last() {
            new_top.set_activation(ActivationState::Active);
        }
        debug!(
            target: "layerstack::layout",
            layer = %self.layer,
            widget = %top.id(),
            depth = self.entries.len(),
            "popped widget"
        );
        Some(top)
    }

    /// Remove this exact widget wherever it sits; removing the top resumes the
    /// new top. Handles from other stacks never match, even with an equal id.
    pub(crate) fn remove(&mut self, handle: &WidgetHandle) -> Option<WidgetHandle> {
        let index = self.entries.iter().position(|h| h.ptr_eq(handle))?;
        if index + 1 == self.entries.len() {
            return self.pop();
        }
        let removed = self.entries.remove(index);
        removed.set_activation(ActivationState::Removed);
        debug!(
            target: "layerstack::layout",
            layer = %self.layer,
            widget = %removed.id(),
            "removed covered widget"
        );
        Some(removed)
    }

    /// Remove every widget, top first
    pub(crate) fn clear(&mut self) -> Vec<WidgetHandle> {
        let mut removed = Vec::with_capacity(self.entries.len());
        while let Some(handle) = self.entries.pop() {
            handle.set_activation(ActivationState::Removed);
            removed.push(handle);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Priority, RequestingSubsystem, WidgetClass};
    use crate::widgets::{BasicWidget, WidgetKind};

    fn handle(id: u64, class: &str) -> WidgetHandle {
        let class = WidgetClass::new(class);
        WidgetHandle::new(
            WidgetId(id),
            LayerId::menu(),
            class.clone(),
            Priority::Normal,
            RequestingSubsystem::new("Core"),
            Box::new(BasicWidget::new(class, WidgetKind::Menu)),
        )
    }

    #[test]
    fn test_push_suspends_previous_top() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        let first = handle(1, "Settings");
        let second = handle(2, "Audio");

        stack.push(first.clone());
        assert!(first.is_active());

        stack.push(second.clone());
        assert_eq!(first.activation(), ActivationState::Suspended);
        assert!(second.is_active());
        assert_eq!(stack.top(), Some(&second));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_pop_resumes_new_top() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        let first = handle(1, "Settings");
        let second = handle(2, "Audio");
        stack.push(first.clone());
        stack.push(second.clone());

        let popped = stack.pop();
        assert_eq!(popped.as_ref(), Some(&second));
        assert_eq!(second.activation(), ActivationState::Removed);
        assert!(first.is_active());

        assert_eq!(stack.pop(), Some(first));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_lifo_over_mixed_sequence() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        let mut expected: Vec<WidgetHandle> = Vec::new();
        let ops = [true, true, false, true, true, true, false, false, true, false];

        for (i, push) in ops.iter().enumerate() {
            if *push {
                let h = handle(i as u64, "Page");
                stack.push(h.clone());
                expected.push(h);
            } else {
                assert_eq!(stack.pop(), expected.pop());
            }
            assert_eq!(stack.top(), expected.last());
            let active = stack.iter().filter(|h| h.is_active()).count();
            assert_eq!(active, usize::from(!expected.is_empty()));
        }
    }

    #[test]
    fn test_remove_covered_widget_keeps_top_active() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        let bottom = handle(1, "Settings");
        let top = handle(2, "Audio");
        stack.push(bottom.clone());
        stack.push(top.clone());

        assert_eq!(stack.remove(&bottom), Some(bottom.clone()));
        assert_eq!(bottom.activation(), ActivationState::Removed);
        assert!(top.is_active());
        assert!(!stack.contains(WidgetId(1)));
        assert_eq!(stack.remove(&handle(99, "Missing")), None);
    }

    #[test]
    fn test_remove_ignores_foreign_handle_with_same_id() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        let ours = handle(1, "Settings");
        stack.push(ours.clone());

        let foreign = handle(1, "OldMenu");
        assert_eq!(stack.remove(&foreign), None);
        assert!(ours.is_active());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_clear_removes_top_first() {
        let mut stack = WidgetStack::new(LayerId::menu(), LayerPolicy::modal());
        stack.push(handle(1, "Settings"));
        stack.push(handle(2, "Audio"));

        let removed = stack.clear();
        let ids: Vec<_> = removed.iter().map(|h| h.id().0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(removed
            .iter()
            .all(|h| h.activation() == ActivationState::Removed));
        assert!(stack.is_empty());
    }
}
