//! Layer registry - declared layers and the stacks bound to them
//!
//! Built once while a layout initializes: every declared layer gets exactly
//! one stack bound, then the registry is sealed. Sealing with unbound layers
//! is a configuration error. No bindings change after sealing.

use super::error::LayoutError;
use super::widget_stack::WidgetStack;
use crate::data::{LayerDef, LayerId};
use std::collections::HashMap;

#[derive(Debug)]
pub struct LayerRegistry {
    declared: Vec<LayerDef>,
    /// Bound stacks, index-aligned with `declared`
    slots: Vec<Option<WidgetStack>>,
    index: HashMap<LayerId, usize>,
    sealed: bool,
}

impl LayerRegistry {
    /// Create a registry for the given layers (bottom to top). Duplicate
    /// declarations keep the first occurrence.
    pub fn new(declared: Vec<LayerDef>) -> Self {
        let mut index = HashMap::new();
        let mut unique = Vec::with_capacity(declared.len());
        for def in declared {
            if index.contains_key(&def.id) {
                continue;
            }
            index.insert(def.id.clone(), unique.len());
            unique.push(def);
        }
        let slots = unique.iter().map(|_| None).collect();
        Self {
            declared: unique,
            slots,
            index,
            sealed: false,
        }
    }

    pub fn declared(&self) -> &[LayerDef] {
        &self.declared
    }

    pub fn is_declared(&self, layer: &LayerId) -> bool {
        self.index.contains_key(layer)
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Bind a stack to its declared layer
    pub fn register(&mut self, stack: WidgetStack) -> Result<(), LayoutError> {
        let layer = stack.layer().clone();
        if self.sealed {
            return Err(LayoutError::RegistrySealed(layer));
        }
        let slot = self
            .index
            .get(&layer)
            .copied()
            .ok_or_else(|| LayoutError::UnknownLayer(layer.clone()))?;
        if self.slots[slot].is_some() {
            return Err(LayoutError::DuplicateLayer(layer));
        }
        self.slots[slot] = Some(stack);
        Ok(())
    }

    /// Declared layers that have no stack yet
    pub fn unbound(&self) -> Vec<LayerId> {
        self.declared
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(def, _)| def.id.clone())
            .collect()
    }

    /// Finish initialization. Fails if any declared layer is unbound.
    pub fn seal(&mut self) -> Result<(), LayoutError> {
        let missing = self.unbound();
        if !missing.is_empty() {
            return Err(LayoutError::Configuration { missing });
        }
        self.sealed = true;
        Ok(())
    }

    pub fn resolve(&self, layer: &LayerId) -> Result<&WidgetStack, LayoutError> {
        self.index
            .get(layer)
            .and_then(|&slot| self.slots[slot].as_ref())
            .ok_or_else(|| LayoutError::UnknownLayer(layer.clone()))
    }

    pub(crate) fn resolve_mut(&mut self, layer: &LayerId) -> Result<&mut WidgetStack, LayoutError> {
        match self.index.get(layer) {
            Some(&slot) => self.slots[slot]
                .as_mut()
                .ok_or_else(|| LayoutError::UnknownLayer(layer.clone())),
            None => Err(LayoutError::UnknownLayer(layer.clone())),
        }
    }

    /// Bound stacks, bottom layer first
    pub fn stacks(&self) -> impl DoubleEndedIterator<Item = &WidgetStack> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub(crate) fn stacks_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut WidgetStack> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}
