//! Widget catalog - classes the host knows how to build
//!
//! Acts as both collaborators a layout needs: the factory that turns a class
//! into a widget instance, and the resolver that turns a soft reference
//! (path) into a class. Classes come from the `[widgets]` config section.

use super::basic::{BasicWidget, WidgetKind};
use super::traits::{LayerWidget, WidgetFactory};
use crate::core::async_loader::{ClassResolver, ResolveFuture};
use crate::data::{FocusTarget, SoftClassRef, WidgetClass};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One widget class as declared in config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetClassDef {
    pub name: String,
    /// Soft reference path async pushes use; classes without one can only be pushed synchronously
    #[serde(default)]
    pub soft_path: Option<String>,
    #[serde(default)]
    pub kind: WidgetKind,
    #[serde(default)]
    pub focus_target: Option<String>,
}

impl WidgetClassDef {
    pub fn new(name: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            name: name.into(),
            soft_path: None,
            kind,
            focus_target: None,
        }
    }

    pub fn with_soft_path(mut self, path: impl Into<String>) -> Self {
        self.soft_path = Some(path.into());
        self
    }

    pub fn with_focus_target(mut self, target: impl Into<String>) -> Self {
        self.focus_target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct WidgetCatalog {
    classes: HashMap<String, WidgetClassDef>,
    /// soft path -> class name, shared with in-flight resolutions
    paths: Arc<HashMap<String, String>>,
    load_latency: Duration,
}

impl WidgetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: impl IntoIterator<Item = WidgetClassDef>) -> Self {
        let mut catalog = Self::new();
        for def in defs {
            catalog.register(def);
        }
        catalog
    }

    /// Simulated storage latency for async resolution
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Add or replace a class
    pub fn register(&mut self, def: WidgetClassDef) {
        if let Some(path) = &def.soft_path {
            Arc::make_mut(&mut self.paths).insert(path.clone(), def.name.clone());
        }
        self.classes.insert(def.name.clone(), def);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn get(&self, class: &str) -> Option<&WidgetClassDef> {
        self.classes.get(class)
    }

    /// Class a soft path resolves to, without waiting
    pub fn class_for_path(&self, path: &str) -> Option<WidgetClass> {
        self.paths.get(path).map(WidgetClass::new)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl WidgetFactory for WidgetCatalog {
    fn construct(&self, class: &WidgetClass) -> Result<Box<dyn LayerWidget>> {
        let Some(def) = self.classes.get(class.name()) else {
            bail!("widget class '{}' is not in the catalog", class);
        };
        let mut widget = BasicWidget::new(class.clone(), def.kind);
        if let Some(target) = &def.focus_target {
            widget = widget.with_focus_target(FocusTarget::new(target.as_str()));
        }
        Ok(Box::new(widget))
    }
}

impl ClassResolver for WidgetCatalog {
    fn resolve(&self, soft: &SoftClassRef) -> ResolveFuture {
        let paths = Arc::clone(&self.paths);
        let latency = self.load_latency;
        let path = soft.path().to_string();
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            paths
                .get(&path)
                .map(WidgetClass::new)
                .ok_or_else(|| anyhow!("no widget class at '{}'", path))
        })
    }
}
