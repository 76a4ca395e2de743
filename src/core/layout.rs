//! Primary game layout - the layer stacks of one player session
//!
//! `LayoutController` owns the layer registry, the async class loader and a
//! share of the session's input suspension. Lifecycle:
//!
//! 1. `new` - Uninitialized; layers are declared but unbound
//! 2. `register_layer` / `bind_declared_layers` - stacks bound
//! 3. `initialize` - Ready, or a configuration error if a layer is unbound
//! 4. `teardown` (or drop) - pending loads cancelled, suspensions released,
//!    every widget removed
//!
//! Each layer has at most one async load in flight and one queued behind it.
//! A new async push with priority >= the in-flight one supersedes it; a lower
//! one waits in the queue and is only applied if, once the in-flight load
//! resolves, the layer's top widget does not already outrank it.

use super::async_loader::{AsyncLoadCoordinator, ClassResolver, LoadContinuation, LoadId};
use super::error::LayoutError;
use super::input_suspension::{InputSuspension, SuspensionToken};
use super::layer_registry::LayerRegistry;
use super::widget_stack::WidgetStack;
use crate::data::{
    ActivationState, FocusTarget, LayerDef, LayerId, Priority, RequestingSubsystem, SoftClassRef,
    WidgetClass, WidgetHandle, WidgetId,
};
use crate::theme::Theme;
use crate::widgets::WidgetFactory;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Async push reports kept for `take_async_reports`
const MAX_ASYNC_REPORTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStatus {
    Uninitialized,
    Ready,
    TornDown,
}

/// Per-layer async state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerLoadState {
    Idle,
    AsyncLoadPending,
}

/// Parameters of an async push, kept while its class loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncPushRequest {
    pub layer: LayerId,
    pub soft_class: SoftClassRef,
    pub priority: Priority,
    pub requester: RequestingSubsystem,
    pub suspend_input: bool,
}

/// An async push whose class is loading
#[derive(Debug)]
pub struct PendingLoad {
    pub id: LoadId,
    pub request: AsyncPushRequest,
    suspension: Option<SuspensionToken>,
}

impl PendingLoad {
    /// Whether this load is holding player input suspended
    pub fn holds_input(&self) -> bool {
        self.suspension.is_some()
    }
}

/// An async push waiting behind a higher-priority load on the same layer
#[derive(Debug)]
struct QueuedPush {
    request: AsyncPushRequest,
    suspension: Option<SuspensionToken>,
}

#[derive(Debug, Default)]
struct LoadSlot {
    in_flight: Option<PendingLoad>,
    queued: Option<QueuedPush>,
}

impl LoadSlot {
    fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queued.is_none()
    }
}

/// What `push_widget_to_layer_async` did with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncPushOutcome {
    /// Class load started
    Started(LoadId),
    /// Waiting behind a higher-priority load on the same layer
    Queued,
    /// Outranked by both the in-flight and the queued request; dropped
    Rejected,
}

/// How an async push ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncPushResult {
    Pushed(WidgetId),
    Failed(LayoutError),
    /// Replaced by a newer request with priority >= its own
    Superseded,
    /// Queued request dropped: rejected, or the layer already held higher-priority content
    Discarded,
    /// Layout torn down while the load was pending
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncPushReport {
    pub layer: LayerId,
    pub soft_class: SoftClassRef,
    pub priority: Priority,
    pub result: AsyncPushResult,
}

/// Result of `toggle_widget_on_layer`
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Pushed(WidgetHandle),
    Popped(WidgetHandle),
}

/// Collaborators a layout needs from its host
pub struct LayoutServices {
    pub factory: Box<dyn WidgetFactory>,
    pub resolver: Box<dyn ClassResolver>,
    pub input: InputSuspension,
    pub theme: Theme,
}

impl LayoutServices {
    pub fn new(
        factory: Box<dyn WidgetFactory>,
        resolver: Box<dyn ClassResolver>,
        input: InputSuspension,
    ) -> Self {
        Self {
            factory,
            resolver,
            input,
            theme: Theme::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

/// State the load continuations run against
struct LayoutState {
    status: LayoutStatus,
    registry: LayerRegistry,
    factory: Box<dyn WidgetFactory>,
    theme: Theme,
    next_widget_id: u64,
    slots: HashMap<LayerId, LoadSlot>,
    reports: VecDeque<AsyncPushReport>,
}

impl LayoutState {
    fn ensure_ready(&self) -> Result<(), LayoutError> {
        match self.status {
            LayoutStatus::Ready => Ok(()),
            LayoutStatus::Uninitialized => Err(LayoutError::NotReady),
            LayoutStatus::TornDown => Err(LayoutError::TornDown),
        }
    }

    fn push_widget(
        &mut self,
        layer: &LayerId,
        class: WidgetClass,
        priority: Priority,
        requester: RequestingSubsystem,
    ) -> Result<WidgetHandle, LayoutError> {
        self.ensure_ready()?;
        self.registry.resolve(layer)?;

        let widget =
            self.factory
                .construct(&class)
                .map_err(|err| LayoutError::WidgetConstruction {
                    class: class.to_string(),
                    reason: format!("{:#}", err),
                })?;

        let id = WidgetId(self.next_widget_id);
        self.next_widget_id += 1;
        let handle = WidgetHandle::new(id, layer.clone(), class, priority, requester, widget);
        handle.apply_theme(&self.theme);

        self.registry.resolve_mut(layer)?.push(handle.clone());
        info!(
            target: "layerstack::layout",
            %layer,
            widget = %id,
            class = %handle.class(),
            %priority,
            requester = %handle.requester(),
            "pushed widget to layer"
        );
        Ok(handle)
    }

    fn report(&mut self, request: &AsyncPushRequest, result: AsyncPushResult) {
        if self.reports.len() == MAX_ASYNC_REPORTS {
            self.reports.pop_front();
        }
        self.reports.push_back(AsyncPushReport {
            layer: request.layer.clone(),
            soft_class: request.soft_class.clone(),
            priority: request.priority,
            result,
        });
    }

    /// Continuation of every async push
    fn finish_async_push(
        &mut self,
        layer: &LayerId,
        id: LoadId,
        result: Result<WidgetClass, LayoutError>,
    ) {
        let pending = self.slots.get_mut(layer).and_then(|slot| {
            match slot.in_flight.as_ref().map(|p| p.id) {
                Some(current) if current == id => slot.in_flight.take(),
                _ => None,
            }
        });
        let Some(pending) = pending else {
            warn!(target: "layerstack::layout", %layer, load = %id, "completion for a load this layout no longer tracks");
            return;
        };

        let request = &pending.request;
        let outcome = result.and_then(|class| {
            self.push_widget(
                &request.layer,
                class,
                request.priority,
                request.requester.clone(),
            )
        });
        match outcome {
            Ok(handle) => {
                info!(target: "layerstack::layout", %layer, load = %id, widget = %handle.id(), "async push completed");
                self.report(request, AsyncPushResult::Pushed(handle.id()));
            }
            Err(err) => {
                error!(
                    target: "layerstack::layout",
                    %layer,
                    load = %id,
                    class = %request.soft_class,
                    requester = %request.requester,
                    error = %err,
                    "async push failed; nothing pushed"
                );
                self.report(request, AsyncPushResult::Failed(err));
            }
        }
        // Dropping the pending load releases its input suspension
        drop(pending);
    }
}

pub struct LayoutController {
    state: LayoutState,
    loader: AsyncLoadCoordinator<LayoutState>,
    input: InputSuspension,
}

impl LayoutController {
    /// Create an uninitialized layout for the given layers (bottom to top)
    pub fn new(layers: Vec<LayerDef>, services: LayoutServices) -> Self {
        let LayoutServices {
            factory,
            resolver,
            input,
            theme,
        } = services;
        Self {
            state: LayoutState {
                status: LayoutStatus::Uninitialized,
                registry: LayerRegistry::new(layers),
                factory,
                theme,
                next_widget_id: 1,
                slots: HashMap::new(),
                reports: VecDeque::new(),
            },
            loader: AsyncLoadCoordinator::new(resolver),
            input,
        }
    }

    /// Create a layout, bind a stack to every declared layer and initialize it
    pub fn with_layers(layers: Vec<LayerDef>, services: LayoutServices) -> Result<Self, LayoutError> {
        let mut layout = Self::new(layers, services);
        layout.bind_declared_layers()?;
        layout.initialize()?;
        Ok(layout)
    }

    pub fn status(&self) -> LayoutStatus {
        self.state.status
    }

    pub fn is_ready(&self) -> bool {
        self.state.status == LayoutStatus::Ready
    }

    pub fn declared_layers(&self) -> &[LayerDef] {
        self.state.registry.declared()
    }

    /// Bind a stack to one declared layer. Only valid before `initialize`.
    pub fn register_layer(&mut self, stack: WidgetStack) -> Result<(), LayoutError> {
        if self.state.status == LayoutStatus::TornDown {
            return Err(LayoutError::TornDown);
        }
        let layer = stack.layer().clone();
        self.state.registry.register(stack)?;
        debug!(target: "layerstack::layout", %layer, "bound layer stack");
        Ok(())
    }

    /// Bind an empty stack to every declared layer that has none yet
    pub fn bind_declared_layers(&mut self) -> Result<(), LayoutError> {
        let unbound = self.state.registry.unbound();
        for layer in unbound {
            let policy = self
                .state
                .registry
                .declared()
                .iter()
                .find(|def| def.id == layer)
                .map(|def| def.policy)
                .unwrap_or_default();
            self.register_layer(WidgetStack::new(layer, policy))?;
        }
        Ok(())
    }

    /// Finish initialization. Every declared layer must be bound.
    pub fn initialize(&mut self) -> Result<(), LayoutError> {
        match self.state.status {
            LayoutStatus::Ready => return Ok(()),
            LayoutStatus::TornDown => return Err(LayoutError::TornDown),
            LayoutStatus::Uninitialized => {}
        }

        match self.state.registry.seal() {
            Ok(()) => {
                self.state.status = LayoutStatus::Ready;
                info!(
                    target: "layerstack::layout",
                    layers = self.state.registry.declared().len(),
                    "layout ready"
                );
                Ok(())
            }
            Err(err) => {
                error!(target: "layerstack::layout", error = %err, "layout initialization failed; layout is unusable");
                Err(err)
            }
        }
    }

    /// Construct a widget of `class` and push it on top of `layer`
    pub fn push_widget_to_layer(
        &mut self,
        layer: &LayerId,
        class: impl Into<WidgetClass>,
        priority: Priority,
        requester: impl Into<RequestingSubsystem>,
    ) -> Result<WidgetHandle, LayoutError> {
        self.state
            .push_widget(layer, class.into(), priority, requester.into())
    }

    /// Load `soft_class` asynchronously, then push it onto `layer`.
    ///
    /// With `suspend_input_until_complete`, player input stays suspended until
    /// the request ends, however it ends (pushed, failed, superseded, discarded
    /// or cancelled by teardown).
    pub fn push_widget_to_layer_async(
        &mut self,
        layer: &LayerId,
        soft_class: impl Into<SoftClassRef>,
        priority: Priority,
        requester: impl Into<RequestingSubsystem>,
        suspend_input_until_complete: bool,
    ) -> Result<AsyncPushOutcome, LayoutError> {
        self.state.ensure_ready()?;
        self.state.registry.resolve(layer)?;
        // Fail before the slot is touched so a running load is never retired
        self.loader.ensure_runtime()?;

        let request = AsyncPushRequest {
            layer: layer.clone(),
            soft_class: soft_class.into(),
            priority,
            requester: requester.into(),
            suspend_input: suspend_input_until_complete,
        };
        let suspension = suspend_input_until_complete.then(|| {
            self.input.acquire(format!(
                "async push of {} onto {}",
                request.soft_class, request.layer
            ))
        });

        let slot = self.state.slots.entry(layer.clone()).or_default();
        let mut retired = Vec::new();

        if let Some(current) = &slot.in_flight {
            if request.priority < current.request.priority {
                if let Some(queued) = &slot.queued {
                    if request.priority < queued.request.priority {
                        info!(
                            target: "layerstack::layout",
                            %layer,
                            class = %request.soft_class,
                            %priority,
                            "async push rejected; outranked by pending requests"
                        );
                        self.state.report(&request, AsyncPushResult::Discarded);
                        return Ok(AsyncPushOutcome::Rejected);
                    }
                }
                if let Some(replaced) = slot.queued.take() {
                    retired.push((replaced.request, AsyncPushResult::Discarded));
                }
                info!(
                    target: "layerstack::layout",
                    %layer,
                    class = %request.soft_class,
                    %priority,
                    "async push queued behind higher-priority load"
                );
                slot.queued = Some(QueuedPush {
                    request,
                    suspension,
                });
                for (old, result) in retired {
                    self.state.report(&old, result);
                }
                return Ok(AsyncPushOutcome::Queued);
            }
        }

        if let Some(superseded) = slot.in_flight.take() {
            self.loader.cancel(superseded.id);
            info!(
                target: "layerstack::layout",
                %layer,
                load = %superseded.id,
                class = %superseded.request.soft_class,
                by = %request.soft_class,
                "async push superseded"
            );
            retired.push((superseded.request, AsyncPushResult::Superseded));
        }
        if let Some(queued) = slot.queued.take() {
            retired.push((queued.request, AsyncPushResult::Superseded));
        }

        let started = Self::start_load(&mut self.loader, &request);
        let outcome = match started {
            Ok(id) => {
                info!(
                    target: "layerstack::layout",
                    %layer,
                    load = %id,
                    class = %request.soft_class,
                    %priority,
                    suspend_input = suspend_input_until_complete,
                    "async push started"
                );
                slot.in_flight = Some(PendingLoad {
                    id,
                    request,
                    suspension,
                });
                Ok(AsyncPushOutcome::Started(id))
            }
            Err(err) => Err(err),
        };
        for (old, result) in retired {
            self.state.report(&old, result);
        }
        outcome
    }

    fn start_load(
        loader: &mut AsyncLoadCoordinator<LayoutState>,
        request: &AsyncPushRequest,
    ) -> Result<LoadId, LayoutError> {
        let layer = request.layer.clone();
        let continuation: LoadContinuation<LayoutState> =
            Box::new(move |state: &mut LayoutState, id: LoadId, result| {
                state.finish_async_push(&layer, id, result)
            });
        loader.request_load(request.soft_class.clone(), continuation)
    }

    /// Start queued pushes whose layer no longer has a load in flight
    fn promote_queued_loads(&mut self) {
        let ready: Vec<LayerId> = self
            .state
            .slots
            .iter()
            .filter(|(_, slot)| slot.in_flight.is_none() && slot.queued.is_some())
            .map(|(layer, _)| layer.clone())
            .collect();

        for layer in ready {
            let Some(queued) = self
                .state
                .slots
                .get_mut(&layer)
                .and_then(|slot| slot.queued.take())
            else {
                continue;
            };

            let top_priority = self
                .state
                .registry
                .resolve(&layer)
                .ok()
                .and_then(|stack| stack.top().map(WidgetHandle::priority));
            if let Some(top) = top_priority {
                if top > queued.request.priority {
                    info!(
                        target: "layerstack::layout",
                        %layer,
                        class = %queued.request.soft_class,
                        queued_priority = %queued.request.priority,
                        top_priority = %top,
                        "queued async push dropped; layer already shows higher-priority content"
                    );
                    self.state
                        .report(&queued.request, AsyncPushResult::Discarded);
                    continue;
                }
            }

            match Self::start_load(&mut self.loader, &queued.request) {
                Ok(id) => {
                    debug!(target: "layerstack::layout", %layer, load = %id, "queued async push started");
                    let slot = self.state.slots.entry(layer).or_default();
                    slot.in_flight = Some(PendingLoad {
                        id,
                        request: queued.request,
                        suspension: queued.suspension,
                    });
                }
                Err(err) => {
                    error!(target: "layerstack::layout", %layer, error = %err, "could not start queued async push");
                    self.state
                        .report(&queued.request, AsyncPushResult::Failed(err));
                }
            }
        }
    }

    /// Pop the top widget of `layer`. Ok(false) if the layer is empty or unregistered.
    pub fn pop_widget_from_layer(&mut self, layer: &LayerId) -> Result<bool, LayoutError> {
        self.state.ensure_ready()?;
        match self.state.registry.resolve_mut(layer) {
            Ok(stack) => match stack.pop() {
                Some(handle) => {
                    info!(target: "layerstack::layout", %layer, widget = %handle.id(), class = %handle.class(), "popped widget from layer");
                    Ok(true)
                }
                None => {
                    debug!(target: "layerstack::layout", %layer, "pop on empty layer");
                    Ok(false)
                }
            },
            Err(_) => {
                warn!(target: "layerstack::layout", %layer, "pop on unregistered layer");
                Ok(false)
            }
        }
    }

    /// Pop the layer's active widget if it has one, otherwise push `class`
    pub fn toggle_widget_on_layer(
        &mut self,
        layer: &LayerId,
        class: impl Into<WidgetClass>,
        priority: Priority,
        requester: impl Into<RequestingSubsystem>,
    ) -> Result<ToggleOutcome, LayoutError> {
        self.state.ensure_ready()?;
        let stack = self.state.registry.resolve_mut(layer)?;
        match stack.pop() {
            Some(handle) => {
                info!(target: "layerstack::layout", %layer, widget = %handle.id(), "toggled widget off");
                Ok(ToggleOutcome::Popped(handle))
            }
            None => self
                .push_widget_to_layer(layer, class, priority, requester)
                .map(ToggleOutcome::Pushed),
        }
    }

    /// Remove a specific widget from its layer, wherever it sits in the stack
    pub fn remove_widget(&mut self, handle: &WidgetHandle) -> bool {
        if self.state.ensure_ready().is_err() {
            return false;
        }
        let removed = self
            .state
            .registry
            .resolve_mut(handle.layer())
            .ok()
            .and_then(|stack| stack.remove(handle));
        match removed {
            Some(widget) => {
                info!(target: "layerstack::layout", layer = %widget.layer(), widget = %widget.id(), "removed widget");
                true
            }
            None => false,
        }
    }

    pub fn get_layer_stack(&self, layer: &LayerId) -> Result<&WidgetStack, LayoutError> {
        self.state.registry.resolve(layer)
    }

    pub fn layer_load_state(&self, layer: &LayerId) -> Result<LayerLoadState, LayoutError> {
        self.state.registry.resolve(layer)?;
        let pending = self
            .state
            .slots
            .get(layer)
            .is_some_and(|slot| !slot.is_idle());
        Ok(if pending {
            LayerLoadState::AsyncLoadPending
        } else {
            LayerLoadState::Idle
        })
    }

    /// The load currently in flight for `layer`, if any
    pub fn pending_load(&self, layer: &LayerId) -> Option<&PendingLoad> {
        self.state
            .slots
            .get(layer)
            .and_then(|slot| slot.in_flight.as_ref())
    }

    /// Loads in flight across all layers
    pub fn pending_load_count(&self) -> usize {
        self.loader.pending_count()
    }

    pub fn input_suspension(&self) -> &InputSuspension {
        &self.input
    }

    /// Layers whose active widget can receive input, topmost first. The walk
    /// stops after the first modal layer that has an active widget.
    pub fn layers_receiving_input(&self) -> Vec<LayerId> {
        let mut layers = Vec::new();
        for stack in self.state.registry.stacks().rev() {
            if stack.top().is_none() {
                continue;
            }
            layers.push(stack.layer().clone());
            if stack.policy().modal {
                break;
            }
        }
        layers
    }

    /// True if a modal layer above `layer` has an active widget
    /// Unregistered layers are never blocked.
    pub fn is_layer_input_blocked(&self, layer: &LayerId) -> bool {
        if !self.state.registry.is_declared(layer) {
            return false;
        }
        for stack in self.state.registry.stacks().rev() {
            if stack.layer() == layer {
                return false;
            }
            if stack.policy().modal && stack.top().is_some() {
                return true;
            }
        }
        false
    }

    /// Topmost active widget across all layers
    pub fn input_target(&self) -> Option<WidgetHandle> {
        self.state
            .registry
            .stacks()
            .rev()
            .find_map(|stack| stack.top().cloned())
    }

    /// Focus target requested by the current input target
    pub fn desired_focus_target(&self) -> Option<FocusTarget> {
        self.input_target()?.desired_focus_target()
    }

    pub fn theme(&self) -> &Theme {
        &self.state.theme
    }

    /// Switch themes and restyle every live widget
    pub fn set_theme(&mut self, theme: Theme) {
        info!(target: "layerstack::layout", theme = %theme.name, "applying theme");
        self.state.theme = theme;
        for stack in self.state.registry.stacks() {
            for handle in stack.iter() {
                handle.apply_theme(&self.state.theme);
            }
        }
    }

    /// Run continuations of loads that already finished. Never blocks;
    /// meant to be called once per frame.
    pub fn process_completed_loads(&mut self) -> usize {
        let dispatched = self.loader.dispatch_ready(&mut self.state);
        self.promote_queued_loads();
        dispatched
    }

    /// Wait until no async push is in flight or queued, running continuations
    /// as loads finish.
    pub async fn wait_for_pending_loads(&mut self) -> usize {
        let mut dispatched = 0;
        loop {
            self.promote_queued_loads();
            if !self.loader.dispatch_next(&mut self.state).await {
                break;
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Drain the record of finished async pushes, oldest first
    pub fn take_async_reports(&mut self) -> Vec<AsyncPushReport> {
        self.state.reports.drain(..).collect()
    }

    /// Cancel pending loads, release input suspensions and remove every widget
    pub fn teardown(&mut self) {
        if self.state.status == LayoutStatus::TornDown {
            return;
        }

        let cancelled = self.loader.cancel_all();
        let slots: Vec<(LayerId, LoadSlot)> = self.state.slots.drain().collect();
        for (_, slot) in slots {
            if let Some(pending) = slot.in_flight {
                self.state
                    .report(&pending.request, AsyncPushResult::Cancelled);
            }
            if let Some(queued) = slot.queued {
                self.state
                    .report(&queued.request, AsyncPushResult::Cancelled);
            }
        }

        let mut removed = 0;
        for stack in self.state.registry.stacks_mut() {
            removed += stack.clear().len();
        }
        self.state.status = LayoutStatus::TornDown;
        info!(
            target: "layerstack::layout",
            cancelled_loads = cancelled,
            removed_widgets = removed,
            "layout torn down"
        );
    }

    /// Serializable view of the layout
    pub fn snapshot(&self) -> LayoutSnapshot {
        let layers = self
            .state
            .registry
            .stacks()
            .map(|stack| {
                let layer = stack.layer().clone();
                let pending = self.pending_load(&layer).map(|p| PendingSnapshot {
                    class: p.request.soft_class.clone(),
                    priority: p.request.priority,
                    requester: p.request.requester.clone(),
                    holds_input: p.holds_input(),
                });
                let queued = self
                    .state
                    .slots
                    .get(&layer)
                    .and_then(|slot| slot.queued.as_ref())
                    .map(|q| PendingSnapshot {
                        class: q.request.soft_class.clone(),
                        priority: q.request.priority,
                        requester: q.request.requester.clone(),
                        holds_input: q.suspension.is_some(),
                    });
                LayerSnapshot {
                    modal: stack.policy().modal,
                    load_state: self
                        .layer_load_state(&layer)
                        .unwrap_or(LayerLoadState::Idle),
                    input_blocked: self.is_layer_input_blocked(&layer),
                    widgets: stack
                        .iter()
                        .map(|h| WidgetSnapshot {
                            id: h.id(),
                            class: h.class().clone(),
                            priority: h.priority(),
                            requester: h.requester().clone(),
                            state: h.activation(),
                        })
                        .collect(),
                    pending,
                    queued,
                    id: layer,
                }
            })
            .collect();

        LayoutSnapshot {
            status: self.state.status,
            layers,
            input_suspensions: self.input.count(),
            input_target: self.input_target().map(|h| h.id()),
            focus_target: self.desired_focus_target(),
        }
    }
}

impl Drop for LayoutController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for LayoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutController")
            .field("status", &self.state.status)
            .field("registry", &self.state.registry)
            .field("loader", &self.loader)
            .field("input", &self.input)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutSnapshot {
    pub status: LayoutStatus,
    pub layers: Vec<LayerSnapshot>,
    pub input_suspensions: usize,
    pub input_target: Option<WidgetId>,
    pub focus_target: Option<FocusTarget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSnapshot {
    pub id: LayerId,
    pub modal: bool,
    pub load_state: LayerLoadState,
    pub input_blocked: bool,
    pub widgets: Vec<WidgetSnapshot>,
    pub pending: Option<PendingSnapshot>,
    pub queued: Option<PendingSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    pub id: WidgetId,
    pub class: WidgetClass,
    pub priority: Priority,
    pub requester: RequestingSubsystem,
    pub state: ActivationState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingSnapshot {
    pub class: SoftClassRef,
    pub priority: Priority,
    pub requester: RequestingSubsystem,
    pub holds_input: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::async_loader::tests::{GatedResolver, PanickingResolver};
    use crate::core::input_suspension::tests::CountingSink;
    use crate::data::LayerPolicy;
    use crate::theme::ThemePresets;
    use crate::widgets::{BasicWidget, LayerWidget, WidgetKind};
    use anyhow::{bail, Result};

    fn test_factory(class: &WidgetClass) -> Result<Box<dyn LayerWidget>> {
        let kind = match class.name() {
            "Broken" => bail!("no blueprint for Broken"),
            "Hud" => WidgetKind::Hud,
            "QuitPrompt" | "ErrorPrompt" => WidgetKind::Prompt,
            _ => WidgetKind::Menu,
        };
        Ok(Box::new(BasicWidget::new(class.clone(), kind)))
    }

    struct Fixture {
        layout: LayoutController,
        resolver: GatedResolver,
        input: InputSuspension,
        sink: CountingSink,
    }

    fn services(resolver: &GatedResolver, input: &InputSuspension) -> LayoutServices {
        LayoutServices::new(
            Box::new(test_factory),
            Box::new(resolver.clone()),
            input.clone(),
        )
    }

    fn fixture() -> Fixture {
        let resolver = GatedResolver::default();
        let sink = CountingSink::default();
        let input = InputSuspension::new(sink.clone());
        let layout =
            LayoutController::with_layers(LayerDef::standard_layers(), services(&resolver, &input))
                .unwrap();
        Fixture {
            layout,
            resolver,
            input,
            sink,
        }
    }

    fn top_class(layout: &LayoutController, layer: &LayerId) -> Option<String> {
        layout
            .get_layer_stack(layer)
            .unwrap()
            .top()
            .map(|h| h.class().name().to_string())
    }

    #[test]
    fn test_pause_menu_push_then_pop() {
        let mut f = fixture();
        let game_menu = LayerId::game_menu();

        let handle = f
            .layout
            .push_widget_to_layer(&game_menu, "PauseMenu", Priority::Normal, "Core")
            .unwrap();
        let stack = f.layout.get_layer_stack(&game_menu).unwrap();
        assert_eq!(stack.top(), Some(&handle));
        assert_eq!(handle.class(), &WidgetClass::new("PauseMenu"));
        assert_eq!(handle.requester(), &RequestingSubsystem::new("Core"));
        assert!(handle.is_active());

        assert_eq!(f.layout.pop_widget_from_layer(&game_menu), Ok(true));
        assert!(f.layout.get_layer_stack(&game_menu).unwrap().is_empty());
        assert_eq!(handle.activation(), ActivationState::Removed);
    }

    #[test]
    fn test_push_then_pop_restores_previous_top() {
        let mut f = fixture();
        let menu = LayerId::menu();
        let mut expected: Vec<String> = Vec::new();

        for (i, push) in [true, true, true, false, true, false, false, true, false, false]
            .iter()
            .enumerate()
        {
            if *push {
                let class = format!("Page{}", i);
                f.layout
                    .push_widget_to_layer(&menu, class.as_str(), Priority::Normal, "Core")
                    .unwrap();
                expected.push(class);
            } else {
                let had_top = !expected.is_empty();
                expected.pop();
                assert_eq!(f.layout.pop_widget_from_layer(&menu), Ok(had_top));
            }
            assert_eq!(top_class(&f.layout, &menu), expected.last().cloned());
        }
    }

    #[test]
    fn test_pop_on_empty_or_unregistered_layer_is_soft() {
        let mut f = fixture();
        f.layout
            .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
            .unwrap();
        let before = serde_json::to_value(f.layout.snapshot()).unwrap();

        assert_eq!(f.layout.pop_widget_from_layer(&LayerId::modal()), Ok(false));
        assert_eq!(
            f.layout
                .pop_widget_from_layer(&LayerId::new("UI.Layer.Nowhere")),
            Ok(false)
        );

        let after = serde_json::to_value(f.layout.snapshot()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_layer_push_is_typed_failure() {
        let mut f = fixture();
        let nowhere = LayerId::new("UI.Layer.Nowhere");
        assert_eq!(
            f.layout
                .push_widget_to_layer(&nowhere, "PauseMenu", Priority::High, "Core")
                .unwrap_err(),
            LayoutError::UnknownLayer(nowhere.clone())
        );
        assert!(matches!(
            f.layout.get_layer_stack(&nowhere),
            Err(LayoutError::UnknownLayer(_))
        ));
        assert!(f
            .layout
            .snapshot()
            .layers
            .iter()
            .all(|l| l.widgets.is_empty()));
    }

    #[test]
    fn test_operations_before_initialize_fail_not_ready() {
        let resolver = GatedResolver::default();
        let input = InputSuspension::new(CountingSink::default());
        let mut layout =
            LayoutController::new(LayerDef::standard_layers(), services(&resolver, &input));
        layout
            .register_layer(WidgetStack::new(LayerId::game(), LayerPolicy::passthrough()))
            .unwrap();

        assert_eq!(layout.status(), LayoutStatus::Uninitialized);
        assert_eq!(
            layout
                .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
                .unwrap_err(),
            LayoutError::NotReady
        );
        assert_eq!(
            layout.pop_widget_from_layer(&LayerId::game()),
            Err(LayoutError::NotReady)
        );
        assert_eq!(
            layout.push_widget_to_layer_async(
                &LayerId::game(),
                "/UI/Hud",
                Priority::Normal,
                "Core",
                true
            ),
            Err(LayoutError::NotReady)
        );
        assert_eq!(input.count(), 0);

        let err = layout.initialize().unwrap_err();
        assert!(matches!(err, LayoutError::Configuration { ref missing } if missing.len() == 3));
        assert_eq!(layout.status(), LayoutStatus::Uninitialized);

        layout.bind_declared_layers().unwrap();
        layout.initialize().unwrap();
        assert!(layout.is_ready());
        assert_eq!(
            layout.register_layer(WidgetStack::new(LayerId::game(), LayerPolicy::default())),
            Err(LayoutError::RegistrySealed(LayerId::game()))
        );
    }

    #[test]
    fn test_construction_failure_leaves_stack_unchanged() {
        let mut f = fixture();
        let err = f
            .layout
            .push_widget_to_layer(&LayerId::menu(), "Broken", Priority::Normal, "Core")
            .unwrap_err();
        assert!(matches!(err, LayoutError::WidgetConstruction { .. }));
        assert!(f.layout.get_layer_stack(&LayerId::menu()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_higher_priority_async_push_supersedes() {
        let mut f = fixture();
        let modal = LayerId::modal();

        let first = f
            .layout
            .push_widget_to_layer_async(&modal, "/UI/Low", Priority::Normal, "PluginA", true)
            .unwrap();
        let second = f
            .layout
            .push_widget_to_layer_async(&modal, "/UI/High", Priority::High, "PluginB", true)
            .unwrap();
        assert!(matches!(first, AsyncPushOutcome::Started(_)));
        assert!(matches!(second, AsyncPushOutcome::Started(_)));
        assert_eq!(f.input.count(), 1, "superseded request released its suspension");
        assert_eq!(f.layout.pending_load_count(), 1);

        f.resolver.succeed("/UI/Low", "LowPrompt");
        f.resolver.succeed("/UI/High", "QuitPrompt");
        assert_eq!(f.layout.wait_for_pending_loads().await, 1);

        let stack = f.layout.get_layer_stack(&modal).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(top_class(&f.layout, &modal).as_deref(), Some("QuitPrompt"));
        assert_eq!(f.input.count(), 0);

        let results: Vec<_> = f
            .layout
            .take_async_reports()
            .into_iter()
            .map(|r| (r.soft_class.path().to_string(), r.result))
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("/UI/Low".to_string(), AsyncPushResult::Superseded));
        assert!(matches!(results[1], (ref path, AsyncPushResult::Pushed(_)) if path == "/UI/High"));
    }

    #[tokio::test]
    async fn test_equal_priority_async_push_replaces_in_flight() {
        let mut f = fixture();
        let menu = LayerId::menu();
        f.layout
            .push_widget_to_layer_async(&menu, "/UI/First", Priority::Normal, "Core", false)
            .unwrap();
        f.layout
            .push_widget_to_layer_async(&menu, "/UI/Second", Priority::Normal, "Core", false)
            .unwrap();

        f.resolver.succeed("/UI/First", "First");
        f.resolver.succeed("/UI/Second", "Second");
        f.layout.wait_for_pending_loads().await;
        assert_eq!(top_class(&f.layout, &menu).as_deref(), Some("Second"));
        assert_eq!(f.layout.get_layer_stack(&menu).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lower_priority_request_is_dropped_when_outranked() {
        let mut f = fixture();
        let menu = LayerId::menu();

        f.layout
            .push_widget_to_layer_async(&menu, "/UI/Settings", Priority::High, "Core", true)
            .unwrap();
        let queued = f
            .layout
            .push_widget_to_layer_async(&menu, "/UI/Tips", Priority::Low, "PluginX", true)
            .unwrap();
        assert_eq!(queued, AsyncPushOutcome::Queued);
        assert_eq!(f.input.count(), 2);
        assert_eq!(
            f.layout.layer_load_state(&menu),
            Ok(LayerLoadState::AsyncLoadPending)
        );

        f.resolver.succeed("/UI/Settings", "Settings");
        f.layout.wait_for_pending_loads().await;

        assert_eq!(top_class(&f.layout, &menu).as_deref(), Some("Settings"));
        assert_eq!(f.layout.get_layer_stack(&menu).unwrap().len(), 1);
        assert_eq!(f.layout.layer_load_state(&menu), Ok(LayerLoadState::Idle));
        assert_eq!(f.input.count(), 0);
        assert_eq!(f.resolver.waiting(), 0, "queued request never started a load");

        let results: Vec<_> = f
            .layout
            .take_async_reports()
            .into_iter()
            .map(|r| r.result)
            .collect();
        assert!(matches!(results[0], AsyncPushResult::Pushed(_)));
        assert_eq!(results[1], AsyncPushResult::Discarded);
    }

    #[tokio::test]
    async fn test_queued_request_runs_after_higher_priority_failure() {
        let mut f = fixture();
        let menu = LayerId::menu();

        f.layout
            .push_widget_to_layer_async(&menu, "/UI/Settings", Priority::High, "Core", true)
            .unwrap();
        f.layout
            .push_widget_to_layer_async(&menu, "/UI/Tips", Priority::Low, "PluginX", true)
            .unwrap();

        f.resolver.fail("/UI/Settings", "asset missing");
        f.resolver.succeed("/UI/Tips", "Tips");
        f.layout.wait_for_pending_loads().await;

        assert_eq!(top_class(&f.layout, &menu).as_deref(), Some("Tips"));
        assert_eq!(f.input.count(), 0);
    }

    #[tokio::test]
    async fn test_lowest_request_rejected_behind_queue() {
        let mut f = fixture();
        let menu = LayerId::menu();

        f.layout
            .push_widget_to_layer_async(&menu, "/UI/A", Priority::Critical, "Core", true)
            .unwrap();
        assert_eq!(
            f.layout
                .push_widget_to_layer_async(&menu, "/UI/B", Priority::Normal, "Core", true)
                .unwrap(),
            AsyncPushOutcome::Queued
        );
        assert_eq!(
            f.layout
                .push_widget_to_layer_async(&menu, "/UI/C", Priority::Low, "Core", true)
                .unwrap(),
            AsyncPushOutcome::Rejected
        );
        assert_eq!(f.input.count(), 2, "rejected request does not hold input");

        f.layout.teardown();
        assert_eq!(f.input.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_modal_load_releases_input() {
        let mut f = fixture();
        let modal = LayerId::modal();

        let outcome = f
            .layout
            .push_widget_to_layer_async(&modal, "/UI/Broken", Priority::High, "PluginX", true)
            .unwrap();
        assert!(matches!(outcome, AsyncPushOutcome::Started(_)));
        assert!(f.input.is_suspended());
        assert_eq!(f.sink.suspends.get(), 1);
        assert!(f.layout.pending_load(&modal).is_some_and(PendingLoad::holds_input));

        f.resolver.fail("/UI/Broken", "soft reference does not resolve");
        f.layout.wait_for_pending_loads().await;

        assert!(f.layout.get_layer_stack(&modal).unwrap().is_empty());
        assert!(!f.input.is_suspended());
        assert_eq!(f.sink.resumes.get(), 1);

        let reports = f.layout.take_async_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].result,
            AsyncPushResult::Failed(LayoutError::LoadFailed {
                class: "/UI/Broken".to_string(),
                reason: "soft reference does not resolve".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_panicking_load_fails_and_releases_input() {
        let input = InputSuspension::new(CountingSink::default());
        let services = LayoutServices::new(
            Box::new(test_factory),
            Box::new(PanickingResolver),
            input.clone(),
        );
        let mut layout =
            LayoutController::with_layers(LayerDef::standard_layers(), services).unwrap();
        let modal = LayerId::modal();

        let outcome = layout
            .push_widget_to_layer_async(&modal, "/UI/Cursed", Priority::High, "PluginX", true)
            .unwrap();
        assert!(matches!(outcome, AsyncPushOutcome::Started(_)));
        assert_eq!(input.count(), 1);

        assert_eq!(layout.wait_for_pending_loads().await, 1);
        assert_eq!(input.count(), 0);
        assert_eq!(layout.pending_load_count(), 0);
        assert_eq!(layout.layer_load_state(&modal), Ok(LayerLoadState::Idle));
        assert!(layout.get_layer_stack(&modal).unwrap().is_empty());

        let reports = layout.take_async_reports();
        assert_eq!(reports.len(), 1);
        assert!(matches!(
            &reports[0].result,
            AsyncPushResult::Failed(LayoutError::LoadFailed { class, .. }) if class == "/UI/Cursed"
        ));
    }

    #[test]
    fn test_supersede_outside_runtime_keeps_running_load() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let mut f = fixture();
        let modal = LayerId::modal();

        let first = rt
            .block_on(async {
                f.layout
                    .push_widget_to_layer_async(&modal, "/UI/Low", Priority::Normal, "PluginA", true)
            })
            .unwrap();
        let AsyncPushOutcome::Started(first_id) = first else {
            panic!("expected the first load to start");
        };
        assert_eq!(f.input.count(), 1);

        assert_eq!(
            f.layout.push_widget_to_layer_async(
                &modal,
                "/UI/High",
                Priority::High,
                "PluginB",
                true
            ),
            Err(LayoutError::NoAsyncRuntime)
        );
        let pending = f.layout.pending_load(&modal).unwrap();
        assert_eq!(pending.id, first_id);
        assert_eq!(pending.request.soft_class.path(), "/UI/Low");
        assert!(f.layout.take_async_reports().is_empty());
        assert_eq!(f.input.count(), 1);

        f.resolver.succeed("/UI/Low", "LowPrompt");
        assert_eq!(rt.block_on(f.layout.wait_for_pending_loads()), 1);
        assert_eq!(top_class(&f.layout, &modal).as_deref(), Some("LowPrompt"));
        assert_eq!(f.input.count(), 0);
    }

    #[tokio::test]
    async fn test_suspension_count_returns_to_zero() {
        for n in [0usize, 1, 3, 8] {
            let mut f = fixture();
            let layers: Vec<LayerId> = LayerDef::standard_layers()
                .into_iter()
                .map(|def| def.id)
                .collect();

            for i in 0..n {
                let path = format!("/UI/Load{}", i);
                f.layout
                    .push_widget_to_layer_async(
                        &layers[i % layers.len()],
                        path.as_str(),
                        Priority::ALL[i % Priority::ALL.len()],
                        "Core",
                        true,
                    )
                    .unwrap();
                if i % 2 == 0 {
                    f.resolver.succeed(&path, "Panel");
                } else {
                    f.resolver.fail(&path, "missing");
                }
            }

            f.layout.wait_for_pending_loads().await;
            assert_eq!(f.input.count(), 0, "n = {}", n);
            assert_eq!(f.sink.suspends.get(), f.sink.resumes.get(), "n = {}", n);
        }
    }

    #[tokio::test]
    async fn test_process_completed_loads_does_not_block() {
        let mut f = fixture();
        let game_menu = LayerId::game_menu();
        f.layout
            .push_widget_to_layer_async(&game_menu, "/UI/Inventory", Priority::Normal, "Core", false)
            .unwrap();
        assert_eq!(f.layout.process_completed_loads(), 0);

        f.resolver.succeed("/UI/Inventory", "Inventory");
        let mut dispatched = 0;
        for _ in 0..10 {
            tokio::task::yield_now().await;
            dispatched += f.layout.process_completed_loads();
            if dispatched > 0 {
                break;
            }
        }
        assert_eq!(dispatched, 1);
        assert_eq!(top_class(&f.layout, &game_menu).as_deref(), Some("Inventory"));
    }

    #[tokio::test]
    async fn test_teardown_cancels_loads_and_clears_layers() {
        let mut f = fixture();
        let hud = f
            .layout
            .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
            .unwrap();
        f.layout
            .push_widget_to_layer_async(&LayerId::modal(), "/UI/Quit", Priority::High, "Core", true)
            .unwrap();
        f.layout
            .push_widget_to_layer_async(&LayerId::menu(), "/UI/Settings", Priority::Normal, "Core", true)
            .unwrap();
        assert_eq!(f.input.count(), 2);

        f.layout.teardown();
        assert_eq!(f.layout.status(), LayoutStatus::TornDown);
        assert_eq!(f.layout.pending_load_count(), 0);
        assert_eq!(f.input.count(), 0);
        assert_eq!(hud.activation(), ActivationState::Removed);

        // Late completions must not touch the torn-down layout
        f.resolver.succeed("/UI/Quit", "QuitPrompt");
        assert_eq!(f.layout.wait_for_pending_loads().await, 0);
        assert!(f.layout.get_layer_stack(&LayerId::modal()).unwrap().is_empty());

        let cancelled = f
            .layout
            .take_async_reports()
            .into_iter()
            .filter(|r| r.result == AsyncPushResult::Cancelled)
            .count();
        assert_eq!(cancelled, 2);
        assert_eq!(
            f.layout
                .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
                .unwrap_err(),
            LayoutError::TornDown
        );
    }

    #[tokio::test]
    async fn test_dropping_layout_releases_input() {
        let f = fixture();
        let Fixture {
            mut layout, input, ..
        } = f;
        layout
            .push_widget_to_layer_async(&LayerId::modal(), "/UI/Quit", Priority::High, "Core", true)
            .unwrap();
        assert_eq!(input.count(), 1);
        drop(layout);
        assert_eq!(input.count(), 0);
    }

    #[test]
    fn test_modal_layer_blocks_input_below() {
        let mut f = fixture();
        f.layout
            .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
            .unwrap();
        f.layout
            .push_widget_to_layer(&LayerId::game_menu(), "Inventory", Priority::Normal, "Core")
            .unwrap();

        assert_eq!(
            f.layout.layers_receiving_input(),
            vec![LayerId::game_menu(), LayerId::game()]
        );
        assert!(!f.layout.is_layer_input_blocked(&LayerId::game()));
        assert_eq!(
            f.layout.desired_focus_target(),
            Some(FocusTarget::new("first_entry"))
        );

        let prompt = f
            .layout
            .push_widget_to_layer(&LayerId::modal(), "QuitPrompt", Priority::Critical, "Core")
            .unwrap();
        assert_eq!(f.layout.layers_receiving_input(), vec![LayerId::modal()]);
        assert!(f.layout.is_layer_input_blocked(&LayerId::game()));
        assert!(f.layout.is_layer_input_blocked(&LayerId::menu()));
        assert!(!f.layout.is_layer_input_blocked(&LayerId::modal()));
        assert!(!f
            .layout
            .is_layer_input_blocked(&LayerId::new("UI.Layer.Nowhere")));
        assert_eq!(f.layout.input_target(), Some(prompt));
        assert_eq!(
            f.layout.desired_focus_target(),
            Some(FocusTarget::new("confirm_button"))
        );
    }

    #[test]
    fn test_toggle_pops_active_widget_else_pushes() {
        let mut f = fixture();
        let game_menu = LayerId::game_menu();

        let pushed = f
            .layout
            .toggle_widget_on_layer(&game_menu, "PauseMenu", Priority::Normal, "Core")
            .unwrap();
        let ToggleOutcome::Pushed(handle) = pushed else {
            panic!("expected a push");
        };
        assert!(handle.is_active());

        let popped = f
            .layout
            .toggle_widget_on_layer(&game_menu, "PauseMenu", Priority::Normal, "Core")
            .unwrap();
        assert_eq!(popped, ToggleOutcome::Popped(handle));
        assert!(f.layout.get_layer_stack(&game_menu).unwrap().is_empty());
    }

    #[test]
    fn test_remove_widget_and_weak_listeners() {
        let mut f = fixture();
        let menu = LayerId::menu();
        let settings = f
            .layout
            .push_widget_to_layer(&menu, "Settings", Priority::Normal, "Core")
            .unwrap();
        let audio = f
            .layout
            .push_widget_to_layer(&menu, "Audio", Priority::Normal, "Core")
            .unwrap();
        let listener = settings.downgrade();
        drop(settings);

        let settings = listener.upgrade().unwrap();
        assert!(f.layout.remove_widget(&settings));
        assert!(!f.layout.remove_widget(&settings));
        assert!(audio.is_active());
        drop(settings);
        assert!(!listener.is_alive());
    }

    #[test]
    fn test_remove_widget_ignores_handle_from_other_layout() {
        let mut a = fixture();
        let mut b = fixture();
        let menu = LayerId::menu();

        let old_menu = a
            .layout
            .push_widget_to_layer(&menu, "OldMenu", Priority::Normal, "Core")
            .unwrap();
        let settings = b
            .layout
            .push_widget_to_layer(&menu, "Settings", Priority::Normal, "Core")
            .unwrap();
        assert_eq!(old_menu.id(), settings.id());

        assert!(!b.layout.remove_widget(&old_menu));
        assert!(settings.is_active());
        assert_eq!(b.layout.get_layer_stack(&menu).unwrap().len(), 1);
        assert!(old_menu.is_active());

        assert!(a.layout.remove_widget(&old_menu));
        assert_eq!(old_menu.activation(), ActivationState::Removed);
    }

    #[test]
    fn test_set_theme_restyles_live_widgets() {
        let mut f = fixture();
        let handle = f
            .layout
            .push_widget_to_layer(&LayerId::modal(), "QuitPrompt", Priority::High, "Core")
            .unwrap();
        let theme_of = |h: &WidgetHandle| {
            h.with_widget(|w| {
                w.as_any()
                    .downcast_ref::<BasicWidget>()
                    .and_then(|b| b.theme_name().map(str::to_string))
            })
        };
        assert_eq!(theme_of(&handle).as_deref(), Some("dark"));

        f.layout.set_theme(ThemePresets::high_contrast());
        assert_eq!(theme_of(&handle).as_deref(), Some("high-contrast"));
        assert_eq!(f.layout.theme().name, "high-contrast");
    }

    #[tokio::test]
    async fn test_snapshot_reports_pending_and_widgets() {
        let mut f = fixture();
        f.layout
            .push_widget_to_layer(&LayerId::game(), "Hud", Priority::Normal, "Core")
            .unwrap();
        f.layout
            .push_widget_to_layer_async(&LayerId::modal(), "/UI/Quit", Priority::High, "PluginX", true)
            .unwrap();

        let snapshot = f.layout.snapshot();
        assert_eq!(snapshot.status, LayoutStatus::Ready);
        assert_eq!(snapshot.input_suspensions, 1);
        let modal = snapshot.layers.last().unwrap();
        assert_eq!(modal.load_state, LayerLoadState::AsyncLoadPending);
        assert!(modal.pending.as_ref().is_some_and(|p| p.holds_input));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["layers"][0]["id"], "UI.Layer.Game");
        assert_eq!(json["layers"][0]["widgets"][0]["class"], "Hud");
        assert_eq!(json["layers"][0]["widgets"][0]["state"], "active");
    }
}
