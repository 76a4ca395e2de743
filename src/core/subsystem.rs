//! Per-session UI subsystem
//!
//! Holds the one primary layout of a player session so other systems (event
//! handlers, the player controller) can reach it. Owns the session's input
//! suspension; every layout registered here should share it.

use super::input_suspension::InputSuspension;
use super::layout::LayoutController;
use tracing::{info, warn};

#[derive(Debug)]
pub struct UiSubsystem {
    session: String,
    input: InputSuspension,
    primary_layout: Option<LayoutController>,
}

impl UiSubsystem {
    pub fn new(session: impl Into<String>, input: InputSuspension) -> Self {
        let session = session.into();
        info!(target: "layerstack::layout", %session, "ui subsystem started");
        Self {
            session,
            input,
            primary_layout: None,
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Input suspension to hand to layouts created for this session
    pub fn input_suspension(&self) -> &InputSuspension {
        &self.input
    }

    /// Make `layout` the session's primary layout. A previously registered
    /// layout is torn down first.
    pub fn register_primary_game_layout(&mut self, layout: LayoutController) {
        if let Some(mut previous) = self.primary_layout.take() {
            warn!(
                target: "layerstack::layout",
                session = %self.session,
                "replacing primary game layout; tearing down the previous one"
            );
            previous.teardown();
        }
        if !layout.is_ready() {
            warn!(
                target: "layerstack::layout",
                session = %self.session,
                status = ?layout.status(),
                "registered primary game layout is not ready"
            );
        }
        info!(target: "layerstack::layout", session = %self.session, "primary game layout registered");
        self.primary_layout = Some(layout);
    }

    pub fn get_primary_game_layout(&self) -> Option<&LayoutController> {
        self.primary_layout.as_ref()
    }

    pub fn get_primary_game_layout_mut(&mut self) -> Option<&mut LayoutController> {
        self.primary_layout.as_mut()
    }

    /// Detach the primary layout and hand it back to the caller
    pub fn unregister_primary_game_layout(&mut self) -> Option<LayoutController> {
        let layout = self.primary_layout.take();
        if layout.is_some() {
            info!(target: "layerstack::layout", session = %self.session, "primary game layout unregistered");
        }
        layout
    }

    /// End of session: tear the primary layout down and drop it
    pub fn shutdown(&mut self) {
        if let Some(mut layout) = self.primary_layout.take() {
            layout.teardown();
        }
        if self.input.is_suspended() {
            warn!(
                target: "layerstack::input",
                session = %self.session,
                outstanding = ?self.input.reasons(),
                "input still suspended at shutdown"
            );
        }
        info!(target: "layerstack::layout", session = %self.session, "ui subsystem shut down");
    }
}

impl Drop for UiSubsystem {
    fn drop(&mut self) {
        if self.primary_layout.is_some() {
            self.shutdown();
        }
    }
}
