use crate::domain::display::{DisplayRegion, SlotGenerations};
use crate::domain::inputs::{Action, ActionCounters, InputValues};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod store;

pub use store::{SessionHandle, SessionStore};

/// Interaction state of one browser session. Never shared across sessions.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub inputs: InputValues,
    pub counters: ActionCounters,
    pub display: DisplayRegion,
    pub(crate) generations: SlotGenerations,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            inputs: InputValues::default(),
            counters: ActionCounters::default(),
            display: DisplayRegion::default(),
            generations: SlotGenerations::default(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            inputs: self.inputs.clone(),
            counters: self.counters,
            display: self.display.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub inputs: InputValues,
    pub counters: ActionCounters,
    pub display: DisplayRegion,
}

/// A user interaction: the panel's current values plus the button clicked, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub inputs: InputValues,
}
