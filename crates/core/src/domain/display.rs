use crate::domain::inputs::Action;
use crate::domain::profile::CompanyProfile;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Hey there! Please enter a legitimate stock code to get details.";

/// One of the four independent output regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Profile,
    Price,
    Indicators,
    Forecast,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Profile, Slot::Price, Slot::Indicators, Slot::Forecast];

    pub fn for_action(action: Action) -> Self {
        match action {
            Action::Submit => Slot::Profile,
            Action::Price => Slot::Price,
            Action::Indicators => Slot::Indicators,
            Action::Forecast => Slot::Forecast,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::Profile => 0,
            Slot::Price => 1,
            Slot::Indicators => 2,
            Slot::Forecast => 3,
        }
    }
}

/// Renderable content of a slot. Replaced wholesale on every applied update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    #[default]
    Blank,
    Welcome {
        message: String,
    },
    Profile(CompanyProfile),
    Graph {
        figure: serde_json::Value,
    },
}

impl Fragment {
    pub fn welcome() -> Self {
        Fragment::Welcome {
            message: WELCOME_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayRegion {
    pub profile: Fragment,
    pub price: Fragment,
    pub indicators: Fragment,
    pub forecast: Fragment,
}

impl DisplayRegion {
    pub fn replace(&mut self, slot: Slot, fragment: Fragment) {
        let target = match slot {
            Slot::Profile => &mut self.profile,
            Slot::Price => &mut self.price,
            Slot::Indicators => &mut self.indicators,
            Slot::Forecast => &mut self.forecast,
        };
        *target = fragment;
    }
}

/// Per-slot request generations. Only the latest issued token may write its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotGenerations {
    issued: [u64; 4],
}

impl SlotGenerations {
    pub fn issue(&mut self, slot: Slot) -> u64 {
        let g = &mut self.issued[slot.index()];
        *g += 1;
        *g
    }

    pub fn latest(&self, slot: Slot) -> u64 {
        self.issued[slot.index()]
    }

    pub fn is_current(&self, slot: Slot, generation: u64) -> bool {
        self.latest(slot) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn each_action_drives_its_own_slot() {
        let slots: Vec<Slot> = [Action::Submit, Action::Price, Action::Indicators, Action::Forecast]
            .into_iter()
            .map(Slot::for_action)
            .collect();
        assert_eq!(slots, Slot::ALL);
    }

    #[test]
    fn newer_generation_supersedes_older() {
        let mut gens = SlotGenerations::default();
        let first = gens.issue(Slot::Price);
        let second = gens.issue(Slot::Price);
        assert!(!gens.is_current(Slot::Price, first));
        assert!(gens.is_current(Slot::Price, second));

        // Other slots are tracked independently.
        let ind = gens.issue(Slot::Indicators);
        assert_eq!(ind, 1);
        assert!(gens.is_current(Slot::Price, second));
    }

    #[test]
    fn fragments_are_tagged() {
        let v = serde_json::to_value(Fragment::Profile(CompanyProfile {
            description: "d".into(),
            logo_url: "l".into(),
            short_name: "s".into(),
        }))
        .unwrap();
        assert_eq!(
            v,
            json!({"kind": "profile", "description": "d", "logo_url": "l", "short_name": "s"})
        );
        assert_eq!(serde_json::to_value(Fragment::Blank).unwrap(), json!({"kind": "blank"}));
    }
}
