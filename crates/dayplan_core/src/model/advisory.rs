use serde::{Deserialize, Serialize};

use crate::model::TimeInterval;

/// External hint affecting placement. Supplied pre-resolved by a knowledge
/// collaborator; the planner only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub window: TimeInterval,
    pub adjustment: Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    Weather,
    Traffic,
    Research,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Adjustment {
    AvoidOutdoor,
    AddBufferMinutes { minutes: u32 },
    PreferWindow,
}
