use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{CalendarDate, TimeOfDay, record_timestamp_serde};
use crate::schedule::CareSchedule;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CareKind {
    Water,
    Sun,
}

impl CareKind {
    pub fn noun(self) -> &'static str {
        match self {
            CareKind::Water => "watering",
            CareKind::Sun => "sunlight",
        }
    }

    pub fn never_logged_text(self) -> &'static str {
        match self {
            CareKind::Water => "never watered",
            CareKind::Sun => "no sunlight logged yet",
        }
    }
}

impl fmt::Display for CareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CareKind::Water => write!(f, "water"),
            CareKind::Sun => write!(f, "sun"),
        }
    }
}

impl FromStr for CareKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" | "watering" => Ok(CareKind::Water),
            "sun" | "sunlight" => Ok(CareKind::Sun),
            other => Err(anyhow!("unknown care kind: {other} (expected water or sun)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plant {
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub water_every_days: Option<i64>,

    #[serde(default)]
    pub sun_every_days: Option<i64>,

    #[serde(with = "record_timestamp_serde")]
    pub created: DateTime<Utc>,
}

impl Plant {
    pub fn new(name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            location: None,
            water_every_days: None,
            sun_every_days: None,
            created: now,
        }
    }

    pub fn frequency(&self, kind: CareKind) -> Option<i64> {
        match kind {
            CareKind::Water => self.water_every_days,
            CareKind::Sun => self.sun_every_days,
        }
    }

    pub fn set_frequency(&mut self, kind: CareKind, days: Option<i64>) {
        let normalized = days.filter(|value| *value > 0);
        if days.is_some() && normalized.is_none() {
            tracing::warn!(
                plant = %self.name,
                kind = %kind,
                days = ?days,
                "non-positive frequency stored as no schedule"
            );
        }
        match kind {
            CareKind::Water => self.water_every_days = normalized,
            CareKind::Sun => self.sun_every_days = normalized,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareEvent {
    pub id: Uuid,

    pub plant_id: Uuid,

    pub kind: CareKind,

    pub date: CalendarDate,

    #[serde(default)]
    pub time: Option<TimeOfDay>,

    #[serde(with = "record_timestamp_serde")]
    pub created: DateTime<Utc>,

    #[serde(default)]
    pub note: Option<String>,
}

impl CareEvent {
    pub fn new(
        plant_id: Uuid,
        kind: CareKind,
        date: CalendarDate,
        time: Option<TimeOfDay>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plant_id,
            kind,
            date,
            time,
            created: now,
            note: None,
        }
    }
}

// Latest `date` wins, then latest `created`.
pub fn latest_event(events: &[CareEvent], plant_id: Uuid, kind: CareKind) -> Option<&CareEvent> {
    events
        .iter()
        .filter(|event| event.plant_id == plant_id && event.kind == kind)
        .max_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created.cmp(&b.created))
                .then_with(|| a.id.cmp(&b.id))
        })
}

pub fn schedule_for(plant: &Plant, events: &[CareEvent], kind: CareKind) -> CareSchedule {
    CareSchedule::new(
        plant.frequency(kind),
        latest_event(events, plant.id, kind).map(|event| event.date),
    )
}
