use serde::{Deserialize, Serialize};

use crate::datetime::{CalendarDate, add_days, diff_days};
use crate::plant::CareKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CareSchedule {
    pub frequency_days: Option<i64>,
    pub last_event_date: Option<CalendarDate>,
}

impl CareSchedule {
    pub fn new(frequency_days: Option<i64>, last_event_date: Option<CalendarDate>) -> Self {
        Self {
            frequency_days,
            last_event_date,
        }
    }

    pub fn frequency(&self) -> Option<i64> {
        self.frequency_days.filter(|days| *days > 0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Overdue,
    DueToday,
    OnTrack,
    AwaitingFirstEvent,
    NoSchedule,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Overdue,
        Status::DueToday,
        Status::OnTrack,
        Status::AwaitingFirstEvent,
        Status::NoSchedule,
    ];

    // Lower is more actionable.
    pub fn priority(self) -> u8 {
        match self {
            Status::Overdue => 0,
            Status::DueToday => 1,
            Status::OnTrack => 2,
            Status::AwaitingFirstEvent => 3,
            Status::NoSchedule => 4,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Status::Overdue => "overdue",
            Status::DueToday => "due_today",
            Status::OnTrack => "on_track",
            Status::AwaitingFirstEvent => "awaiting_first_event",
            Status::NoSchedule => "no_schedule",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationResult {
    pub status: Status,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<CalendarDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_days: Option<i64>,
}

/// Classifies a schedule against `today`. Pure and total.
pub fn evaluate(schedule: &CareSchedule, today: CalendarDate) -> EvaluationResult {
    evaluate_with(schedule, today, None)
}

pub fn evaluate_kind(
    schedule: &CareSchedule,
    kind: CareKind,
    today: CalendarDate,
) -> EvaluationResult {
    evaluate_with(schedule, today, Some(kind))
}

fn evaluate_with(
    schedule: &CareSchedule,
    today: CalendarDate,
    kind: Option<CareKind>,
) -> EvaluationResult {
    let Some(frequency) = schedule.frequency() else {
        let display_text = match kind {
            Some(kind) => format!("No {} frequency set", kind.noun()),
            None => "No frequency set".to_string(),
        };
        return EvaluationResult {
            status: Status::NoSchedule,
            display_text,
            next_due_date: None,
            delta_days: None,
        };
    };

    let Some(last) = schedule.last_event_date else {
        let pending = match kind {
            Some(kind) => kind.never_logged_text(),
            None => "no events logged yet",
        };
        return EvaluationResult {
            status: Status::AwaitingFirstEvent,
            display_text: format!("Every {} · {pending}", day_count(frequency)),
            next_due_date: None,
            delta_days: None,
        };
    };

    let next_due = add_days(last, frequency);
    let delta = diff_days(today, next_due);

    let (status, display_text) = match delta {
        d if d < 0 => (
            Status::Overdue,
            format!("Due {next_due} · {} overdue", day_count(d.unsigned_abs())),
        ),
        0 => (Status::DueToday, format!("Due {next_due} · today")),
        d => (Status::OnTrack, format!("Due {next_due} · in {}", day_count(d))),
    };

    EvaluationResult {
        status,
        display_text,
        next_due_date: Some(next_due),
        delta_days: Some(delta),
    }
}

fn day_count<N>(n: N) -> String
where
    N: Into<i128> + Copy,
{
    let value: i128 = n.into();
    if value == 1 {
        "1 day".to_string()
    } else {
        format!("{value} days")
    }
}
