use crate::schedule::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
  pub label:      &'static str,
  pub icon:       &'static str,
  pub ansi_color: &'static str
}

const OVERDUE: StatusStyle =
  StatusStyle {
    label:      "Overdue",
    icon:       "🥀",
    ansi_color: "31"
  };

const DUE_TODAY: StatusStyle =
  StatusStyle {
    label:      "Due today",
    icon:       "💧",
    ansi_color: "33"
  };

const ON_TRACK: StatusStyle =
  StatusStyle {
    label:      "On track",
    icon:       "🌿",
    ansi_color: "32"
  };

const AWAITING_FIRST: StatusStyle =
  StatusStyle {
    label:      "Not started",
    icon:       "🌱",
    ansi_color: "36"
  };

const NO_SCHEDULE: StatusStyle =
  StatusStyle {
    label:      "No schedule",
    icon:       "·",
    ansi_color: "90"
  };

impl Status {
  #[must_use]
  pub fn style(self) -> &'static StatusStyle {
    match self {
      | Status::Overdue => &OVERDUE,
      | Status::DueToday => &DUE_TODAY,
      | Status::OnTrack => &ON_TRACK,
      | Status::AwaitingFirstEvent => {
        &AWAITING_FIRST
      }
      | Status::NoSchedule => {
        &NO_SCHEDULE
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use crate::schedule::Status;

  #[test]
  fn every_status_has_a_distinct_label() {
    let labels: BTreeSet<&str> = Status::ALL
      .iter()
      .map(|status| status.style().label)
      .collect();
    assert_eq!(
      labels.len(),
      Status::ALL.len()
    );
  }
}
