use std::fmt;
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  NaiveDate,
  NaiveTime,
  Timelike
};
use regex::Regex;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> anyhow::Result<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self)
    .ok_or_else(|| {
      anyhow!(
        "invalid calendar date: \
         {year:04}-{month:02}-{day:02}"
      )
    })
  }

  #[must_use]
  pub fn naive(self) -> NaiveDate {
    self.0
  }
}

impl From<NaiveDate> for CalendarDate {
  fn from(value: NaiveDate) -> Self {
    Self(value)
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format(DATE_FORMAT)
    )
  }
}

impl FromStr for CalendarDate {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let token = s.trim();
    let shape_re =
      Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .map_err(|e| {
          anyhow!(
            "internal regex compile \
             failure: {e}"
          )
        })?;
    if !shape_re.is_match(token) {
      return Err(anyhow!(
        "malformed date token: {s:?} \
         (expected YYYY-MM-DD)"
      ));
    }

    NaiveDate::parse_from_str(
      token,
      DATE_FORMAT
    )
    .map(Self)
    .with_context(|| {
      format!(
        "not a valid calendar date: \
         {token}"
      )
    })
  }
}

impl Serialize for CalendarDate {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de>
  for CalendarDate
{
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    raw
      .parse()
      .map_err(serde::de::Error::custom)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
  pub fn from_hm(
    hour: u32,
    minute: u32
  ) -> anyhow::Result<Self> {
    NaiveTime::from_hms_opt(
      hour, minute, 0
    )
    .map(Self)
    .ok_or_else(|| {
      anyhow!(
        "invalid time of day: \
         {hour:02}:{minute:02}"
      )
    })
  }

  #[must_use]
  pub fn hour(self) -> u32 {
    self.0.hour()
  }

  #[must_use]
  pub fn minute(self) -> u32 {
    self.0.minute()
  }
}

impl From<NaiveTime> for TimeOfDay {
  fn from(value: NaiveTime) -> Self {
    Self(
      value
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(value)
    )
  }
}

impl fmt::Display for TimeOfDay {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format(TIME_FORMAT)
    )
  }
}

impl FromStr for TimeOfDay {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let clock_re = Regex::new(
      r"^(?P<hour>\d{2}):(?P<minute>\d{2})$"
    )
    .map_err(|e| {
      anyhow!(
        "internal regex compile \
         failure: {e}"
      )
    })?;
    let caps = clock_re
      .captures(s.trim())
      .ok_or_else(|| {
        anyhow!(
          "malformed time token: \
           {s:?} (expected HH:MM)"
        )
      })?;

    let hour: u32 = caps["hour"]
      .parse()
      .context("invalid hour")?;
    let minute: u32 = caps["minute"]
      .parse()
      .context("invalid minute")?;
    Self::from_hm(hour, minute)
  }
}

impl Serialize for TimeOfDay {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for TimeOfDay {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    raw
      .parse()
      .map_err(serde::de::Error::custom)
  }
}

fn earliest_token_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(1, 1, 1)
    .unwrap_or(NaiveDate::MIN)
}

fn latest_token_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .unwrap_or(NaiveDate::MAX)
}

/// Adds whole days on the date-only
/// representation. Results outside
/// 0001-01-01..=9999-12-31 saturate, so
/// every result still prints as a
/// `YYYY-MM-DD` token.
#[must_use]
pub fn add_days(
  date: CalendarDate,
  days: i64
) -> CalendarDate {
  let earliest = earliest_token_date();
  let latest = latest_token_date();
  let shifted = Duration::try_days(days)
    .and_then(|delta| {
      date.0.checked_add_signed(delta)
    })
    .filter(|next| {
      (earliest..=latest).contains(next)
    });

  match shifted {
    | Some(next) => CalendarDate(next),
    | None => {
      tracing::error!(
        date = %date,
        days,
        "date arithmetic overflow; \
         saturating"
      );
      if days < 0 {
        CalendarDate(earliest)
      } else {
        CalendarDate(latest)
      }
    }
  }
}

// `b - a` in whole calendar days.
#[must_use]
pub fn diff_days(
  a: CalendarDate,
  b: CalendarDate
) -> i64 {
  b.0
    .signed_duration_since(a.0)
    .num_days()
}

pub mod record_timestamp_serde {
  use chrono::{
    DateTime,
    NaiveDateTime,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  const FORMAT: &str = "%Y%m%dT%H%M%SZ";

  pub fn serialize<S>(
    dt: &DateTime<Utc>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &dt.format(FORMAT).to_string()
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    NaiveDateTime::parse_from_str(
      &raw, FORMAT
    )
    .map(|ndt| {
      DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc)
    })
    .map_err(serde::de::Error::custom)
  }
}
