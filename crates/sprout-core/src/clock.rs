use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::Config;
use crate::datetime::{
  CalendarDate,
  TimeOfDay
};

const TIMEZONE_CONFIG_FILE: &str =
  "sprout-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "SPROUT_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "SPROUT_TIME_CONFIG";
pub const DEFAULT_CIVIL_TIMEZONE: &str =
  "America/Los_Angeles";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

pub trait Clock {
  fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_utc(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(
  pub DateTime<Utc>
);

impl Clock for FixedClock {
  fn now_utc(&self) -> DateTime<Utc> {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
  pub instant:     DateTime<Utc>,
  pub today:       CalendarDate,
  pub time_of_day: TimeOfDay
}

pub struct CalendarClock {
  tz:    Tz,
  clock: Box<dyn Clock>
}

impl std::fmt::Debug for CalendarClock {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("CalendarClock")
      .field("tz", &self.tz)
      .finish_non_exhaustive()
  }
}

impl CalendarClock {
  pub fn new(
    tz: Tz,
    clock: Box<dyn Clock>
  ) -> Self {
    Self { tz, clock }
  }

  pub fn system(tz: Tz) -> Self {
    Self::new(tz, Box::new(SystemClock))
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self.tz
  }

  pub fn now(&self) -> ClockReading {
    self.reading_at(self.clock.now_utc())
  }

  #[must_use]
  pub fn reading_at(
    &self,
    instant: DateTime<Utc>
  ) -> ClockReading {
    let local =
      instant.with_timezone(&self.tz);
    ClockReading {
      instant,
      today: local.date_naive().into(),
      time_of_day: local.time().into()
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct TimezoneSources {
  pub env:       Option<String>,
  pub config:    Option<String>,
  pub file_path: Option<PathBuf>
}

impl TimezoneSources {
  pub fn gather(cfg: &Config) -> Self {
    Self {
      env:       std::env::var(
        TIMEZONE_ENV_VAR
      )
      .ok(),
      config:    cfg.get("timezone"),
      file_path: timezone_config_path()
    }
  }
}

#[tracing::instrument(skip(cfg))]
pub fn resolve_timezone(
  cfg: &Config
) -> anyhow::Result<Tz> {
  resolve_timezone_from(
    &TimezoneSources::gather(cfg)
  )
}

// A present but unknown zone id is an
// error, never a UTC fallback.
pub fn resolve_timezone_from(
  sources: &TimezoneSources
) -> anyhow::Result<Tz> {
  if let Some(raw) = &sources.env
    && let Some(tz) =
      parse_timezone(raw, TIMEZONE_ENV_VAR)?
  {
    return Ok(tz);
  }

  if let Some(raw) = &sources.config
    && let Some(tz) =
      parse_timezone(raw, "config:timezone")?
  {
    return Ok(tz);
  }

  if let Some(path) = &sources.file_path
    && let Some(tz) =
      load_timezone_from_file(path)?
  {
    return Ok(tz);
  }

  tracing::debug!(
    timezone = DEFAULT_CIVIL_TIMEZONE,
    "using built-in civil timezone"
  );
  parse_timezone(
    DEFAULT_CIVIL_TIMEZONE,
    "DEFAULT_CIVIL_TIMEZONE"
  )?
  .ok_or_else(|| {
    anyhow!(
      "built-in timezone id is empty"
    )
  })
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> anyhow::Result<Option<Tz>> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return Ok(None);
  }

  let raw = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed reading timezone \
         config {}",
        path.display()
      )
    })?;
  let parsed: TimezoneConfig =
    toml::from_str(&raw).with_context(
      || {
        format!(
          "failed parsing timezone \
           config {}",
          path.display()
        )
      }
    )?;

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return Ok(None);
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> anyhow::Result<Option<Tz>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return Ok(None);
  }

  let tz =
    trimmed.parse::<Tz>().map_err(
      |err| {
        anyhow!(
          "unknown timezone {trimmed:?} \
           from {source}: {err}"
        )
      }
    )?;
  tracing::info!(
    source,
    timezone = %trimmed,
    "configured civil timezone"
  );
  Ok(Some(tz))
}
