use std::io::{self, Write};

use anyhow::{Context, anyhow};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cli::Invocation;
use crate::clock::{CalendarClock, ClockReading};
use crate::config::Config;
use crate::datastore::{DataStore, find_in};
use crate::datetime::{CalendarDate, TimeOfDay};
use crate::plant::{CareEvent, CareKind, Plant, latest_event, schedule_for};
use crate::rank::{RankEntry, rank_entries};
use crate::render::{ListRow, Renderer};
use crate::schedule::{EvaluationResult, evaluate_kind};

const RECENT_EVENTS_SHOWN: usize = 5;
const MAX_FREQUENCY_DAYS: i64 = 36_500;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "list", "info", "add", "set", "water", "sun", "remove", "today", "export", "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

// The clock is sampled once per command.
#[instrument(skip(store, cfg, renderer, clock, inv), fields(command = %inv.command))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &Renderer,
    clock: &CalendarClock,
    inv: Invocation,
) -> anyhow::Result<()> {
    let reading = clock.now();
    debug!(
        today = %reading.today,
        time = %reading.time_of_day,
        args = ?inv.args,
        "dispatching command"
    );

    match inv.command.as_str() {
        "list" => cmd_list(store, renderer, &inv.args, reading.today),
        "info" => cmd_info(store, renderer, &inv.args, reading.today),
        "add" => cmd_add(store, &inv.args, &reading),
        "set" => cmd_set(store, &inv.args),
        "water" => cmd_log(store, CareKind::Water, &inv.args, &reading),
        "sun" => cmd_log(store, CareKind::Sun, &inv.args, &reading),
        "remove" => cmd_remove(store, &inv.args),
        "today" => renderer.print_today(&reading, clock.timezone().name()),
        "export" => cmd_export(store, &inv.args, reading.today),
        "help" => cmd_help(cfg),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

pub fn ranked_view(
    plants: &[Plant],
    events: &[CareEvent],
    kind: CareKind,
    today: CalendarDate,
) -> Vec<RankEntry<Uuid>> {
    let entries = plants
        .iter()
        .map(|plant| {
            let schedule = schedule_for(plant, events, kind);
            RankEntry::new(
                plant.id,
                plant.name.clone(),
                evaluate_kind(&schedule, kind, today),
            )
        })
        .collect();
    rank_entries(entries)
}

fn parse_kind_arg(args: &[String]) -> anyhow::Result<CareKind> {
    match args {
        [] => Ok(CareKind::Water),
        [kind] => kind.parse(),
        _ => Err(anyhow!("expected at most one argument: water or sun")),
    }
}

#[instrument(skip(store, renderer, args))]
fn cmd_list(
    store: &DataStore,
    renderer: &Renderer,
    args: &[String],
    today: CalendarDate,
) -> anyhow::Result<()> {
    let kind = parse_kind_arg(args)?;
    let plants = store.load_plants()?;
    let events = store.load_events()?;

    let rows: Vec<ListRow> = ranked_view(&plants, &events, kind, today)
        .into_iter()
        .filter_map(|entry| {
            let plant = plants.iter().find(|p| p.id == entry.key)?;
            Some(ListRow {
                name: entry.name,
                location: plant.location.clone(),
                last_event: latest_event(&events, plant.id, kind).map(|e| e.date.to_string()),
                result: entry.result,
            })
        })
        .collect();

    info!(kind = %kind, count = rows.len(), "listing plants");
    renderer.print_list(kind, &rows)
}

#[instrument(skip(store, renderer, args))]
fn cmd_info(
    store: &DataStore,
    renderer: &Renderer,
    args: &[String],
    today: CalendarDate,
) -> anyhow::Result<()> {
    let selector = args.join(" ");
    let plants = store.load_plants()?;
    let plant = find_in(&plants, &selector)?;
    let events = store.load_events()?;

    let evaluations: Vec<(CareKind, EvaluationResult)> = [CareKind::Water, CareKind::Sun]
        .into_iter()
        .map(|kind| {
            let schedule = schedule_for(plant, &events, kind);
            (kind, evaluate_kind(&schedule, kind, today))
        })
        .collect();

    let mut recent: Vec<&CareEvent> = events.iter().filter(|e| e.plant_id == plant.id).collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created.cmp(&a.created)));
    recent.truncate(RECENT_EVENTS_SHOWN);

    renderer.print_plant_info(plant, &evaluations, &recent)
}

fn split_attributes(args: &[String]) -> (Vec<String>, Vec<(String, String)>) {
    let mut words = Vec::new();
    let mut attrs = Vec::new();

    for arg in args {
        let split = arg
            .find([':', '='])
            .map(|idx| (&arg[..idx], &arg[idx + 1..]));
        match split {
            Some((key, value))
                if matches!(
                    key.to_ascii_lowercase().as_str(),
                    "water" | "sun" | "location" | "loc"
                ) =>
            {
                attrs.push((key.to_ascii_lowercase(), value.to_string()));
            }
            _ => words.push(arg.clone()),
        }
    }

    (words, attrs)
}

fn apply_attributes(plant: &mut Plant, attrs: &[(String, String)]) -> anyhow::Result<()> {
    for (key, value) in attrs {
        match key.as_str() {
            "location" | "loc" => {
                let trimmed = value.trim();
                plant.location = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            kind => {
                let kind: CareKind = kind.parse()?;
                let days = parse_frequency(value)
                    .with_context(|| format!("invalid {kind} frequency"))?;
                plant.set_frequency(kind, days);
            }
        }
    }
    Ok(())
}

fn parse_frequency(raw: &str) -> anyhow::Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let days = trimmed
        .parse::<i64>()
        .map_err(|err| anyhow!("expected whole days, got {trimmed:?}: {err}"))?;
    if days > MAX_FREQUENCY_DAYS {
        return Err(anyhow!(
            "{days} days exceeds the {MAX_FREQUENCY_DAYS}-day maximum"
        ));
    }
    Ok(Some(days))
}

#[instrument(skip(store, args, reading))]
fn cmd_add(store: &DataStore, args: &[String], reading: &ClockReading) -> anyhow::Result<()> {
    let (words, attrs) = split_attributes(args);
    let name = words.join(" ");
    if name.trim().is_empty() {
        return Err(anyhow!("usage: sprout add <name> [water:N] [sun:N] [location:TEXT]"));
    }

    let mut plant = Plant::new(name.trim().to_string(), reading.instant);
    apply_attributes(&mut plant, &attrs)?;
    store.add_plant(plant.clone())?;

    info!(plant = %plant.name, id = %plant.id, "added plant");
    println!("Added {} ({}).", plant.name, plant.id);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_set(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    let (words, attrs) = split_attributes(args);
    if attrs.is_empty() {
        return Err(anyhow!("usage: sprout set <plant> [water:N] [sun:N] [location:TEXT]"));
    }

    let mut plant = store.find_plant(&words.join(" "))?;
    apply_attributes(&mut plant, &attrs)?;
    store.update_plant(&plant)?;

    println!("Updated {}.", plant.name);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogRequest {
    selector: String,
    date: CalendarDate,
    time: Option<TimeOfDay>,
}

// `<plant> [YYYY-MM-DD] [HH:MM]`. Without a date the event lands on the
// sampled reading, time included.
fn parse_log_args(args: &[String], reading: &ClockReading) -> anyhow::Result<LogRequest> {
    let mut words: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut time: Option<TimeOfDay> = None;
    let mut date: Option<CalendarDate> = None;

    if let Some(last) = words.last()
        && last.contains(':')
    {
        time = Some(last.parse()?);
        words.pop();
    }
    if let Some(last) = words.last()
        && looks_like_date(last)
    {
        date = Some(last.parse()?);
        words.pop();
    }

    let selector = words.join(" ");
    if selector.trim().is_empty() {
        return Err(anyhow!("usage: sprout water|sun <plant> [YYYY-MM-DD] [HH:MM]"));
    }

    let (date, time) = match date {
        Some(date) => (date, time),
        None => (reading.today, Some(time.unwrap_or(reading.time_of_day))),
    };
    Ok(LogRequest {
        selector,
        date,
        time,
    })
}

fn looks_like_date(token: &str) -> bool {
    token.contains('-') && token.chars().all(|c| c.is_ascii_digit() || c == '-')
}

#[instrument(skip(store, args, reading))]
fn cmd_log(
    store: &DataStore,
    kind: CareKind,
    args: &[String],
    reading: &ClockReading,
) -> anyhow::Result<()> {
    let request = parse_log_args(args, reading)?;
    let plant = store.find_plant(&request.selector)?;

    if request.date > reading.today {
        warn!(date = %request.date, today = %reading.today, "logging an event in the future");
    }

    let event = CareEvent::new(plant.id, kind, request.date, request.time, reading.instant);
    store.log_event(event)?;

    println!("Logged {kind} for {} on {}.", plant.name, request.date);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_remove(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    let plant = store.find_plant(&args.join(" "))?;
    let removed = store.remove_plant(plant.id)?;
    println!("Removed {}.", removed.name);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ExportRow {
    id: Uuid,
    name: String,
    kind: CareKind,
    #[serde(flatten)]
    result: EvaluationResult,
}

#[derive(Debug, Serialize)]
struct ExportDoc {
    today: CalendarDate,
    plants: Vec<ExportRow>,
}

#[instrument(skip(store, args))]
fn cmd_export(store: &DataStore, args: &[String], today: CalendarDate) -> anyhow::Result<()> {
    let kind = parse_kind_arg(args)?;
    let plants = store.load_plants()?;
    let events = store.load_events()?;

    let doc = ExportDoc {
        today,
        plants: ranked_view(&plants, &events, kind, today)
            .into_iter()
            .map(|entry| ExportRow {
                id: entry.key,
                name: entry.name,
                kind,
                result: entry.result,
            })
            .collect(),
    };

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &doc)?;
    writeln!(out)?;
    Ok(())
}

fn cmd_help(cfg: &Config) -> anyhow::Result<()> {
    let default = cfg
        .get("default.command")
        .unwrap_or_else(|| "list".to_string());
    println!(
        "usage: sprout [--data DIR] [--sproutrc FILE] [--now RFC3339] [rc.KEY=VALUE] <command>

commands:
  list [water|sun]                 ranked care status (default: {default})
  info <plant>                     schedule and recent events for one plant
  add <name> [water:N] [sun:N] [location:TEXT]
  set <plant> [water:N] [sun:N] [location:TEXT]
  water <plant> [YYYY-MM-DD] [HH:MM]
  sun <plant> [YYYY-MM-DD] [HH:MM]
  remove <plant>
  today                            current date and time in the civil timezone
  export [water|sun]               ranked evaluations as JSON"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        LogRequest, expand_command_abbrev, known_command_names, parse_frequency, parse_log_args,
        ranked_view, split_attributes,
    };
    use crate::clock::ClockReading;
    use crate::plant::{CareEvent, CareKind, Plant};
    use crate::schedule::Status;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn afternoon_reading() -> ClockReading {
        ClockReading {
            instant: Utc
                .with_ymd_and_hms(2026, 2, 17, 22, 30, 0)
                .single()
                .expect("valid instant"),
            today: "2026-02-17".parse().expect("date"),
            time_of_day: "14:30".parse().expect("time"),
        }
    }

    #[test]
    fn abbreviations_resolve_when_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("ex", &known), Some("export"));
        assert_eq!(expand_command_abbrev("t", &known), Some("today"));
        assert_eq!(expand_command_abbrev("s", &known), None);
        assert_eq!(expand_command_abbrev("prune", &known), None);
    }

    #[test]
    fn attributes_are_separated_from_name_words() {
        let args: Vec<String> = ["Peace", "Lily", "water:5", "loc:Hall"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (words, attrs) = split_attributes(&args);
        assert_eq!(words, vec!["Peace".to_string(), "Lily".to_string()]);
        assert_eq!(
            attrs,
            vec![
                ("water".to_string(), "5".to_string()),
                ("loc".to_string(), "Hall".to_string()),
            ]
        );
    }

    #[test]
    fn attribute_splits_at_the_first_separator() {
        let (words, attrs) = split_attributes(&strings(&["Fern", "location=Shelf:top", "sun:2"]));
        assert_eq!(words, vec!["Fern".to_string()]);
        assert_eq!(
            attrs,
            vec![
                ("location".to_string(), "Shelf:top".to_string()),
                ("sun".to_string(), "2".to_string()),
            ]
        );

        let (_, attrs) = split_attributes(&strings(&["loc:a=b"]));
        assert_eq!(attrs, vec![("loc".to_string(), "a=b".to_string())]);
    }

    #[test]
    fn frequency_input_is_bounded() {
        assert_eq!(parse_frequency("").expect("empty"), None);
        assert_eq!(parse_frequency(" 7 ").expect("seven"), Some(7));
        assert_eq!(parse_frequency("0").expect("zero"), Some(0));
        assert_eq!(parse_frequency("36500").expect("max"), Some(36_500));
        assert!(parse_frequency("3000000").is_err());
        assert!(parse_frequency("weekly").is_err());
    }

    #[test]
    fn log_defaults_to_the_sampled_reading() {
        let reading = afternoon_reading();
        let request = parse_log_args(&strings(&["Peace", "Lily"]), &reading).expect("parse");
        assert_eq!(
            request,
            LogRequest {
                selector: "Peace Lily".to_string(),
                date: reading.today,
                time: Some(reading.time_of_day),
            }
        );

        let timed = parse_log_args(&strings(&["Fern", "08:00"]), &reading).expect("parse");
        assert_eq!(timed.date, reading.today);
        assert_eq!(timed.time, Some("08:00".parse().expect("time")));
    }

    #[test]
    fn log_takes_explicit_date_and_time() {
        let reading = afternoon_reading();
        let request =
            parse_log_args(&strings(&["Fern", "2026-02-16", "07:45"]), &reading).expect("parse");
        assert_eq!(request.selector, "Fern");
        assert_eq!(request.date.to_string(), "2026-02-16");
        assert_eq!(request.time, Some("07:45".parse().expect("time")));

        let dated = parse_log_args(&strings(&["Fern", "2026-02-16"]), &reading).expect("parse");
        assert_eq!(dated.date.to_string(), "2026-02-16");
        assert_eq!(dated.time, None);
    }

    #[test]
    fn log_rejects_malformed_tokens() {
        let reading = afternoon_reading();
        for bad in [
            vec!["Fern", "2026-02-30"],
            vec!["Fern", "2026-2-5"],
            vec!["Fern", "25:00"],
            vec!["Fern", "2026-02-16", "7:45"],
            vec!["2026-02-16"],
        ] {
            assert!(
                parse_log_args(&strings(&bad), &reading).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn ranked_view_uses_one_today_for_every_plant() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 17, 12, 0, 0)
            .single()
            .expect("valid now");
        let mut fern = Plant::new("Fern".to_string(), now);
        fern.set_frequency(CareKind::Water, Some(2));
        let mut cactus = Plant::new("Cactus".to_string(), now);
        cactus.set_frequency(CareKind::Water, Some(14));
        let stone = Plant::new("Stone".to_string(), now);

        let events = vec![
            CareEvent::new(fern.id, CareKind::Water, "2026-02-12".parse().expect("date"), None, now),
            CareEvent::new(cactus.id, CareKind::Water, "2026-02-10".parse().expect("date"), None, now),
        ];

        let today = "2026-02-17".parse().expect("date");
        let view = ranked_view(&[stone, cactus, fern], &events, CareKind::Water, today);
        let names: Vec<&str> = view.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Fern", "Cactus", "Stone"]);
        assert_eq!(view[0].result.status, Status::Overdue);
        assert_eq!(view[1].result.delta_days, Some(7));
        assert_eq!(view[2].result.status, Status::NoSchedule);
    }
}
