use chrono::{TimeZone, Utc};
use sprout_core::clock::{CalendarClock, FixedClock};
use sprout_core::commands::ranked_view;
use sprout_core::datastore::DataStore;
use sprout_core::plant::{CareEvent, CareKind, Plant};
use sprout_core::rank::rank;
use sprout_core::schedule::Status;
use tempfile::tempdir;

#[test]
fn stored_plants_rank_against_one_sampled_today() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");

    // 06:30 UTC on the 18th is still the evening of the 17th in Los Angeles.
    let instant = Utc
        .with_ymd_and_hms(2026, 2, 18, 6, 30, 0)
        .single()
        .expect("valid instant");
    let clock = CalendarClock::new(
        chrono_tz::America::Los_Angeles,
        Box::new(FixedClock(instant)),
    );
    let reading = clock.now();
    assert_eq!(reading.today.to_string(), "2026-02-17");

    let mut fern = Plant::new("Fern".to_string(), instant);
    fern.set_frequency(CareKind::Water, Some(7));
    let mut aloe = Plant::new("aloe".to_string(), instant);
    aloe.set_frequency(CareKind::Water, Some(7));
    let mut basil = Plant::new("Basil".to_string(), instant);
    basil.set_frequency(CareKind::Water, Some(2));
    let mut monstera = Plant::new("Monstera".to_string(), instant);
    monstera.set_frequency(CareKind::Water, Some(0));

    for plant in [&fern, &aloe, &basil, &monstera] {
        store.add_plant(plant.clone()).expect("add plant");
    }

    for (plant, date) in [
        (&fern, "2026-02-10"),
        (&aloe, "2026-02-10"),
        (&basil, "2026-02-13"),
        (&monstera, "2026-02-16"),
    ] {
        store
            .log_event(CareEvent::new(
                plant.id,
                CareKind::Water,
                date.parse().expect("date"),
                None,
                instant,
            ))
            .expect("log event");
    }

    let plants = store.load_plants().expect("load plants");
    let events = store.load_events().expect("load events");
    assert_eq!(plants.len(), 4);
    assert_eq!(events.len(), 4);

    let view = ranked_view(&plants, &events, CareKind::Water, reading.today);
    let summary: Vec<(&str, Status, Option<i64>)> = view
        .iter()
        .map(|e| (e.name.as_str(), e.result.status, e.result.delta_days))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Basil", Status::Overdue, Some(-2)),
            ("aloe", Status::DueToday, Some(0)),
            ("Fern", Status::DueToday, Some(0)),
            ("Monstera", Status::NoSchedule, None),
        ]
    );

    let first = rank(&view);
    let again = rank(&ranked_view(&plants, &events, CareKind::Water, reading.today));
    assert_eq!(first, again);
}

#[test]
fn sunlight_is_tracked_independently_of_watering() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let now = Utc
        .with_ymd_and_hms(2026, 2, 17, 20, 0, 0)
        .single()
        .expect("valid now");

    let mut ivy = Plant::new("Ivy".to_string(), now);
    ivy.set_frequency(CareKind::Water, Some(3));
    ivy.set_frequency(CareKind::Sun, Some(1));
    store.add_plant(ivy.clone()).expect("add plant");
    store
        .log_event(CareEvent::new(
            ivy.id,
            CareKind::Water,
            "2026-02-16".parse().expect("date"),
            Some("09:00".parse().expect("time")),
            now,
        ))
        .expect("log water");

    let plants = store.load_plants().expect("load plants");
    let events = store.load_events().expect("load events");
    let today = "2026-02-17".parse().expect("date");

    let water = ranked_view(&plants, &events, CareKind::Water, today);
    assert_eq!(water[0].result.status, Status::OnTrack);
    assert_eq!(water[0].result.display_text, "Due 2026-02-19 · in 2 days");

    let sun = ranked_view(&plants, &events, CareKind::Sun, today);
    assert_eq!(sun[0].result.status, Status::AwaitingFirstEvent);
    assert_eq!(sun[0].result.display_text, "Every 1 day · no sunlight logged yet");
    assert_eq!(events[0].time.map(|t| t.to_string()).as_deref(), Some("09:00"));
}
