use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::plant::{CareEvent, Plant};

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub plants_path: PathBuf,
    pub events_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let plants_path = data_dir.join("plants.data");
        let events_path = data_dir.join("events.data");

        for path in [&plants_path, &events_path] {
            if !path.exists() {
                fs::write(path, "")
                    .with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            plants = %plants_path.display(),
            events = %events_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            plants_path,
            events_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_plants(&self) -> anyhow::Result<Vec<Plant>> {
        load_jsonl(&self.plants_path).context("failed to load plants.data")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_events(&self) -> anyhow::Result<Vec<CareEvent>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    #[tracing::instrument(skip(self, plants))]
    pub fn save_plants(&self, plants: &[Plant]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.plants_path, plants).context("failed to save plants.data")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save_events(&self, events: &[CareEvent]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.events_path, events).context("failed to save events.data")
    }

    #[tracing::instrument(skip(self, plant), fields(id = %plant.id, name = %plant.name))]
    pub fn add_plant(&self, plant: Plant) -> anyhow::Result<Vec<Plant>> {
        let mut plants = self.load_plants()?;
        let wanted = plant.name.to_lowercase();
        if plants
            .iter()
            .any(|existing| existing.name.to_lowercase() == wanted)
        {
            return Err(anyhow!("a plant named {:?} already exists", plant.name));
        }
        plants.push(plant);
        self.save_plants(&plants)?;
        Ok(plants)
    }

    #[tracing::instrument(skip(self, plant), fields(id = %plant.id))]
    pub fn update_plant(&self, plant: &Plant) -> anyhow::Result<()> {
        let mut plants = self.load_plants()?;
        let slot = plants
            .iter_mut()
            .find(|existing| existing.id == plant.id)
            .ok_or_else(|| anyhow!("plant not found: {}", plant.id))?;
        *slot = plant.clone();
        self.save_plants(&plants)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove_plant(&self, id: Uuid) -> anyhow::Result<Plant> {
        let mut plants = self.load_plants()?;
        let idx = plants
            .iter()
            .position(|plant| plant.id == id)
            .ok_or_else(|| anyhow!("plant not found: {id}"))?;
        let removed = plants.remove(idx);

        let events = self.load_events()?;
        let before = events.len();
        let kept: Vec<CareEvent> = events.into_iter().filter(|e| e.plant_id != id).collect();

        // Events before plants: an event must never outlive its plant on disk.
        self.save_events(&kept)?;
        self.save_plants(&plants)?;
        info!(
            plant = %removed.name,
            dropped_events = before - kept.len(),
            "removed plant"
        );
        Ok(removed)
    }

    #[tracing::instrument(skip(self, event), fields(plant = %event.plant_id, kind = %event.kind, date = %event.date))]
    pub fn log_event(&self, event: CareEvent) -> anyhow::Result<()> {
        let plants = self.load_plants()?;
        if !plants.iter().any(|plant| plant.id == event.plant_id) {
            return Err(anyhow!("event refers to unknown plant {}", event.plant_id));
        }
        let mut events = self.load_events()?;
        events.push(event);
        self.save_events(&events)
    }

    pub fn find_plant(&self, selector: &str) -> anyhow::Result<Plant> {
        let plants = self.load_plants()?;
        find_in(&plants, selector).cloned()
    }
}

/// Exact name (any case), then a unique name prefix, then a uuid prefix.
pub fn find_in<'a>(plants: &'a [Plant], selector: &str) -> anyhow::Result<&'a Plant> {
    let needle = selector.trim().to_lowercase();
    if needle.is_empty() {
        return Err(anyhow!("empty plant selector"));
    }

    if let Some(plant) = plants.iter().find(|p| p.name.to_lowercase() == needle) {
        return Ok(plant);
    }

    let by_name: Vec<&Plant> = plants
        .iter()
        .filter(|p| p.name.to_lowercase().starts_with(&needle))
        .collect();
    let candidates = if by_name.is_empty() {
        plants
            .iter()
            .filter(|p| p.id.to_string().starts_with(&needle))
            .collect()
    } else {
        by_name
    };

    match candidates.as_slice() {
        [] => Err(anyhow!("no plant matches {selector:?}")),
        [single] => Ok(*single),
        many => Err(anyhow!(
            "{selector:?} is ambiguous: {}",
            many.iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
