//! A local catalogue of workouts, read from JSON files.

use crate::common::WorkoutId;
use crate::model::Workout;
use anyhow::Context;
use slotmap::SlotMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Workouts available to a front end, kept in name order.
#[derive(Debug, Default)]
pub struct WorkoutLibrary {
    workouts: SlotMap<WorkoutId, Workout>,
    order: Vec<WorkoutId>,
}

impl WorkoutLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single workout from its JSON text.
    pub fn parse(json: &str) -> anyhow::Result<Workout> {
        serde_json::from_str(json).context("workout JSON is malformed")
    }

    /// Parses a JSON array of workouts into a library.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let workouts: Vec<Workout> =
            serde_json::from_str(json).context("workout list JSON is malformed")?;
        let mut library = Self::new();
        for workout in workouts {
            library.insert(workout);
        }
        Ok(library)
    }

    /// Reads one workout file. The path defaults to the file stem.
    pub fn load_file(path: &Path) -> anyhow::Result<Workout> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read workout file {}", path.display()))?;
        let mut workout = Self::parse(&text)
            .with_context(|| format!("failed to parse workout file {}", path.display()))?;
        if workout.path.is_none() {
            workout.path = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(workout)
    }

    /// Reads every `*.json` file in `dir`. Files that fail to parse are
    /// logged and skipped.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to list workouts in {}", dir.display()))?;
        let mut library = Self::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list workouts in {}", dir.display()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(workout) => {
                    debug!("Loaded workout '{}' from {}.", workout.name, path.display());
                    library.insert(workout);
                }
                Err(err) => warn!("Skipping {}: {:#}", path.display(), err),
            }
        }
        Ok(library)
    }

    /// Adds a workout, keeping the library sorted by upper-cased name.
    pub fn insert(&mut self, workout: Workout) -> WorkoutId {
        let key = workout.name.to_uppercase();
        let id = self.workouts.insert(workout);
        let workouts = &self.workouts;
        let position = self
            .order
            .partition_point(|existing| workouts[*existing].name.to_uppercase() <= key);
        self.order.insert(position, id);
        id
    }

    pub fn remove(&mut self, id: WorkoutId) -> Option<Workout> {
        let workout = self.workouts.remove(id)?;
        self.order.retain(|existing| *existing != id);
        Some(workout)
    }

    pub fn get(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.get(id)
    }

    /// Finds a workout by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<(WorkoutId, &Workout)> {
        let wanted = name.trim().to_uppercase();
        self.iter()
            .find(|(_, workout)| workout.name.to_uppercase() == wanted)
    }

    /// Workouts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (WorkoutId, &Workout)> + '_ {
        self.order.iter().map(|id| (*id, &self.workouts[*id]))
    }

    pub fn ids(&self) -> &[WorkoutId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}
