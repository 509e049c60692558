use std::collections::HashMap;

use crate::net::{Action, AreaInfo, Entity, Record};

use super::keys::{EntityKind, MAP_DIR_KEY, TIMESTEPS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// `update` was called without a record; nothing was changed.
    #[error("update called without a record")]
    InvalidRecord,
}

/// What one `update` call did not apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entities dropped from the batch because their `type` maps to no
    /// category, as `(id, type)` pairs. The rest of the batch still applied.
    pub skipped: Vec<(i32, String)>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// The local mirror of the remote simulation world.
///
/// Entities live in an id index plus one bucket per category; areas,
/// actions and config are replaced wholesale by each record that carries
/// them. Mutation happens only through [`WorldStore::update`] and
/// [`WorldStore::clear`]; reads concurrent with updates need external
/// synchronization.
#[derive(Debug)]
pub struct WorldStore {
    time: u32,
    max_time_step: u32,
    map_name: Option<String>,
    scale: f32,
    config: HashMap<String, String>,
    areas: Vec<AreaInfo>,
    actions: Vec<Action>,
    entities: HashMap<i32, Entity>,
    buckets: HashMap<EntityKind, Vec<i32>>,
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStore {
    pub fn new() -> Self {
        Self {
            time: 0,
            max_time_step: 0,
            map_name: None,
            scale: 1.0,
            config: HashMap::new(),
            areas: Vec::new(),
            actions: Vec::new(),
            entities: HashMap::new(),
            buckets: EntityKind::BUCKETED
                .into_iter()
                .map(|kind| (kind, Vec::new()))
                .collect(),
        }
    }

    /// Forget everything, including the map name and clock.
    pub fn clear(&mut self) {
        self.clear_session_state();
        self.map_name = None;
        self.time = 0;
        self.max_time_step = 0;
    }

    fn clear_session_state(&mut self) {
        self.clear_entities();
        self.areas.clear();
        self.actions.clear();
        self.config.clear();
    }

    fn clear_entities(&mut self) {
        self.entities.clear();
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
    }

    /// Fold one record into the store.
    ///
    /// Applies config, map and command replacement, then the entity batch
    /// (full snapshot if `world` is present, deltas from `changes`
    /// otherwise), then the clock. Entities whose type maps to no category
    /// are skipped and reported; everything already applied stays applied.
    pub fn update(&mut self, record: Option<&Record>) -> Result<MergeReport, WorldError> {
        let record = record.ok_or(WorldError::InvalidRecord)?;
        let mut report = MergeReport::default();

        if let Some(config) = &record.config {
            if let Some(name) = config.get(MAP_DIR_KEY) {
                // Any map announcement on a loaded world starts a fresh
                // session, whether or not the name changed.
                if self.map_name.is_some() {
                    log::info!("map {name:?} announced, resetting world state");
                    self.clear_session_state();
                }
                self.map_name = Some(name.clone());
            }
            if let Some(steps) = config.get(TIMESTEPS_KEY) {
                match steps.parse::<u32>() {
                    Ok(value) => self.max_time_step = value,
                    Err(_) => log::warn!("unparsable {TIMESTEPS_KEY} entry: {steps:?}"),
                }
            }
            // Last write wins.
            self.config = config.clone();
        }

        if let Some(map) = &record.map {
            self.areas = map.clone();
        }
        if let Some(commands) = &record.commands {
            self.actions = commands.clone();
        }

        let batch = if let Some(world) = &record.world {
            // Full snapshot: the incoming list is the whole world.
            self.clear_entities();
            Some(world)
        } else {
            record.changes.as_ref()
        };

        if let Some(batch) = batch {
            for incoming in batch {
                if let Some(existing) = self.entities.get_mut(&incoming.id) {
                    existing.merge_from(incoming);
                    continue;
                }
                let bucket = EntityKind::from_name(&incoming.kind).filter(|kind| kind.has_bucket());
                let Some(kind) = bucket else {
                    log::warn!(
                        "skipping entity {} with unknown type {:?}",
                        incoming.id,
                        incoming.kind
                    );
                    report.skipped.push((incoming.id, incoming.kind.clone()));
                    continue;
                };
                if let Some(ids) = self.buckets.get_mut(&kind) {
                    ids.push(incoming.id);
                }
                self.entities.insert(incoming.id, incoming.clone());
            }
        }

        // Zero means "no time information", not tick 0.
        if record.time != 0 {
            self.time = record.time;
        }

        Ok(report)
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn max_time_step(&self) -> u32 {
        self.max_time_step
    }

    pub fn map_name(&self) -> Option<&str> {
        self.map_name.as_deref()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn config(&self) -> &HashMap<String, String> {
        &self.config
    }

    pub fn areas(&self) -> &[AreaInfo] {
        &self.areas
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn entity(&self, id: i32) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_ids(&self) -> Vec<i32> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All registered entities of one category, in registration order.
    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.buckets
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.buckets.get(&kind).map_or(0, Vec::len)
    }
}
