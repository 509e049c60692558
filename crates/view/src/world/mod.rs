mod keys;
mod store;

pub use keys::{ActionKind, EntityKind, MAP_DIR_KEY, TIMESTEPS_KEY};
pub use store::{MergeReport, WorldError, WorldStore};
