//! Static registries translating wire type names to fixed categories,
//! plus the config keys the merge engine reacts to.

/// Config entry naming the map directory; a record carrying it announces a
/// session.
pub const MAP_DIR_KEY: &str = "gis.map.dir";

/// Config entry carrying the total number of simulation steps.
pub const TIMESTEPS_KEY: &str = "kernel.timesteps";

/// The category bucket an entity's `type` string maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityKind {
    Unknown = 0,
    TacticsAmbulance = 1,
    TacticsFire = 2,
    TacticsPolice = 3,
    ControlAmbulance = 4,
    ControlFire = 5,
    ControlPolice = 6,
    Civilian = 7,
    Refuge = 8,
    Building = 9,
    Road = 10,
    Blockade = 11,
    GasStation = 12,
    Hydrant = 13,
    Area = 14,
}

impl EntityKind {
    /// Kinds that get their own bucket in the world store.
    pub const BUCKETED: [EntityKind; 13] = [
        EntityKind::TacticsAmbulance,
        EntityKind::TacticsFire,
        EntityKind::TacticsPolice,
        EntityKind::Civilian,
        EntityKind::Blockade,
        EntityKind::ControlAmbulance,
        EntityKind::ControlFire,
        EntityKind::ControlPolice,
        EntityKind::Road,
        EntityKind::Hydrant,
        EntityKind::Building,
        EntityKind::Refuge,
        EntityKind::GasStation,
    ];

    pub fn from_name(name: &str) -> Option<EntityKind> {
        match name {
            "Unknown" => Some(EntityKind::Unknown),
            "TacticsAmbulance" => Some(EntityKind::TacticsAmbulance),
            "TacticsFire" => Some(EntityKind::TacticsFire),
            "TacticsPolice" => Some(EntityKind::TacticsPolice),
            "ControlAmbulance" => Some(EntityKind::ControlAmbulance),
            "ControlFire" => Some(EntityKind::ControlFire),
            "ControlPolice" => Some(EntityKind::ControlPolice),
            "Civilian" => Some(EntityKind::Civilian),
            "Refuge" => Some(EntityKind::Refuge),
            "Building" => Some(EntityKind::Building),
            "Road" => Some(EntityKind::Road),
            "Blockade" => Some(EntityKind::Blockade),
            "GasStation" => Some(EntityKind::GasStation),
            "Hydrant" => Some(EntityKind::Hydrant),
            "Area" => Some(EntityKind::Area),
            _ => None,
        }
    }

    /// Whether entities of this kind are registrable in the store.
    pub fn has_bucket(self) -> bool {
        !matches!(self, EntityKind::Unknown | EntityKind::Area)
    }
}

/// What an [`Action`](crate::net::Action)'s `type` string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionKind {
    Unknown = 0,
    Move = 1,
    Rest = 2,
    Load = 3,
    Unload = 4,
    Rescue = 5,
    Extinguish = 6,
    Clear = 7,
    LClear = 8,
    Radio = 9,
    Voice = 10,
    Subscribe = 11,
    Tell = 12,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Option<ActionKind> {
        match name {
            "Unknown" => Some(ActionKind::Unknown),
            "Move" => Some(ActionKind::Move),
            "Rest" => Some(ActionKind::Rest),
            "Load" => Some(ActionKind::Load),
            "Unload" => Some(ActionKind::Unload),
            "Rescue" => Some(ActionKind::Rescue),
            "Extinguish" => Some(ActionKind::Extinguish),
            "Clear" => Some(ActionKind::Clear),
            "LClear" => Some(ActionKind::LClear),
            "Radio" => Some(ActionKind::Radio),
            "Voice" => Some(ActionKind::Voice),
            "Subscribe" => Some(ActionKind::Subscribe),
            "Tell" => Some(ActionKind::Tell),
            _ => None,
        }
    }
}
