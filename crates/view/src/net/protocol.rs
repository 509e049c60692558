use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Default kernel port announced by the simulation server.
pub const DEFAULT_PORT: u16 = 7000;

bitflags! {
    /// What a [`Request`] asks the server for. Flags combine freely.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RequestFlags: u32 {
        const OPEN       = 1 << 0;
        const CLOSE      = 1 << 1;
        const ACTION     = 1 << 2;
        const UPDATE     = 1 << 3;
        const WORLD      = 1 << 4;
        const PERCEPTION = 1 << 5;
        const CONFIG     = 1 << 6;
        const MAP        = 1 << 7;
    }
}

/// One client request. Immutable once sent.
///
/// The bitmask travels as a plain integer on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
}

impl Request {
    pub fn new(flags: RequestFlags) -> Self {
        Self {
            request: flags.bits(),
            time: None,
        }
    }

    pub fn open() -> Self {
        Self::new(RequestFlags::OPEN)
    }

    pub fn close() -> Self {
        Self::new(RequestFlags::CLOSE)
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = Some(time);
        self
    }

    pub fn flags(&self) -> RequestFlags {
        RequestFlags::from_bits_truncate(self.request)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::open()
    }
}

/// The server's answer to one request; at most one per received frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub request: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
}

/// World state for one simulation tick.
///
/// `world` means "full snapshot, replace everything"; `changes` alone means
/// "fold these deltas into what you have".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Vec<AreaInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: Point,
    pub end: Point,
}

/// Static map topology; replaced wholesale, never merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaInfo {
    #[serde(default)]
    pub id: i32,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub neighbours: Vec<i32>,
}

/// A command issued by an agent. Immutable once created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub id: i32,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub path: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<i32>,
}

/// One simulated entity. Every field besides `id` and `type` is optional:
/// presence means "this changed", absence means "no information".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: i32,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buried: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockades: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiery: Option<i32>,
    #[serde(rename = "repairCost", default, skip_serializing_if = "Option::is_none")]
    pub repair_cost: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apexes: Option<Vec<Point>>,
}

impl Entity {
    pub fn new(id: i32, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Fold a delta for the same entity into this one.
    ///
    /// Only fields the incoming entity actually carries are overwritten;
    /// `id` and `type` are fixed for the entity's lifetime.
    pub fn merge_from(&mut self, incoming: &Entity) {
        if self.id != incoming.id {
            return;
        }
        if incoming.deleted.is_some() {
            self.deleted = incoming.deleted;
        }
        if incoming.x.is_some() {
            self.x = incoming.x;
        }
        if incoming.y.is_some() {
            self.y = incoming.y;
        }
        if incoming.position.is_some() {
            self.position = incoming.position;
        }
        if incoming.damage.is_some() {
            self.damage = incoming.damage;
        }
        if incoming.buried.is_some() {
            self.buried = incoming.buried;
        }
        if incoming.hp.is_some() {
            self.hp = incoming.hp;
        }
        if incoming.history.is_some() {
            self.history = incoming.history.clone();
        }
        if incoming.travel.is_some() {
            self.travel = incoming.travel;
        }
        if incoming.board.is_some() {
            self.board = incoming.board;
        }
        if incoming.water.is_some() {
            self.water = incoming.water;
        }
        if incoming.blockades.is_some() {
            self.blockades = incoming.blockades.clone();
        }
        if incoming.temp.is_some() {
            self.temp = incoming.temp;
        }
        if incoming.broken.is_some() {
            self.broken = incoming.broken;
        }
        if incoming.fiery.is_some() {
            self.fiery = incoming.fiery;
        }
        if incoming.repair_cost.is_some() {
            self.repair_cost = incoming.repair_cost;
        }
        if incoming.apexes.is_some() {
            self.apexes = incoming.apexes.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_round_trip_through_the_bitmask() {
        let req = Request::new(RequestFlags::OPEN | RequestFlags::WORLD | RequestFlags::CONFIG);
        assert_eq!(req.request, 1 | 16 | 64);
        assert_eq!(
            req.flags(),
            RequestFlags::OPEN | RequestFlags::WORLD | RequestFlags::CONFIG
        );
        assert_eq!(Request::default().request, 1);
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut entity = Entity::new(1, "Civilian");
        entity.x = Some(5);
        entity.hp = Some(10);

        let mut delta = Entity::new(1, "Civilian");
        delta.hp = Some(8);
        entity.merge_from(&delta);

        assert_eq!(entity.x, Some(5));
        assert_eq!(entity.hp, Some(8));
    }

    #[test]
    fn merge_ignores_foreign_ids() {
        let mut entity = Entity::new(1, "Civilian");
        entity.hp = Some(10);

        let mut delta = Entity::new(2, "Civilian");
        delta.hp = Some(3);
        entity.merge_from(&delta);

        assert_eq!(entity.hp, Some(10));
    }

    #[test]
    fn merge_replaces_list_fields_wholesale() {
        let mut entity = Entity::new(7, "TacticsFire");
        entity.history = Some(vec![Point { x: 1, y: 1 }, Point { x: 2, y: 2 }]);

        let mut delta = Entity::new(7, "TacticsFire");
        delta.history = Some(vec![Point { x: 3, y: 3 }]);
        entity.merge_from(&delta);

        assert_eq!(entity.history, Some(vec![Point { x: 3, y: 3 }]));
    }
}
