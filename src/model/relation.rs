//! Directed links between two regions of the same annotation.

use super::ids::RegionId;
use super::wire::{RelationDirection, RelationTag, WireRelation};

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub from_id: RegionId,
    pub to_id: RegionId,
    pub direction: RelationDirection,
    pub labels: Vec<String>,
}

impl Relation {
    pub fn new(from_id: RegionId, to_id: RegionId) -> Self {
        Self {
            from_id,
            to_id,
            direction: RelationDirection::default(),
            labels: vec![],
        }
    }

    /// Whether either end of the relation is `region`.
    pub fn touches(&self, region: &RegionId) -> bool {
        &self.from_id == region || &self.to_id == region
    }

    pub fn to_wire(&self) -> WireRelation {
        WireRelation {
            from_id: self.from_id.to_string(),
            to_id: self.to_id.to_string(),
            tag: RelationTag::Relation,
            direction: self.direction,
            labels: self.labels.clone(),
        }
    }

    pub fn from_wire(wire: &WireRelation) -> Self {
        Self {
            from_id: RegionId::new(wire.from_id.clone()),
            to_id: RegionId::new(wire.to_id.clone()),
            direction: wire.direction,
            labels: wire.labels.clone(),
        }
    }
}
