//! Result and region data model.
//!
//! An [`Annotation`] owns an ordered list of [`Region`]s; each region carries
//! the [`ResultItem`]s that controls attached to it. Results point at their
//! tags by [`ScopedName`](crate::tags::ScopedName) only, and are converted
//! to and from the flat [`WireRecord`] JSON format at the edges.

mod annotation;
mod history;
mod ids;
mod kinds;
mod region;
mod relation;
mod value;
mod wire;

pub use annotation::{Annotation, AnnotationState, EntityKind, Versions};
pub use history::{History, Snapshot, DEFAULT_HISTORY_LIMIT};
pub use ids::{guid, AnnotationId, RegionId, ResultId, TagId};
pub use kinds::{RegionKind, ResultType, ValueShape};
pub use region::{Region, ResultItem, MANUAL_ORIGIN};
pub use relation::Relation;
pub use value::MainValue;
pub use wire::{RelationDirection, RelationTag, WireRecord, WireRelation, WireResult};
