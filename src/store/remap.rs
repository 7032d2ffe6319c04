//! Fresh ids for records copied from one entity to another.
//!
//! Copying a prediction (or annotation) must not share region ids with the
//! source. The rewrite is done in two passes over the records: the first
//! builds the full old -> new table, the second rewrites ids, parent links
//! and relation endpoints through it. A parent link whose target was not
//! copied becomes `None`; a relation with a missing endpoint is dropped.

use std::collections::BTreeMap;

use crate::model::{RegionId, WireRecord, WireResult};

/// Copies `records` with fresh region ids, keeping only results `keep`
/// accepts.
pub fn remap_records<F>(records: &[WireRecord], keep: F) -> Vec<WireRecord>
where
    F: Fn(&WireResult) -> bool,
{
    let mut table: BTreeMap<&str, String> = BTreeMap::new();
    for result in records.iter().filter_map(WireRecord::as_result) {
        if keep(result) && !table.contains_key(result.id.as_str()) {
            table.insert(result.id.as_str(), RegionId::generate().to_string());
        }
    }

    records
        .iter()
        .filter_map(|record| match record {
            WireRecord::Result(result) => {
                let id = table.get(result.id.as_str())?;
                if !keep(result) {
                    return None;
                }
                let mut copy = result.clone();
                copy.id = id.clone();
                copy.parent_id = result
                    .parent_id
                    .as_deref()
                    .and_then(|parent| table.get(parent))
                    .cloned();
                Some(WireRecord::Result(copy))
            }
            WireRecord::Relation(relation) => {
                let from = table.get(relation.from_id.as_str())?;
                let to = table.get(relation.to_id.as_str())?;
                let mut copy = relation.clone();
                copy.from_id = from.clone();
                copy.to_id = to.clone();
                Some(WireRecord::Relation(copy))
            }
        })
        .collect()
}
