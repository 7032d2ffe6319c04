#![allow(dead_code)]

use std::collections::BTreeSet;

use labelcore::model::{WireRecord, WireRelation, WireResult};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::json;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Distinct label names such as `Cat`, `Dogs`, `Xq`.
pub fn arb_label_names(max: usize) -> BoxedStrategy<Vec<String>> {
    proptest::collection::btree_set("[A-Z][a-z]{1,6}", 1..=max)
        .prop_map(|set| set.into_iter().collect())
        .boxed()
}

/// A rectangle-labels configuration over one image.
pub fn image_config(labels: &[String]) -> String {
    let mut out = String::from("<View>\n  <Image name=\"img\" value=\"$image\"/>\n");
    out.push_str("  <RectangleLabels name=\"label\" toName=\"img\">\n");
    for label in labels {
        out.push_str(&format!("    <Label value=\"{label}\"/>\n"));
    }
    out.push_str("  </RectangleLabels>\n</View>");
    out
}

/// Shape of a generated annotation: one label index per region, an optional
/// parent index per region, and relations as index pairs.
#[derive(Clone, Debug)]
pub struct RecordPlan {
    pub labels: Vec<usize>,
    pub parents: Vec<Option<usize>>,
    pub relations: Vec<(usize, usize)>,
}

pub fn arb_record_plan(max_regions: usize) -> BoxedStrategy<RecordPlan> {
    (1..=max_regions)
        .prop_flat_map(|n| {
            (
                proptest::collection::vec(0usize..8, n),
                proptest::collection::vec(proptest::option::of(0..n), n),
                proptest::collection::vec((0..n, 0..n), 0..=n),
            )
        })
        .prop_map(|(labels, parents, relations)| RecordPlan {
            labels,
            parents,
            relations,
        })
        .boxed()
}

/// Materializes a plan into wire records. Region `i` gets id `r{i}`.
pub fn plan_records(plan: &RecordPlan, label_names: &[String]) -> Vec<WireRecord> {
    let mut records: Vec<WireRecord> = plan
        .labels
        .iter()
        .zip(&plan.parents)
        .enumerate()
        .map(|(i, (label, parent))| {
            let label = &label_names[label % label_names.len()];
            let mut result: WireResult = serde_json::from_value(json!({
                "id": format!("r{i}"),
                "from_name": "label",
                "to_name": "img",
                "type": "rectanglelabels",
                "value": {"x": i, "y": i, "width": 1, "height": 1, "rectanglelabels": [label]}
            }))
            .expect("build result");
            result.parent_id = parent.filter(|p| *p != i).map(|p| format!("r{p}"));
            WireRecord::Result(result)
        })
        .collect();

    records.extend(plan.relations.iter().map(|(from, to)| {
        let relation: WireRelation = serde_json::from_value(json!({
            "from_id": format!("r{from}"),
            "to_id": format!("r{to}"),
            "type": "relation"
        }))
        .expect("build relation");
        WireRecord::Relation(relation)
    }));
    records
}

/// Every parent link and relation endpoint names a result in `records`.
pub fn assert_links_resolve(records: &[WireRecord]) -> Result<(), String> {
    let ids: BTreeSet<&str> = records
        .iter()
        .filter_map(WireRecord::as_result)
        .map(|r| r.id.as_str())
        .collect();

    for record in records {
        match record {
            WireRecord::Result(result) => {
                if let Some(parent) = &result.parent_id {
                    if !ids.contains(parent.as_str()) {
                        return Err(format!("result {} has dangling parent {parent}", result.id));
                    }
                }
            }
            WireRecord::Relation(relation) => {
                for end in [&relation.from_id, &relation.to_id] {
                    if !ids.contains(end.as_str()) {
                        return Err(format!("relation endpoint {end} is not a result"));
                    }
                }
            }
        }
    }
    Ok(())
}
