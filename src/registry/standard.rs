//! The standard tag set.

use std::sync::Arc;

use serde_json::Value;

use super::{ComponentView, TagModel, TagRegistry, ToolModel};
use crate::model::{RegionKind, ResultType};

const IMAGE: &[&str] = &["image"];
const LABEL_TARGETS: &[&str] = &["image", "text", "hypertext", "audio", "video", "paragraphs"];

const LABEL_PARENTS: &[&str] = &[
    "labels",
    "rectanglelabels",
    "polygonlabels",
    "keypointlabels",
    "ellipselabels",
    "brushlabels",
    "hypertextlabels",
    "paragraphlabels",
];

pub(super) fn register_all(registry: &mut TagRegistry) {
    let mut tag = |type_name: &str, model: TagModel, component: &str| {
        registry.add_tag(
            type_name,
            model,
            Arc::new(ComponentView(component.to_string())),
        );
    };

    // Layout
    tag("view", TagModel::visual("view"), "View");
    tag("header", TagModel::visual("header"), "Header");
    tag("style", TagModel::visual("style"), "Style");
    tag("repeater", TagModel::visual("repeater"), "Repeater");
    tag("relations", TagModel::visual("relations"), "Relations");

    // Objects
    for (name, component) in [
        ("image", "ImageView"),
        ("text", "TextView"),
        ("hypertext", "HyperTextView"),
        ("audio", "AudioView"),
        ("video", "VideoView"),
        ("paragraphs", "ParagraphsView"),
        ("table", "TableView"),
        ("list", "ListView"),
    ] {
        tag(name, TagModel::object(name), component);
    }

    // Controls
    tag(
        "labels",
        TagModel::control("labels", ResultType::Labels, LABEL_TARGETS),
        "Labels",
    );
    tag(
        "rectanglelabels",
        TagModel::control("rectanglelabels", ResultType::RectangleLabels, IMAGE),
        "RectangleLabels",
    );
    tag(
        "polygonlabels",
        TagModel::control("polygonlabels", ResultType::PolygonLabels, IMAGE),
        "PolygonLabels",
    );
    tag(
        "keypointlabels",
        TagModel::control("keypointlabels", ResultType::KeyPointLabels, IMAGE),
        "KeyPointLabels",
    );
    tag(
        "ellipselabels",
        TagModel::control("ellipselabels", ResultType::EllipseLabels, IMAGE),
        "EllipseLabels",
    );
    tag(
        "brushlabels",
        TagModel::control("brushlabels", ResultType::BrushLabels, IMAGE),
        "BrushLabels",
    );
    tag(
        "hypertextlabels",
        TagModel::control("hypertextlabels", ResultType::HyperTextLabels, &["hypertext"]),
        "HyperTextLabels",
    );
    tag(
        "paragraphlabels",
        TagModel::control("paragraphlabels", ResultType::ParagraphLabels, &["paragraphs"]),
        "ParagraphLabels",
    );
    tag(
        "rectangle",
        TagModel::control("rectangle", ResultType::Rectangle, IMAGE),
        "Rectangle",
    );
    tag(
        "polygon",
        TagModel::control("polygon", ResultType::Polygon, IMAGE),
        "Polygon",
    );
    tag(
        "keypoint",
        TagModel::control("keypoint", ResultType::KeyPoint, IMAGE),
        "KeyPoint",
    );
    tag(
        "ellipse",
        TagModel::control("ellipse", ResultType::Ellipse, IMAGE),
        "Ellipse",
    );
    tag(
        "brush",
        TagModel::control("brush", ResultType::Brush, IMAGE),
        "Brush",
    );
    tag(
        "choices",
        TagModel::control("choices", ResultType::Choices, &[]),
        "Choices",
    );
    tag(
        "taxonomy",
        TagModel::control("taxonomy", ResultType::Taxonomy, &[]),
        "Taxonomy",
    );
    tag(
        "textarea",
        TagModel::control("textarea", ResultType::TextArea, &[]),
        "TextArea",
    );
    tag(
        "rating",
        TagModel::control("rating", ResultType::Rating, &[]),
        "Rating",
    );
    tag(
        "number",
        TagModel::control("number", ResultType::Number, &[]),
        "Number",
    );
    tag(
        "datetime",
        TagModel::control("datetime", ResultType::DateTime, &[]),
        "DateTime",
    );
    tag(
        "ranker",
        TagModel::control("ranker", ResultType::Ranker, &["list"]),
        "Ranker",
    );

    // Options
    tag("label", TagModel::label("label", LABEL_PARENTS), "Label");
    tag("choice", TagModel::label("choice", &["choices", "taxonomy"]), "Choice");
    tag("relation", TagModel::label("relation", &["relations"]), "Relation");
    tag("bucket", TagModel::label("bucket", &["ranker"]), "Bucket");

    // Region kinds per object
    registry.add_region_type(RegionKind::Polygon, "image", Some(has_points));
    registry.add_region_type(RegionKind::Ellipse, "image", Some(has_radius));
    registry.add_region_type(RegionKind::Brush, "image", Some(has_rle));
    registry.add_region_type(RegionKind::KeyPoint, "image", Some(is_keypoint));
    registry.add_region_type(RegionKind::Rectangle, "image", None);

    registry.add_region_type(RegionKind::TextRange, "text", None);
    registry.add_region_type(RegionKind::HyperTextRange, "hypertext", None);
    registry.add_region_type(RegionKind::ParagraphRange, "paragraphs", None);
    registry.add_region_type(RegionKind::AudioSegment, "audio", None);
    registry.add_region_type(RegionKind::VideoRectangle, "video", Some(has_sequence));
    registry.add_region_type(RegionKind::RankerBuckets, "list", None);

    // Tools
    for (name, region, controls) in [
        ("rectangle", RegionKind::Rectangle, &["rectangle", "rectanglelabels"][..]),
        ("polygon", RegionKind::Polygon, &["polygon", "polygonlabels"][..]),
        ("keypoint", RegionKind::KeyPoint, &["keypoint", "keypointlabels"][..]),
        ("ellipse", RegionKind::Ellipse, &["ellipse", "ellipselabels"][..]),
        ("brush", RegionKind::Brush, &["brush", "brushlabels"][..]),
    ] {
        registry.add_tool(ToolModel {
            name: name.to_string(),
            region,
            control_types: controls.iter().map(|s| s.to_string()).collect(),
        });
    }
}

fn has_points(value: &Value) -> bool {
    value.get("points").is_some_and(Value::is_array)
}

fn has_radius(value: &Value) -> bool {
    value.get("radiusX").is_some() && value.get("radiusY").is_some()
}

fn has_rle(value: &Value) -> bool {
    value.get("rle").is_some() || value.get("format").and_then(Value::as_str) == Some("rle")
}

fn is_keypoint(value: &Value) -> bool {
    value.get("x").is_some() && value.get("y").is_some() && value.get("width").is_none()
}

fn has_sequence(value: &Value) -> bool {
    value.get("sequence").is_some_and(Value::is_array)
}
