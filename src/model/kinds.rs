//! Closed enumerations for result types and region kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a result, as it appears in the wire `type` field.
///
/// Control tags declare which result type they produce; the type in turn
/// decides which key of `value` holds the main payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Labels,
    RectangleLabels,
    PolygonLabels,
    KeyPointLabels,
    EllipseLabels,
    BrushLabels,
    HyperTextLabels,
    ParagraphLabels,
    Choices,
    Taxonomy,
    TextArea,
    Rating,
    Ranker,
    Number,
    DateTime,
    Rectangle,
    Polygon,
    KeyPoint,
    Ellipse,
    Brush,
}

/// The payload shape a result type stores under its value key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    /// `["a", "b"]`
    StringList,
    /// `[["root", "leaf"], ...]`
    PathList,
    /// A single number.
    Number,
    /// A single string.
    Text,
    /// `{"bucket": ["item", ...]}`
    Buckets,
    /// No main payload; the region geometry is the value.
    Geometry,
}

impl ResultType {
    pub const ALL: [ResultType; 20] = [
        ResultType::Labels,
        ResultType::RectangleLabels,
        ResultType::PolygonLabels,
        ResultType::KeyPointLabels,
        ResultType::EllipseLabels,
        ResultType::BrushLabels,
        ResultType::HyperTextLabels,
        ResultType::ParagraphLabels,
        ResultType::Choices,
        ResultType::Taxonomy,
        ResultType::TextArea,
        ResultType::Rating,
        ResultType::Ranker,
        ResultType::Number,
        ResultType::DateTime,
        ResultType::Rectangle,
        ResultType::Polygon,
        ResultType::KeyPoint,
        ResultType::Ellipse,
        ResultType::Brush,
    ];

    /// The wire name (`"rectanglelabels"`, `"textarea"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Labels => "labels",
            ResultType::RectangleLabels => "rectanglelabels",
            ResultType::PolygonLabels => "polygonlabels",
            ResultType::KeyPointLabels => "keypointlabels",
            ResultType::EllipseLabels => "ellipselabels",
            ResultType::BrushLabels => "brushlabels",
            ResultType::HyperTextLabels => "hypertextlabels",
            ResultType::ParagraphLabels => "paragraphlabels",
            ResultType::Choices => "choices",
            ResultType::Taxonomy => "taxonomy",
            ResultType::TextArea => "textarea",
            ResultType::Rating => "rating",
            ResultType::Ranker => "ranker",
            ResultType::Number => "number",
            ResultType::DateTime => "datetime",
            ResultType::Rectangle => "rectangle",
            ResultType::Polygon => "polygon",
            ResultType::KeyPoint => "keypoint",
            ResultType::Ellipse => "ellipse",
            ResultType::Brush => "brush",
        }
    }

    /// Parses a wire name, the inverse of [`ResultType::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// The key inside `value` that carries the main payload, if any.
    pub fn value_key(&self) -> Option<&'static str> {
        match self {
            ResultType::TextArea => Some("text"),
            ResultType::Rectangle
            | ResultType::Polygon
            | ResultType::KeyPoint
            | ResultType::Ellipse
            | ResultType::Brush => None,
            other => Some(other.as_str()),
        }
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            ResultType::Taxonomy => ValueShape::PathList,
            ResultType::Rating | ResultType::Number => ValueShape::Number,
            ResultType::DateTime => ValueShape::Text,
            ResultType::Ranker => ValueShape::Buckets,
            ResultType::Rectangle
            | ResultType::Polygon
            | ResultType::KeyPoint
            | ResultType::Ellipse
            | ResultType::Brush => ValueShape::Geometry,
            _ => ValueShape::StringList,
        }
    }

    /// True for the `*labels` family.
    pub fn is_labels(&self) -> bool {
        self.as_str().ends_with("labels")
    }

    /// Region kind implied by the result type alone, when it is unambiguous.
    pub fn implied_region(&self) -> Option<RegionKind> {
        match self {
            ResultType::Rectangle | ResultType::RectangleLabels => Some(RegionKind::Rectangle),
            ResultType::Polygon | ResultType::PolygonLabels => Some(RegionKind::Polygon),
            ResultType::KeyPoint | ResultType::KeyPointLabels => Some(RegionKind::KeyPoint),
            ResultType::Ellipse | ResultType::EllipseLabels => Some(RegionKind::Ellipse),
            ResultType::Brush | ResultType::BrushLabels => Some(RegionKind::Brush),
            ResultType::HyperTextLabels => Some(RegionKind::HyperTextRange),
            ResultType::ParagraphLabels => Some(RegionKind::ParagraphRange),
            ResultType::Ranker => Some(RegionKind::RankerBuckets),
            _ => None,
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a region: where inside an object something was labeled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Rectangle,
    Polygon,
    KeyPoint,
    Ellipse,
    Brush,
    TextRange,
    HyperTextRange,
    ParagraphRange,
    AudioSegment,
    VideoRectangle,
    RankerBuckets,
    /// Object-level area with no geometry (choices, ratings, ...).
    Classification,
}

impl RegionKind {
    /// Whether a region of this kind needs geometry to be exported.
    pub fn requires_shape(&self) -> bool {
        !matches!(self, RegionKind::Classification | RegionKind::RankerBuckets)
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::Rectangle => "rectangle",
            RegionKind::Polygon => "polygon",
            RegionKind::KeyPoint => "keypoint",
            RegionKind::Ellipse => "ellipse",
            RegionKind::Brush => "brush",
            RegionKind::TextRange => "textrange",
            RegionKind::HyperTextRange => "hypertextrange",
            RegionKind::ParagraphRange => "paragraphrange",
            RegionKind::AudioSegment => "audiosegment",
            RegionKind::VideoRectangle => "videorectangle",
            RegionKind::RankerBuckets => "rankerbuckets",
            RegionKind::Classification => "classification",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_roundtrip_through_serde() {
        for ty in ResultType::ALL {
            let json = serde_json::to_string(&ty).expect("serialize");
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            assert_eq!(ResultType::from_name(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn textarea_stores_under_text_key() {
        assert_eq!(ResultType::TextArea.value_key(), Some("text"));
        assert_eq!(ResultType::Rectangle.value_key(), None);
        assert_eq!(
            ResultType::RectangleLabels.value_key(),
            Some("rectanglelabels")
        );
    }

    #[test]
    fn labels_family() {
        assert!(ResultType::Labels.is_labels());
        assert!(ResultType::BrushLabels.is_labels());
        assert!(!ResultType::Choices.is_labels());
    }
}
