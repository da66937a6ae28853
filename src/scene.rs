//! Scene builder: maps a canonical spec into a declarative render tree
//!
//! The tree is consumed by the markup serializer; nothing here touches
//! external state, so building a scene is deterministic and freely testable.

use serde::Serialize;

use crate::spec::{ChartKind, ChartSpec, Point};

/// Axis orientation within the chart frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Payload of one scene node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    /// Root of the scene
    Chart,
    /// An axis with its caption
    Axis { orient: Orientation, label: String },
    /// The data series, drawn with the primitive matching its kind
    Series { kind: ChartKind, points: Vec<Point> },
    /// Chart title in a fixed layout slot, independent of the data
    Title { text: String },
    /// Labeled horizontal overlay spanning the point domain
    ReferenceLine { value: f64, label: String },
}

/// A node of the declarative render tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Iterate the direct children whose kind is a reference line.
    pub fn reference_lines(&self) -> impl Iterator<Item = &SceneNode> {
        self.children
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::ReferenceLine { .. }))
    }
}

/// Build the render tree for a spec.
///
/// Child order is fixed: x axis, y axis, series, title, then reference lines
/// in request order. The unsupported-type case cannot arise here; the
/// normalizer owns that rejection, which keeps this function total.
pub fn build(spec: &ChartSpec) -> SceneNode {
    let mut children = vec![
        SceneNode::leaf(NodeKind::Axis {
            orient: Orientation::Horizontal,
            label: spec.xlabel.clone(),
        }),
        SceneNode::leaf(NodeKind::Axis {
            orient: Orientation::Vertical,
            label: spec.ylabel.clone(),
        }),
        SceneNode::leaf(NodeKind::Series {
            kind: spec.kind,
            points: spec.points.clone(),
        }),
        SceneNode::leaf(NodeKind::Title {
            text: spec.title.clone(),
        }),
    ];

    children.extend(spec.reference_lines.iter().map(|line| {
        SceneNode::leaf(NodeKind::ReferenceLine {
            value: line.value,
            label: line.label.clone(),
        })
    }));

    SceneNode {
        kind: NodeKind::Chart,
        children,
    }
}
