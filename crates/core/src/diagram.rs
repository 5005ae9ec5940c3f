//! Diagram specification.
//!
//! A diagram is a single slide of labelled nodes joined by connections,
//! optionally grouped in containers and annotated. Coordinates are abstract
//! design units: the generator lays nodes out on a canvas roughly 1333 units
//! wide and 650 high. Enumerated fields accept any string so that an
//! unexpected value from the generator degrades to a default instead of
//! rejecting the whole diagram. Colors are not part of the model; renderers
//! take them from the brand palette.

use serde::{Deserialize, Serialize};

/// Default node width, in design units.
pub const DEFAULT_NODE_WIDTH: f64 = 200.0;

/// Default node height, in design units.
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// Padding between a container's edge and its outermost nodes.
pub const CONTAINER_PADDING: f64 = 20.0;

/// What the diagram depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiagramKind {
    #[default]
    Process,
    Architecture,
    Hierarchy,
    Comparison,
    Cycle,
    Timeline,
}

impl From<String> for DiagramKind {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "architecture" => DiagramKind::Architecture,
            "hierarchy" => DiagramKind::Hierarchy,
            "comparison" => DiagramKind::Comparison,
            "cycle" => DiagramKind::Cycle,
            "timeline" => DiagramKind::Timeline,
            _ => DiagramKind::Process,
        }
    }
}

impl From<DiagramKind> for String {
    fn from(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Process => "process",
            DiagramKind::Architecture => "architecture",
            DiagramKind::Hierarchy => "hierarchy",
            DiagramKind::Comparison => "comparison",
            DiagramKind::Cycle => "cycle",
            DiagramKind::Timeline => "timeline",
        }
        .to_string()
    }
}

/// Outline of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeShape {
    Rectangle,
    #[default]
    RoundedRectangle,
    Circle,
    Diamond,
    Cloud,
    /// Data stores.
    Cylinder,
    Process,
    Decision,
    Data,
}

impl From<String> for NodeShape {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "rectangle" | "box" => NodeShape::Rectangle,
            "circle" | "oval" | "ellipse" => NodeShape::Circle,
            "diamond" => NodeShape::Diamond,
            "cloud" => NodeShape::Cloud,
            "cylinder" | "database" => NodeShape::Cylinder,
            "process" => NodeShape::Process,
            "decision" => NodeShape::Decision,
            "data" => NodeShape::Data,
            _ => NodeShape::RoundedRectangle,
        }
    }
}

impl From<NodeShape> for String {
    fn from(shape: NodeShape) -> Self {
        match shape {
            NodeShape::Rectangle => "rectangle",
            NodeShape::RoundedRectangle => "rounded-rectangle",
            NodeShape::Circle => "circle",
            NodeShape::Diamond => "diamond",
            NodeShape::Cloud => "cloud",
            NodeShape::Cylinder => "cylinder",
            NodeShape::Process => "process",
            NodeShape::Decision => "decision",
            NodeShape::Data => "data",
        }
        .to_string()
    }
}

/// Line pattern of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// A point in design units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Default for Point {
    fn default() -> Self {
        Self { x: 100.0, y: 100.0 }
    }
}

/// A size in design units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
        }
    }
}

/// Axis-aligned box in design units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub shape: NodeShape,
    pub description: String,
    /// 1-based tier; picks the fill color. Missing means the first tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    pub position: Point,
    pub size: Size,
}

impl DiagramNode {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.position.x,
            y: self.position.y,
            width: self.size.width.max(1.0),
            height: self.size.height.max(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub label: String,
    /// `arrow`, `double-arrow`, `dashed` or `line`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `solid`, `dashed` or `dotted`.
    pub style: String,
}

impl Connection {
    pub fn line_style(&self) -> LineStyle {
        match (self.kind.trim(), self.style.trim()) {
            (_, "dotted") => LineStyle::Dotted,
            ("dashed", _) | (_, "dashed") => LineStyle::Dashed,
            _ => LineStyle::Solid,
        }
    }

    /// Whether an arrowhead is drawn at the source end.
    pub fn arrow_at_source(&self) -> bool {
        self.kind.trim() == "double-arrow"
    }

    /// Whether an arrowhead is drawn at the target end.
    pub fn arrow_at_target(&self) -> bool {
        self.kind.trim() != "line"
    }
}

/// A labelled group drawn behind its nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub id: String,
    pub label: String,
    pub nodes: Vec<String>,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    pub text: String,
    pub position: Point,
    pub style: String,
}

/// A complete diagram.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramSpec {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    /// Free-form layout hint (`horizontal`, `layered`, ...).
    pub layout: String,
    pub nodes: Vec<DiagramNode>,
    pub connections: Vec<Connection>,
    pub containers: Vec<Container>,
    pub annotations: Vec<Annotation>,
}

impl DiagramSpec {
    /// Node by id.
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Connections whose both ends name an existing node.
    pub fn resolved_connections(&self) -> impl Iterator<Item = (&Connection, &DiagramNode, &DiagramNode)> {
        self.connections.iter().filter_map(|c| {
            let from = self.node(&c.from)?;
            let to = self.node(&c.to)?;
            Some((c, from, to))
        })
    }

    /// Box around the container's known nodes, padded by
    /// [`CONTAINER_PADDING`]. `None` when none of its nodes exist.
    pub fn container_bounds(&self, container: &Container) -> Option<Bounds> {
        let boxes: Vec<Bounds> = container
            .nodes
            .iter()
            .filter_map(|id| self.node(id))
            .map(DiagramNode::bounds)
            .collect();
        if boxes.is_empty() {
            return None;
        }

        let min_x = boxes.iter().map(|b| b.x).fold(f64::INFINITY, f64::min);
        let min_y = boxes.iter().map(|b| b.y).fold(f64::INFINITY, f64::min);
        let max_x = boxes.iter().map(|b| b.x + b.width).fold(f64::NEG_INFINITY, f64::max);
        let max_y = boxes.iter().map(|b| b.y + b.height).fold(f64::NEG_INFINITY, f64::max);
        Some(Bounds {
            x: min_x - CONTAINER_PADDING,
            y: min_y - CONTAINER_PADDING,
            width: max_x - min_x + 2.0 * CONTAINER_PADDING,
            height: max_y - min_y + 2.0 * CONTAINER_PADDING,
        })
    }
}
