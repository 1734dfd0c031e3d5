//! Core types for workflow graphs
//!
//! These types define the structure of the editable graph: nodes, their
//! ports, edges and the endpoints they attach to, plus the small geometry
//! vocabulary shared by the policy, interaction and viewport layers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ports, style};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port (unique within its node)
pub type PortId = String;

/// Generate a fresh node identifier
pub fn new_node_id() -> NodeId {
    format!("node-{}", uuid::Uuid::new_v4())
}

/// Generate a fresh edge identifier
pub fn new_edge_id() -> EdgeId {
    format!("edge-{}", uuid::Uuid::new_v4())
}

/// A point in canvas (or client) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset this point by (dx, dy)
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Width and height of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanned by two corner points (any order)
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when `other` lies completely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The kind of work a node represents
///
/// Serialized as the strings `cron`, `webhook`, `shell` and `async-task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Time-based trigger
    Cron,
    /// HTTP trigger
    Webhook,
    /// Shell command task
    Shell,
    /// Asynchronous task
    AsyncTask,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::Cron,
        NodeType::Webhook,
        NodeType::Shell,
        NodeType::AsyncTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cron => "cron",
            Self::Webhook => "webhook",
            Self::Shell => "shell",
            Self::AsyncTask => "async-task",
        }
    }

    /// Triggers start a workflow and therefore have no input port
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Cron | Self::Webhook)
    }

    /// Ports a freshly created node of this type carries
    pub fn default_ports(&self) -> BTreeMap<PortId, PortMeta> {
        let mut ports = BTreeMap::new();
        if !self.is_trigger() {
            ports.insert(ports::INPUT.to_string(), PortMeta::new(PortSide::Top, 0));
        }
        ports.insert(ports::OUTPUT.to_string(), PortMeta::new(PortSide::Bottom, 0));
        ports
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown node type string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeTypeError(pub String);

impl fmt::Display for ParseNodeTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node type '{}'", self.0)
    }
}

impl std::error::Error for ParseNodeTypeError {}

impl FromStr for NodeType {
    type Err = ParseNodeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseNodeTypeError(s.to_string()))
    }
}

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSide {
    Top,
    Right,
    Bottom,
    Left,
}

/// Placement of a port on its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMeta {
    pub side: PortSide,
    /// Position among the ports on the same side
    pub index: usize,
}

impl PortMeta {
    pub const fn new(side: PortSide, index: usize) -> Self {
        Self { side, index }
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Kind of work the node represents
    pub node_type: NodeType,
    /// Top-left corner in canvas coordinates
    pub position: Point,
    pub size: Size,
    /// Attachment points keyed by port id
    pub ports: BTreeMap<PortId, PortMeta>,
    /// Configuration payload owned by the form panels; never interpreted here
    #[serde(default)]
    pub data: serde_json::Value,
}

impl GraphNode {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }

    pub fn has_port(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    /// Absolute canvas position of a port's anchor
    ///
    /// Ports sharing a side are spread evenly along it.
    pub fn port_anchor(&self, port: &str) -> Option<Point> {
        let meta = self.ports.get(port)?;
        let on_side = self.ports.values().filter(|p| p.side == meta.side).count();
        let frac = (meta.index as f64 + 1.0) / (on_side as f64 + 1.0);
        let Point { x, y } = self.position;
        let Size { width, height } = self.size;
        Some(match meta.side {
            PortSide::Top => Point::new(x + width * frac, y),
            PortSide::Bottom => Point::new(x + width * frac, y + height),
            PortSide::Left => Point::new(x, y + height * frac),
            PortSide::Right => Point::new(x + width, y + height * frac),
        })
    }
}

/// One end of an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Endpoint {
    /// Attached to a port on a node
    Port { node: NodeId, port: PortId },
    /// Loose end at a canvas position
    Point { x: f64, y: f64 },
}

impl Endpoint {
    pub fn port(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Port {
            node: node.into(),
            port: port.into(),
        }
    }

    pub fn point(point: Point) -> Self {
        Self::Point {
            x: point.x,
            y: point.y,
        }
    }

    /// The node this endpoint is attached to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Port { node, .. } => Some(node),
            Self::Point { .. } => None,
        }
    }

    pub fn is_port(&self) -> bool {
        matches!(self, Self::Port { .. })
    }
}

/// Render state of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Being drawn, not yet validated
    Provisional,
    /// Validated and part of the workflow
    Confirmed,
}

/// Connector shape of an edge path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    /// Plain straight segment while drawing
    Normal,
    /// Straight segments with rounded corners
    Rounded,
}

/// Arrow head drawn at the target end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            name: "block".to_string(),
            width: style::TARGET_MARKER_WIDTH,
            height: style::TARGET_MARKER_HEIGHT,
        }
    }
}

/// Visual attributes of an edge line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAttrs {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    pub target_marker: Marker,
}

impl EdgeAttrs {
    /// Dashed, muted line for an edge still being drawn
    pub fn provisional() -> Self {
        Self {
            stroke_dasharray: Some(style::PROVISIONAL_DASHARRAY.to_string()),
            ..Self::confirmed()
        }
    }

    pub fn confirmed() -> Self {
        Self {
            stroke: style::EDGE_STROKE.to_string(),
            stroke_width: style::EDGE_STROKE_WIDTH,
            stroke_dasharray: None,
            target_marker: Marker::default(),
        }
    }
}

/// A directed edge expressing execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    pub source: Endpoint,
    pub target: Endpoint,
    pub render: RenderState,
    pub connector: Connector,
    pub attrs: EdgeAttrs,
}

impl GraphEdge {
    /// A confirmed port-to-port edge with default styling
    pub fn confirmed(id: impl Into<String>, source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            render: RenderState::Confirmed,
            connector: Connector::Rounded,
            attrs: EdgeAttrs::confirmed(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.render == RenderState::Confirmed
    }

    /// True if either end is attached to `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source.node_id() == Some(node_id) || self.target.node_id() == Some(node_id)
    }
}

/// Request to create a node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Explicit id; a fresh one is generated when absent
    pub id: Option<NodeId>,
    pub node_type: NodeType,
    pub position: Point,
    pub size: Option<Size>,
    /// Explicit ports; the type's defaults are used when absent
    pub ports: Option<BTreeMap<PortId, PortMeta>>,
    pub data: serde_json::Value,
}

impl NodeSpec {
    pub fn new(node_type: NodeType, position: impl Into<Point>) -> Self {
        Self {
            id: None,
            node_type,
            position: position.into(),
            size: None,
            ports: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_ports(mut self, ports: BTreeMap<PortId, PortMeta>) -> Self {
        self.ports = Some(ports);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Request to create an edge
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub id: Option<EdgeId>,
    pub source: Endpoint,
    pub target: Endpoint,
}

impl EdgeSpec {
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: None,
            source,
            target,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Reference to either kind of graph cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum CellId {
    Node(NodeId),
    Edge(EdgeId),
}

impl CellId {
    pub fn node(id: impl Into<String>) -> Self {
        Self::Node(id.into())
    }

    pub fn edge(id: impl Into<String>) -> Self {
        Self::Edge(id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Node(id) | Self::Edge(id) => id,
        }
    }

    pub fn as_node(&self) -> Option<&str> {
        match self {
            Self::Node(id) => Some(id),
            Self::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&str> {
        match self {
            Self::Edge(id) => Some(id),
            Self::Node(_) => None,
        }
    }
}

/// Immutable serialization of a whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_strings() {
        for node_type in NodeType::ALL {
            let json = serde_json::to_string(&node_type).unwrap();
            assert_eq!(json, format!("\"{}\"", node_type.as_str()));
            assert_eq!(node_type.as_str().parse::<NodeType>().unwrap(), node_type);
        }
        assert_eq!(NodeType::AsyncTask.to_string(), "async-task");
        assert!("batch".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_default_ports() {
        let trigger = NodeType::Webhook.default_ports();
        assert_eq!(trigger.len(), 1);
        assert!(trigger.contains_key("output"));

        let task = NodeType::Shell.default_ports();
        assert_eq!(task.len(), 2);
        assert_eq!(task["input"].side, PortSide::Top);
        assert_eq!(task["output"].side, PortSide::Bottom);
    }

    #[test]
    fn test_port_anchor_spreads_ports() {
        let mut ports = BTreeMap::new();
        ports.insert("a".to_string(), PortMeta::new(PortSide::Right, 0));
        ports.insert("b".to_string(), PortMeta::new(PortSide::Right, 1));
        let node = GraphNode {
            id: "n".to_string(),
            node_type: NodeType::Shell,
            position: Point::new(10.0, 10.0),
            size: Size::new(100.0, 90.0),
            ports,
            data: serde_json::Value::Null,
        };
        assert_eq!(node.port_anchor("a"), Some(Point::new(110.0, 40.0)));
        assert_eq!(node.port_anchor("b"), Some(Point::new(110.0, 70.0)));
        assert_eq!(node.port_anchor("missing"), None);
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 0.0));
        assert_eq!(r, Rect::new(10.0, 0.0, 40.0, 40.0));
        assert!(r.contains_rect(&Rect::new(10.0, 0.0, 40.0, 40.0)));
        assert!(!r.contains_rect(&Rect::new(5.0, 0.0, 10.0, 10.0)));
        let u = r.union(&Rect::new(100.0, 100.0, 10.0, 10.0));
        assert_eq!(u, Rect::new(10.0, 0.0, 100.0, 110.0));
    }

    #[test]
    fn test_edge_touches() {
        let edge = GraphEdge::confirmed(
            "e1",
            Endpoint::port("a", "output"),
            Endpoint::port("b", "input"),
        );
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
        assert!(edge.is_confirmed());
        assert_eq!(edge.attrs.stroke_dasharray, None);
    }

    #[test]
    fn test_endpoint_serialization() {
        let json = serde_json::to_value(Endpoint::port("a", "output")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "port", "node": "a", "port": "output"}));
        let json = serde_json::to_value(Endpoint::point(Point::new(1.0, 2.0))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "point", "x": 1.0, "y": 2.0}));
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        assert_ne!(new_node_id(), new_node_id());
        assert!(new_edge_id().starts_with("edge-"));
    }
}
