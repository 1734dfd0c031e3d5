//! Interaction controller
//!
//! Translates pointer, keyboard, wheel and resize input into editor
//! operations. Hover state (port visibility, cell tools) and in-flight
//! gestures live here; none of it is serialized or recorded in history.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::error::{EditorError, Result};
use crate::events::GraphEvent;
use crate::policy::{find_magnet, Magnet};
use crate::types::{CellId, EdgeId, Endpoint, GraphEdge, NodeId, Point, PortId, Rect};
use crate::viewport::{Viewport, WheelInput, ZoomType};

/// Tools attached to a hovered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Deletes the cell when clicked
    RemoveButton,
    /// Edge bend-point handles
    Vertices,
    /// Edge segment handles
    Segments,
}

impl ToolKind {
    /// Tools shown while hovering `cell`
    pub fn for_cell(cell: &CellId) -> Vec<ToolKind> {
        match cell {
            CellId::Node(_) => vec![ToolKind::RemoveButton],
            CellId::Edge(_) => vec![ToolKind::Vertices, ToolKind::Segments, ToolKind::RemoveButton],
        }
    }
}

/// What lies under the pointer, as hit-tested by the view
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Blank,
    Node(NodeId),
    Edge(EdgeId),
    Port { node: NodeId, port: PortId },
    Tool { cell: CellId, tool: ToolKind },
}

/// Modifier keys held during an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key plus modifiers, e.g. `meta+shift+z`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    /// Lower-case key name
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyStroke {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into().to_lowercase(),
            modifiers,
        }
    }

    /// Parse a `+`-separated binding string
    pub fn parse(binding: &str) -> Result<Self> {
        let mut modifiers = Modifiers::default();
        let mut key: Option<String> = None;
        for token in binding.split('+').map(|t| t.trim().to_lowercase()) {
            match token.as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "meta" | "cmd" | "command" => modifiers.meta = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "" => return Err(EditorError::InvalidKeyBinding(binding.to_string())),
                _ if key.is_some() => {
                    return Err(EditorError::InvalidKeyBinding(binding.to_string()))
                }
                _ => key = Some(token),
            }
        }
        let key = key.ok_or_else(|| EditorError::InvalidKeyBinding(binding.to_string()))?;
        Ok(Self { key, modifiers })
    }
}

impl FromStr for KeyStroke {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [(m.ctrl, "ctrl"), (m.meta, "meta"), (m.alt, "alt"), (m.shift, "shift")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&self.key)
    }
}

/// Keyboard commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
    SelectAll,
    Delete,
    ZoomIn,
    ZoomOut,
}

impl Command {
    /// Whether running the command can add, remove or move cells
    pub fn mutates_graph(self) -> bool {
        matches!(
            self,
            Self::Cut | Self::Paste | Self::Undo | Self::Redo | Self::Delete
        )
    }
}

/// Key bindings
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyStroke, Command>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        for (key, shift, command) in [
            ("c", false, Command::Copy),
            ("x", false, Command::Cut),
            ("v", false, Command::Paste),
            ("z", false, Command::Undo),
            ("z", true, Command::Redo),
            ("a", false, Command::SelectAll),
            ("1", false, Command::ZoomIn),
            ("2", false, Command::ZoomOut),
        ] {
            let ctrl = Modifiers {
                ctrl: true,
                shift,
                ..Modifiers::default()
            };
            let meta = Modifiers {
                meta: true,
                shift,
                ..Modifiers::default()
            };
            keymap.bindings.insert(KeyStroke::new(key, ctrl), command);
            keymap.bindings.insert(KeyStroke::new(key, meta), command);
        }
        let backspace = KeyStroke::new("backspace", Modifiers::default());
        keymap.bindings.insert(backspace, Command::Delete);
        keymap
    }
}

impl Keymap {
    /// A keymap with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `binding` (e.g. `"meta+shift+z"`) to `command`, replacing any
    /// previous binding of the same stroke
    pub fn bind(&mut self, binding: &str, command: Command) -> Result<()> {
        let stroke = KeyStroke::parse(binding)?;
        self.bindings.insert(stroke, command);
        Ok(())
    }

    pub fn unbind(&mut self, binding: &str) -> Result<Option<Command>> {
        let stroke = KeyStroke::parse(binding)?;
        Ok(self.bindings.remove(&stroke))
    }

    pub fn lookup(&self, stroke: &KeyStroke) -> Option<Command> {
        self.bindings.get(stroke).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Raw input delivered by the host view
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerEnter { target: HitTarget },
    PointerLeave { target: HitTarget },
    /// Positions are in client coordinates
    PointerDown {
        target: HitTarget,
        position: Point,
        modifiers: Modifiers,
    },
    PointerMove { position: Point },
    PointerUp { target: HitTarget, position: Point },
    /// The gesture was interrupted (pointer left the canvas, escape, focus loss)
    PointerCancel,
    Key(KeyStroke),
    Wheel(WheelInput),
    Resize { width: f64, height: f64 },
}

/// In-flight pointer gesture
#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    /// Dragging the selected nodes; positions are canvas coordinates
    DragNodes {
        start: Point,
        origins: Vec<(NodeId, Point)>,
    },
    /// Drawing a new edge out of a port
    DrawEdge {
        edge: GraphEdge,
        magnet: Option<Magnet>,
    },
    /// Rubber-band selection over the blank canvas
    RubberBand { start: Point, current: Point },
}

/// Drives an [`Editor`] from user input
#[derive(Debug)]
pub struct InteractionController {
    keymap: Keymap,
    viewport: Viewport,
    ports_visible: bool,
    tools: HashMap<CellId, Vec<ToolKind>>,
    gesture: Gesture,
}

impl InteractionController {
    /// A controller whose viewport follows the editor's configuration
    pub fn new(editor: &Editor) -> Self {
        Self {
            keymap: Keymap::default(),
            viewport: Viewport::new(editor.config()),
            ports_visible: false,
            tools: HashMap::new(),
            gesture: Gesture::Idle,
        }
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn ports_visible(&self) -> bool {
        self.ports_visible
    }

    /// Tools currently attached to `cell`
    pub fn tools(&self, cell: &CellId) -> &[ToolKind] {
        self.tools.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The edge being drawn, if any
    pub fn provisional_edge(&self) -> Option<&GraphEdge> {
        match &self.gesture {
            Gesture::DrawEdge { edge, .. } => Some(edge),
            _ => None,
        }
    }

    /// The port a dropped edge would currently snap to
    pub fn highlighted_port(&self) -> Option<&Magnet> {
        match &self.gesture {
            Gesture::DrawEdge { magnet, .. } => magnet.as_ref(),
            _ => None,
        }
    }

    /// Current rubber-band rectangle in canvas coordinates
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::RubberBand { start, current } => Some(Rect::from_corners(*start, *current)),
            _ => None,
        }
    }

    /// Process one input event
    ///
    /// Commands whose preconditions are unmet (empty clipboard, empty
    /// history, refused connection) are silent no-ops.
    pub fn handle(&mut self, editor: &mut Editor, event: InputEvent) -> Result<()> {
        let result = match event {
            InputEvent::PointerEnter { target } => {
                self.on_enter(editor, target);
                Ok(())
            }
            InputEvent::PointerLeave { target } => {
                self.on_leave(editor, target);
                Ok(())
            }
            InputEvent::PointerDown {
                target,
                position,
                modifiers,
            } => self.on_down(editor, target, position, modifiers),
            InputEvent::PointerMove { position } => self.on_move(editor, position),
            InputEvent::PointerUp { target, position } => self.on_up(editor, target, position),
            InputEvent::PointerCancel => {
                self.cancel(editor);
                Ok(())
            }
            InputEvent::Key(stroke) => match self.keymap.lookup(&stroke) {
                Some(command) => self.run_command(editor, command),
                None => Ok(()),
            },
            InputEvent::Wheel(input) => {
                if self.viewport.handle_wheel(&input) {
                    editor.emit(self.viewport.event());
                }
                Ok(())
            }
            InputEvent::Resize { width, height } => {
                if self.viewport.resize(width, height) {
                    editor.emit(self.viewport.event());
                }
                Ok(())
            }
        };
        swallow_silent(result)
    }

    /// Execute a keyboard command
    ///
    /// Commands that change the graph first abandon any gesture in flight,
    /// so a drag or edge draw never outlives the cells it refers to.
    pub fn run_command(&mut self, editor: &mut Editor, command: Command) -> Result<()> {
        log::debug!("Interaction: running {:?}", command);
        if command.mutates_graph() {
            self.cancel(editor);
        }
        let result = match command {
            Command::Copy => {
                editor.copy();
                Ok(())
            }
            Command::Cut => editor.cut(),
            Command::Paste => editor.paste().map(|_| ()),
            Command::Undo => editor.undo(),
            Command::Redo => editor.redo(),
            Command::SelectAll => {
                editor.select_all();
                Ok(())
            }
            Command::Delete => editor.delete_selection(),
            Command::ZoomIn => {
                self.zoom_to(editor, ZoomType::In);
                Ok(())
            }
            Command::ZoomOut => {
                self.zoom_to(editor, ZoomType::Out);
                Ok(())
            }
        };
        swallow_silent(result)
    }

    /// Apply a named zoom; `Fit` uses the bounds of the whole graph
    pub fn zoom_to(&mut self, editor: &Editor, zoom: ZoomType) -> bool {
        let content = editor.graph().bounding_box();
        let changed = self.viewport.zoom_to(zoom, content);
        if changed {
            editor.emit(self.viewport.event());
        }
        changed
    }

    /// Abandon the current gesture without leaving durable state
    pub fn cancel(&mut self, editor: &mut Editor) {
        match std::mem::take(&mut self.gesture) {
            Gesture::DragNodes { origins, .. } => editor.cancel_drag(&origins),
            Gesture::DrawEdge { .. } => Self::clear_provisional(editor),
            Gesture::RubberBand { .. } | Gesture::Idle => {}
        }
    }

    fn on_enter(&mut self, editor: &Editor, target: HitTarget) {
        let cell = match target {
            HitTarget::Node(id) => {
                self.set_ports_visible(editor, true);
                CellId::Node(id)
            }
            HitTarget::Edge(id) => CellId::Edge(id),
            HitTarget::Blank | HitTarget::Port { .. } | HitTarget::Tool { .. } => return,
        };
        let tools = ToolKind::for_cell(&cell);
        self.tools.insert(cell.clone(), tools.clone());
        editor.emit(GraphEvent::ToolsChanged { cell, tools });
    }

    fn on_leave(&mut self, editor: &Editor, target: HitTarget) {
        let cell = match target {
            HitTarget::Node(id) => {
                self.set_ports_visible(editor, false);
                CellId::Node(id)
            }
            HitTarget::Edge(id) => CellId::Edge(id),
            HitTarget::Blank | HitTarget::Port { .. } | HitTarget::Tool { .. } => return,
        };
        if self.tools.remove(&cell).is_some() {
            editor.emit(GraphEvent::ToolsChanged {
                cell,
                tools: Vec::new(),
            });
        }
    }

    fn on_down(
        &mut self,
        editor: &mut Editor,
        target: HitTarget,
        position: Point,
        modifiers: Modifiers,
    ) -> Result<()> {
        // a new press always ends whatever was in flight
        self.cancel(editor);
        let local = self.viewport.client_to_local(position);

        match target {
            HitTarget::Tool {
                cell,
                tool: ToolKind::RemoveButton,
            } => {
                if self.tools.remove(&cell).is_some() {
                    editor.emit(GraphEvent::ToolsChanged {
                        cell: cell.clone(),
                        tools: Vec::new(),
                    });
                }
                if matches!(cell, CellId::Node(_)) {
                    self.set_ports_visible(editor, false);
                }
                editor.remove_cells(&[cell])
            }
            HitTarget::Tool { .. } => Ok(()),
            HitTarget::Node(id) => {
                let cell = CellId::Node(id);
                if !editor.selection().contains(&cell) {
                    let mut cells = if modifiers.shift {
                        editor.selection().cells().to_vec()
                    } else {
                        Vec::new()
                    };
                    cells.push(cell);
                    editor.select(cells);
                }
                let origins = editor
                    .selection()
                    .node_ids()
                    .filter_map(|id| {
                        editor
                            .graph()
                            .node(id)
                            .map(|n| (n.id.clone(), n.position))
                    })
                    .collect();
                self.gesture = Gesture::DragNodes {
                    start: local,
                    origins,
                };
                Ok(())
            }
            HitTarget::Edge(id) => {
                editor.select([CellId::Edge(id)]);
                Ok(())
            }
            HitTarget::Port { node, port } => {
                let edge = editor
                    .policy()
                    .create_edge(Endpoint::port(node, port), local);
                editor.emit(provisional_event(Some(edge.clone()), None));
                self.gesture = Gesture::DrawEdge { edge, magnet: None };
                Ok(())
            }
            HitTarget::Blank => {
                self.gesture = Gesture::RubberBand {
                    start: local,
                    current: local,
                };
                Ok(())
            }
        }
    }

    fn on_move(&mut self, editor: &mut Editor, position: Point) -> Result<()> {
        let local = self.viewport.client_to_local(position);
        match &mut self.gesture {
            Gesture::Idle => Ok(()),
            Gesture::DragNodes { start, origins } => {
                let (dx, dy) = (local.x - start.x, local.y - start.y);
                for (id, origin) in origins.iter() {
                    editor.drag_node_to(id, origin.translate(dx, dy))?;
                }
                Ok(())
            }
            Gesture::DrawEdge { edge, magnet } => {
                let snap = find_magnet(editor.graph(), local, editor.policy().snap_radius());
                edge.target = match &snap {
                    Some(m) => m.endpoint(),
                    None => Endpoint::point(local),
                };
                *magnet = snap;
                editor.emit(provisional_event(Some(edge.clone()), magnet.as_ref()));
                Ok(())
            }
            Gesture::RubberBand { current, .. } => {
                *current = local;
                Ok(())
            }
        }
    }

    fn on_up(&mut self, editor: &mut Editor, target: HitTarget, position: Point) -> Result<()> {
        let local = self.viewport.client_to_local(position);
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(()),
            Gesture::DragNodes { origins, .. } => {
                editor.finish_drag(&origins);
                Ok(())
            }
            Gesture::DrawEdge { mut edge, magnet } => {
                Self::clear_provisional(editor);
                edge.target = match (target, magnet) {
                    (HitTarget::Port { node, port }, _) => Endpoint::port(node, port),
                    (_, Some(m)) => m.endpoint(),
                    (_, None) => Endpoint::point(local),
                };
                editor.commit_edge(edge).map(|_| ())
            }
            Gesture::RubberBand { start, .. } => {
                if start == local {
                    editor.clear_selection();
                } else {
                    editor.select_in_rect(&Rect::from_corners(start, local));
                }
                Ok(())
            }
        }
    }

    fn set_ports_visible(&mut self, editor: &Editor, visible: bool) {
        if self.ports_visible != visible {
            self.ports_visible = visible;
            editor.emit(GraphEvent::PortsVisibilityChanged { visible });
        }
    }

    fn clear_provisional(editor: &Editor) {
        editor.emit(provisional_event(None, None));
    }
}

fn provisional_event(edge: Option<GraphEdge>, magnet: Option<&Magnet>) -> GraphEvent {
    GraphEvent::ProvisionalEdgeChanged {
        edge,
        highlighted_port: magnet.map(Magnet::endpoint),
        highlight_color: magnet.map(|m| m.highlight_color().to_string()),
    }
}

fn swallow_silent(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_silent() => {
            log::debug!("Interaction: ignored: {}", e);
            Ok(())
        }
        other => other,
    }
}
