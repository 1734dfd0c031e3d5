//! Editor-wide constants
//!
//! Single source of truth for the magic numbers behind snapping, pasting,
//! zooming and default edge styling.

/// Default values for editor configuration
pub mod defaults {
    /// Radius (canvas units) within which a port captures a dragged edge end
    pub const SNAP_RADIUS: f64 = 20.0;
    /// Offset applied to each successive paste, on both axes
    pub const PASTE_OFFSET: f64 = 32.0;
    /// Lower bound of the viewport scale
    pub const MIN_SCALE: f64 = 0.5;
    /// Upper bound of the viewport scale
    pub const MAX_SCALE: f64 = 3.0;
    /// Scale delta applied by the zoom-in / zoom-out commands
    pub const ZOOM_STEP: f64 = 0.1;
    /// Zoom-in command is only honoured below this scale
    pub const ZOOM_IN_LIMIT: f64 = 1.5;
    /// Zoom-out command is only honoured above this scale
    pub const ZOOM_OUT_LIMIT: f64 = 0.5;
    /// Scale factor per modifier-gated wheel step
    pub const WHEEL_ZOOM_FACTOR: f64 = 1.2;
    /// Maximum number of undoable batches kept
    pub const HISTORY_LIMIT: usize = 100;
    /// Default node width
    pub const NODE_WIDTH: f64 = 200.0;
    /// Default node height
    pub const NODE_HEIGHT: f64 = 48.0;
    /// Padding kept around content when zooming to fit
    pub const FIT_PADDING: f64 = 20.0;
}

/// Default edge styling
pub mod style {
    /// Dash pattern marking an edge that is still being drawn
    pub const PROVISIONAL_DASHARRAY: &str = "4,2,1,2";
    pub const EDGE_STROKE: &str = "#A2B1C3";
    pub const EDGE_STROKE_WIDTH: f64 = 2.0;
    /// Fill/stroke used to highlight the port a dragged edge would snap to
    pub const MAGNET_HIGHLIGHT: &str = "#5F95FF";
    pub const TARGET_MARKER_WIDTH: f64 = 12.0;
    pub const TARGET_MARKER_HEIGHT: f64 = 8.0;
}

/// Wheel delta normalization
pub mod wheel {
    /// Pixels per line when the delta is reported in lines
    pub const LINE_HEIGHT: f64 = 40.0;
    /// Pixels per page when the delta is reported in pages
    pub const PAGE_HEIGHT: f64 = 800.0;
}

/// Well-known port identifiers
pub mod ports {
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
}
