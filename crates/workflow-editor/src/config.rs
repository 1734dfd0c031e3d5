//! Editor configuration
//!
//! All knobs have defaults in [`crate::constants::defaults`]; a host may load
//! a partial JSON document and only override what it needs.

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::Result;
use crate::types::Size;

/// Tunables for one editor instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Magnet capture radius for edge drops (canvas units)
    pub snap_radius: f64,
    /// Per-paste positional offset (applied on both axes)
    pub paste_offset: f64,
    /// Minimum viewport scale
    pub min_scale: f64,
    /// Maximum viewport scale
    pub max_scale: f64,
    /// Scale delta of the zoom-in / zoom-out commands
    pub zoom_step: f64,
    /// Zoom-in is a no-op at or above this scale
    pub zoom_in_limit: f64,
    /// Zoom-out is a no-op at or below this scale
    pub zoom_out_limit: f64,
    /// Scale factor per wheel step while the zoom modifier is held
    pub wheel_zoom_factor: f64,
    /// Maximum number of undoable batches
    pub history_limit: usize,
    /// Size given to nodes created without an explicit size
    pub default_node_size: Size,
    /// Padding used by zoom-to-fit
    pub fit_padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_radius: defaults::SNAP_RADIUS,
            paste_offset: defaults::PASTE_OFFSET,
            min_scale: defaults::MIN_SCALE,
            max_scale: defaults::MAX_SCALE,
            zoom_step: defaults::ZOOM_STEP,
            zoom_in_limit: defaults::ZOOM_IN_LIMIT,
            zoom_out_limit: defaults::ZOOM_OUT_LIMIT,
            wheel_zoom_factor: defaults::WHEEL_ZOOM_FACTOR,
            history_limit: defaults::HISTORY_LIMIT,
            default_node_size: Size::new(defaults::NODE_WIDTH, defaults::NODE_HEIGHT),
            fit_padding: defaults::FIT_PADDING,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Repair values that would break editor invariants
    ///
    /// Scale bounds are swapped if inverted, and the history keeps at least
    /// one batch.
    pub fn normalized(mut self) -> Self {
        if self.min_scale > self.max_scale {
            std::mem::swap(&mut self.min_scale, &mut self.max_scale);
        }
        if self.min_scale <= 0.0 {
            self.min_scale = defaults::MIN_SCALE;
        }
        if self.wheel_zoom_factor <= 1.0 {
            self.wheel_zoom_factor = defaults::WHEEL_ZOOM_FACTOR;
        }
        self.history_limit = self.history_limit.max(1);
        self.snap_radius = self.snap_radius.max(0.0);
        self
    }
}
