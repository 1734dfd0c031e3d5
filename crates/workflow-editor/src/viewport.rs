//! Viewport controller: pan, zoom and container size
//!
//! The viewport maps canvas ("local") coordinates to container ("client")
//! coordinates as `client = local * scale + translate`. It never touches
//! graph data.

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::constants::wheel;
use crate::events::GraphEvent;
use crate::interaction::Modifiers;
use crate::types::{Point, Rect};

/// Pan offset and scale of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub translate: Point,
    pub scale: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            translate: Point::default(),
            scale: 1.0,
        }
    }
}

/// Unit of a raw wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

/// A raw wheel event as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_mode: DeltaMode,
    /// Pointer position in client coordinates
    pub position: Point,
    pub modifiers: Modifiers,
}

/// Wheel delta expressed in pixels plus a direction-only "spin"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedWheel {
    pub spin_x: f64,
    pub spin_y: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

/// Convert a wheel delta in any unit into pixels
pub fn normalize_wheel(delta_x: f64, delta_y: f64, mode: DeltaMode) -> NormalizedWheel {
    let unit = match mode {
        DeltaMode::Pixel => 1.0,
        DeltaMode::Line => wheel::LINE_HEIGHT,
        DeltaMode::Page => wheel::PAGE_HEIGHT,
    };
    let pixel_x = delta_x * unit;
    let pixel_y = delta_y * unit;
    let spin = |pixel: f64| {
        if pixel == 0.0 {
            0.0
        } else if pixel < 1.0 {
            -1.0
        } else {
            1.0
        }
    };
    NormalizedWheel {
        spin_x: spin(pixel_x),
        spin_y: spin(pixel_y),
        pixel_x,
        pixel_y,
    }
}

/// Named zoom operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomType {
    /// One zoom step in, honoured only below the zoom-in limit
    In,
    /// One zoom step out, honoured only above the zoom-out limit
    Out,
    /// Reset to scale 1, pan kept
    Original,
    /// Fit the content bounds into the container
    Fit,
}

/// Pan/zoom state of the canvas
#[derive(Debug, Clone)]
pub struct Viewport {
    transform: ViewportTransform,
    width: f64,
    height: f64,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    zoom_in_limit: f64,
    zoom_out_limit: f64,
    wheel_zoom_factor: f64,
    fit_padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            transform: ViewportTransform::default(),
            width: 0.0,
            height: 0.0,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            zoom_in_limit: config.zoom_in_limit,
            zoom_out_limit: config.zoom_out_limit,
            wheel_zoom_factor: config.wheel_zoom_factor,
            fit_padding: config.fit_padding,
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// The event describing the current state
    pub fn event(&self) -> GraphEvent {
        GraphEvent::ViewportChanged {
            transform: self.transform,
            width: self.width,
            height: self.height,
        }
    }

    /// Record a new container size; pan and scale are left alone
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        let width = width.max(0.0);
        let height = height.max(0.0);
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn translate_by(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.transform.translate = self.transform.translate.translate(dx, dy);
        true
    }

    /// Add `delta` to the scale, keeping the container center fixed
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        let target = round_scale(self.transform.scale + delta);
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        self.set_scale_at(target, center)
    }

    /// Multiply the scale by `factor`, keeping the canvas point under `client` fixed
    pub fn zoom_at(&mut self, factor: f64, client: Point) -> bool {
        let target = round_scale(self.transform.scale * factor);
        self.set_scale_at(target, client)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_to(ZoomType::In, None)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_to(ZoomType::Out, None)
    }

    /// Apply a named zoom; `content` is the canvas rect used by `Fit`
    pub fn zoom_to(&mut self, zoom: ZoomType, content: Option<Rect>) -> bool {
        match zoom {
            ZoomType::In if self.transform.scale < self.zoom_in_limit => {
                self.zoom_by(self.zoom_step)
            }
            ZoomType::Out if self.transform.scale > self.zoom_out_limit => {
                self.zoom_by(-self.zoom_step)
            }
            ZoomType::In | ZoomType::Out => false,
            ZoomType::Original => {
                let changed = self.transform.scale != 1.0;
                self.transform.scale = 1.0;
                changed
            }
            ZoomType::Fit => match content {
                Some(rect) => self.fit(rect),
                None => false,
            },
        }
    }

    /// Wheel pans by the negated pixel delta, or zooms while ctrl is held
    pub fn handle_wheel(&mut self, input: &WheelInput) -> bool {
        let normalized = normalize_wheel(input.delta_x, input.delta_y, input.delta_mode);
        if input.modifiers.ctrl {
            // spin maps fractional positive deltas to -1, so use the pixel sign
            let factor = if normalized.pixel_y < 0.0 {
                self.wheel_zoom_factor
            } else if normalized.pixel_y > 0.0 {
                1.0 / self.wheel_zoom_factor
            } else {
                return false;
            };
            self.zoom_at(factor, input.position)
        } else {
            self.translate_by(-normalized.pixel_x, -normalized.pixel_y)
        }
    }

    pub fn client_to_local(&self, client: Point) -> Point {
        let t = &self.transform;
        Point::new(
            (client.x - t.translate.x) / t.scale,
            (client.y - t.translate.y) / t.scale,
        )
    }

    pub fn local_to_client(&self, local: Point) -> Point {
        let t = &self.transform;
        Point::new(
            local.x * t.scale + t.translate.x,
            local.y * t.scale + t.translate.y,
        )
    }

    fn set_scale_at(&mut self, scale: f64, client: Point) -> bool {
        let scale = scale.clamp(self.min_scale, self.max_scale);
        if scale == self.transform.scale {
            return false;
        }
        let anchor = self.client_to_local(client);
        self.transform.scale = scale;
        self.transform.translate =
            Point::new(client.x - anchor.x * scale, client.y - anchor.y * scale);
        true
    }

    fn fit(&mut self, content: Rect) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        let avail_w = (self.width - 2.0 * self.fit_padding).max(1.0);
        let avail_h = (self.height - 2.0 * self.fit_padding).max(1.0);
        let axis = |avail: f64, extent: f64| {
            if extent > 0.0 {
                avail / extent
            } else {
                f64::INFINITY
            }
        };
        let fitted = axis(avail_w, content.width).min(axis(avail_h, content.height));
        let scale = if fitted.is_finite() {
            round_scale(fitted).clamp(self.min_scale, self.max_scale)
        } else {
            1.0
        };

        let center = content.center();
        let next = ViewportTransform {
            translate: Point::new(
                self.width / 2.0 - center.x * scale,
                self.height / 2.0 - center.y * scale,
            ),
            scale,
        };
        if next == self.transform {
            return false;
        }
        self.transform = next;
        true
    }
}

/// Round to 4 decimals so repeated steps land exactly on the limits
fn round_scale(scale: f64) -> f64 {
    (scale * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.resize(800.0, 600.0);
        viewport
    }

    #[test]
    fn test_zoom_commands_respect_limits() {
        let mut viewport = viewport();
        for _ in 0..10 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.scale(), 1.5);
        assert!(!viewport.zoom_in());

        for _ in 0..20 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.scale(), 0.5);
        assert!(!viewport.zoom_out());
    }

    #[test]
    fn test_zoom_stays_bounded() {
        let mut viewport = viewport();
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        for i in 0..40 {
            let delta_y = if i % 7 < 5 { -120.0 } else { 120.0 };
            viewport.handle_wheel(&WheelInput {
                delta_y,
                position: Point::new(100.0, 100.0),
                modifiers: ctrl,
                ..WheelInput::default()
            });
            viewport.zoom_in();
            let scale = viewport.scale();
            assert!((0.5..=3.0).contains(&scale), "scale {} out of bounds", scale);
        }
        for _ in 0..40 {
            viewport.handle_wheel(&WheelInput {
                delta_y: 120.0,
                modifiers: ctrl,
                ..WheelInput::default()
            });
        }
        assert_eq!(viewport.scale(), 0.5);
    }

    #[test]
    fn test_wheel_zoom_keeps_pointer_fixed() {
        let mut viewport = viewport();
        viewport.translate_by(30.0, -20.0);
        let pointer = Point::new(250.0, 175.0);
        let before = viewport.client_to_local(pointer);

        assert!(viewport.handle_wheel(&WheelInput {
            delta_y: -3.0,
            delta_mode: DeltaMode::Line,
            position: pointer,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
            ..WheelInput::default()
        }));
        assert_eq!(viewport.scale(), 1.2);
        let after = viewport.client_to_local(pointer);
        assert!((after.x - before.x).abs() < 1e-9);
        assert!((after.y - before.y).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_trackpad_delta_zooms_by_sign() {
        let mut viewport = viewport();
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };

        assert!(viewport.handle_wheel(&WheelInput {
            delta_y: 0.5,
            modifiers: ctrl,
            ..WheelInput::default()
        }));
        assert!(viewport.scale() < 1.0);

        let out = viewport.scale();
        assert!(viewport.handle_wheel(&WheelInput {
            delta_y: -0.5,
            modifiers: ctrl,
            ..WheelInput::default()
        }));
        assert!(viewport.scale() > out);

        assert!(!viewport.handle_wheel(&WheelInput {
            modifiers: ctrl,
            ..WheelInput::default()
        }));
    }

    #[test]
    fn test_wheel_without_modifier_pans() {
        let mut viewport = viewport();
        viewport.handle_wheel(&WheelInput {
            delta_x: 1.0,
            delta_y: 2.0,
            delta_mode: DeltaMode::Line,
            ..WheelInput::default()
        });
        assert_eq!(viewport.transform().translate, Point::new(-40.0, -80.0));
        assert_eq!(viewport.scale(), 1.0);
    }

    #[test]
    fn test_normalize_wheel_modes() {
        let n = normalize_wheel(0.0, 1.0, DeltaMode::Page);
        assert_eq!(n.pixel_y, 800.0);
        assert_eq!(n.spin_y, 1.0);
        assert_eq!(n.spin_x, 0.0);

        let n = normalize_wheel(-2.0, 0.0, DeltaMode::Line);
        assert_eq!(n.pixel_x, -80.0);
        assert_eq!(n.spin_x, -1.0);

        let n = normalize_wheel(0.0, 53.0, DeltaMode::Pixel);
        assert_eq!(n.pixel_y, 53.0);
    }

    #[test]
    fn test_resize_keeps_transform() {
        let mut viewport = viewport();
        viewport.zoom_in();
        let before = viewport.transform();
        assert!(viewport.resize(1024.0, 768.0));
        assert!(!viewport.resize(1024.0, 768.0));
        assert_eq!(viewport.transform(), before);
        assert_eq!(viewport.size(), (1024.0, 768.0));
    }

    #[test]
    fn test_zoom_original_and_fit() {
        let mut viewport = viewport();
        viewport.zoom_in();
        viewport.translate_by(15.0, 15.0);
        let pan = viewport.transform().translate;
        assert!(viewport.zoom_to(ZoomType::Original, None));
        assert_eq!(viewport.scale(), 1.0);
        assert_eq!(viewport.transform().translate, pan);

        // 760x560 available; a 380x140 box fits at scale 2
        assert!(viewport.zoom_to(ZoomType::Fit, Some(Rect::new(0.0, 0.0, 380.0, 140.0))));
        assert_eq!(viewport.scale(), 2.0);
        let center = viewport.local_to_client(Point::new(190.0, 70.0));
        assert_eq!(center, Point::new(400.0, 300.0));

        // huge content is clamped to the minimum scale
        viewport.zoom_to(ZoomType::Fit, Some(Rect::new(0.0, 0.0, 10_000.0, 10_000.0)));
        assert_eq!(viewport.scale(), 0.5);
        assert!(!viewport.zoom_to(ZoomType::Fit, None));
    }

    #[test]
    fn test_coordinate_round_trip() {
        let mut viewport = viewport();
        viewport.translate_by(12.0, 34.0);
        viewport.zoom_at(2.0, Point::new(0.0, 0.0));
        let local = Point::new(5.0, 7.0);
        assert_eq!(viewport.client_to_local(viewport.local_to_client(local)), local);
    }
}
