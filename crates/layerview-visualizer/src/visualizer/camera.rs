use glam::{Mat4, Vec3, Vec4Swizzles};
use layerview_core::BoundingBox3;

/// Polar angle limits in degrees; keeps the view off the Z axis.
pub const MIN_POLAR_DEG: f32 = 1.0;
pub const MAX_POLAR_DEG: f32 = 179.0;

/// Zoom limits in pixels per millimetre.
pub const MIN_ZOOM: f32 = 0.01;
pub const MAX_ZOOM: f32 = 50.0;

/// Multiplicative zoom step per wheel notch.
pub const ZOOM_STEP: f32 = 1.1;

/// Ray from the near plane through a screen pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Standard view directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    Top,
    Bottom,
    Front,
    Rear,
    Left,
    Right,
    Iso,
}

impl ViewPreset {
    /// `(polar, azimuth)` in degrees.
    fn angles(self) -> (f32, f32) {
        match self {
            Self::Top => (MIN_POLAR_DEG, -90.0),
            Self::Bottom => (MAX_POLAR_DEG, -90.0),
            Self::Front => (90.0, -90.0),
            Self::Rear => (90.0, 90.0),
            Self::Left => (90.0, 180.0),
            Self::Right => (90.0, 0.0),
            Self::Iso => (54.7356, -45.0),
        }
    }
}

/// Orthographic orbit camera, Z up.
///
/// Angles are in degrees: `polar` from +Z, `azimuth` from +X towards +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Vec3,
    polar: f32,
    azimuth: f32,
    pub distance: f32,
    zoom: f32,
    pub near: f32,
    pub far: f32,
    width: f32,
    height: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            polar: 45.0,
            azimuth: -45.0,
            distance: 1000.0,
            zoom: 1.0,
            near: 1.0,
            far: 2000.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Camera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            far: distance * 2.0,
            ..Default::default()
        }
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn zoom_factor(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Ignored unless both dimensions are positive.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.width = width;
        self.height = height;
    }

    pub fn rotate(&mut self, delta_polar: f32, delta_azimuth: f32) {
        self.polar = (self.polar + delta_polar).clamp(MIN_POLAR_DEG, MAX_POLAR_DEG);
        self.azimuth = (self.azimuth + delta_azimuth).rem_euclid(360.0);
    }

    pub fn set_angles(&mut self, polar: f32, azimuth: f32) {
        self.polar = polar.clamp(MIN_POLAR_DEG, MAX_POLAR_DEG);
        self.azimuth = azimuth.rem_euclid(360.0);
    }

    pub fn set_view(&mut self, preset: ViewPreset) {
        let (polar, azimuth) = preset.angles();
        self.set_angles(polar, azimuth);
    }

    /// Multiply the zoom, clamped to [`MIN_ZOOM`, `MAX_ZOOM`].
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Wheel zoom: `1.1^notches`.
    pub fn zoom_notches(&mut self, notches: f32) {
        self.zoom(ZOOM_STEP.powf(notches));
    }

    /// Unit vector from the target towards the eye.
    pub fn direction(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.to_radians().sin_cos();
        let (sin_a, cos_a) = self.azimuth.to_radians().sin_cos();
        Vec3::new(sin_p * cos_a, sin_p * sin_a, cos_p)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target + self.direction() * self.distance
    }

    /// World up for the look-at; switches to Y when looking along Z.
    fn world_up(&self) -> Vec3 {
        if self.direction().cross(Vec3::Z).length_squared() < 1e-4 {
            Vec3::Y
        } else {
            Vec3::Z
        }
    }

    /// Screen-aligned right and up vectors in world space.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = -self.direction();
        let right = forward.cross(self.world_up()).normalize();
        let up = right.cross(forward).normalize();
        (right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, self.world_up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let half_w = self.width * 0.5 / self.zoom;
        let half_h = self.height * 0.5 / self.zoom;
        Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Move the target by a screen-space drag in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let (right, up) = self.basis();
        self.target -= right * dx / self.zoom;
        self.target += up * dy / self.zoom;
    }

    /// Ray through pixel `(x, y)` (origin top-left), from the near plane to
    /// the far plane.
    pub fn screen_to_world(&self, x: f32, y: f32) -> Ray {
        let ndc_x = 2.0 * x / self.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / self.height;
        let inverse = self.view_projection().inverse();
        let unproject = |z: f32| {
            let p = inverse * glam::Vec4::new(ndc_x, ndc_y, z, 1.0);
            p.xyz() / p.w
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Centre on `bounds` and zoom so they fit the viewport with a margin.
    pub fn zoom_to_bounds(&mut self, bounds: &BoundingBox3) {
        if bounds.is_empty() {
            return;
        }
        let radius = (bounds.size().length() * 0.5).max(1.0);
        self.target = bounds.center();
        self.distance = self.distance.max(radius * 2.0);
        self.far = self.distance + radius * 2.0;
        let fit = self.width.min(self.height) / (2.0 * radius * 1.1);
        self.zoom = fit.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}
