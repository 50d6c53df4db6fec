use serde::{Deserialize, Serialize};

/// Adaptive waypoint sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointSettings {
    /// Sampling quality in [0, 100]; maps linearly to 0.1..10 samples per unit.
    pub quality: f32,
    /// Added to the road width for the waypoint box scale.
    pub width_buffer: f32,
    pub height: f32,
    pub depth: f32,
    pub min_spacing: f32,
    pub max_spacing: f32,
    /// Curvature (1 / radius) above which a midpoint sample is inserted.
    pub curvature_threshold: f32,
}

impl Default for WaypointSettings {
    fn default() -> Self {
        Self {
            quality: 50.0,
            width_buffer: 0.5,
            height: 2.0,
            depth: 1.0,
            min_spacing: 1.0,
            max_spacing: 10.0,
            curvature_threshold: 0.05,
        }
    }
}

impl WaypointSettings {
    pub fn samples_per_unit(&self) -> f32 {
        let q = self.quality.clamp(0.0, 100.0) / 100.0;
        0.1 + (10.0 - 0.1) * q
    }

    pub fn sanitized(mut self) -> Self {
        self.quality = self.quality.clamp(0.0, 100.0);
        self.width_buffer = self.width_buffer.max(0.0);
        self.height = self.height.max(0.0);
        self.depth = self.depth.max(0.0);
        self.min_spacing = self.min_spacing.max(0.0);
        self.max_spacing = self.max_spacing.max(self.min_spacing);
        self.curvature_threshold = self.curvature_threshold.max(0.0);
        self
    }
}

/// Global editing options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// When false, moving one handle mirrors the other around the anchor.
    pub independent_control_points: bool,
    /// Auto-tangent handle length as a fraction of the neighbour distance.
    pub tangent_fraction: f32,
    /// Polyline subdivisions used for arc-length estimates.
    pub arc_length_subdivisions: usize,
    pub waypoints: WaypointSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            independent_control_points: false,
            tangent_fraction: 1.0 / 3.0,
            arc_length_subdivisions: 16,
            waypoints: WaypointSettings::default(),
        }
    }
}

impl Settings {
    pub fn sanitized(mut self) -> Self {
        if !(self.tangent_fraction > 0.0 && self.tangent_fraction <= 1.0) {
            self.tangent_fraction = Self::default().tangent_fraction;
        }
        self.arc_length_subdivisions = self.arc_length_subdivisions.max(1);
        self.waypoints = self.waypoints.sanitized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quality_maps_to_samples_per_unit() {
        let mut settings = WaypointSettings::default();
        settings.quality = 0.0;
        assert_relative_eq!(settings.samples_per_unit(), 0.1, epsilon = 1e-6);
        settings.quality = 100.0;
        assert_relative_eq!(settings.samples_per_unit(), 10.0, epsilon = 1e-6);
        settings.quality = 250.0;
        assert_relative_eq!(settings.samples_per_unit(), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn sanitize_orders_spacing() {
        let settings = WaypointSettings {
            min_spacing: 5.0,
            max_spacing: 2.0,
            ..WaypointSettings::default()
        }
        .sanitized();
        assert!(settings.max_spacing >= settings.min_spacing);
    }

    #[test]
    fn sanitize_repairs_bad_fraction() {
        let settings = Settings {
            tangent_fraction: -1.0,
            arc_length_subdivisions: 0,
            ..Settings::default()
        }
        .sanitized();
        assert_relative_eq!(settings.tangent_fraction, 1.0 / 3.0, epsilon = 1e-6);
        assert_eq!(settings.arc_length_subdivisions, 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"independent_control_points":true}"#).unwrap();
        assert!(settings.independent_control_points);
        assert_eq!(settings.arc_length_subdivisions, 16);
    }
}
