use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Host and scene configuration, read from `settings.json` next to the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    /// Seed for sphere material and placement randomness.
    #[serde(default)]
    pub sphere_seed: u64,
    /// Min/max radius for procedurally scattered spheres.
    #[serde(default = "TracerSettings::default_sphere_radius")]
    pub sphere_radius: (f32, f32),
    #[serde(default = "TracerSettings::default_spheres_max")]
    pub spheres_max: u32,
    #[serde(default = "TracerSettings::default_sphere_placement_radius")]
    pub sphere_placement_radius: f32,
    /// Scatter spheres procedurally instead of packing registered sphere objects.
    #[serde(default)]
    pub procedural_spheres: bool,
    /// Equirectangular sky image; a generated gradient is used when unset.
    #[serde(default)]
    pub skybox: Option<String>,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
            sphere_seed: 0,
            sphere_radius: Self::default_sphere_radius(),
            spheres_max: Self::default_spheres_max(),
            sphere_placement_radius: Self::default_sphere_placement_radius(),
            procedural_spheres: false,
            skybox: None,
        }
    }
}

impl TracerSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default tracer settings.",
                    path, err
                );
                TracerSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Tracer settings file {:?} not found. Using default settings.",
                    path
                );
                TracerSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default tracer settings.",
                    path, err
                );
                TracerSettings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings = serde_json::from_str::<TracerSettings>(contents)?;
        Ok(settings.validate())
    }

    fn validate(mut self) -> Self {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        let (min, max) = self.sphere_radius;
        if !(min > 0.0 && max >= min) {
            warn!(
                "Sphere radius range ({}, {}) is invalid. Using default range.",
                min, max
            );
            self.sphere_radius = Self::default_sphere_radius();
        }

        if self.sphere_placement_radius <= 0.0 {
            warn!("Sphere placement radius must be positive. Using default value.");
            self.sphere_placement_radius = Self::default_sphere_placement_radius();
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    const fn default_sphere_radius() -> (f32, f32) {
        (3.0, 8.0)
    }

    const fn default_spheres_max() -> u32 {
        100
    }

    const fn default_sphere_placement_radius() -> f32 {
        100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    #[default]
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = TracerSettings::from_json(r#"{ "sphere_seed": 42 }"#).unwrap();

        assert_eq!(settings.sphere_seed, 42);
        assert_eq!(settings.spheres_max, 100);
        assert_eq!(settings.sphere_radius, (3.0, 8.0));
        assert!(!settings.procedural_spheres);
        assert!(settings.skybox.is_none());
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let settings = TracerSettings::from_json(
            r#"{
                "resolution": { "width": 0, "height": 600 },
                "sphere_radius": [5.0, 1.0],
                "sphere_placement_radius": -3.0
            }"#,
        )
        .unwrap();

        assert_eq!(settings.resolution.width, Resolution::default().width);
        assert_eq!(settings.sphere_radius, (3.0, 8.0));
        assert_eq!(settings.sphere_placement_radius, 100.0);
    }

    #[test]
    fn present_mode_parses_snake_case() {
        let settings = TracerSettings::from_json(r#"{ "present_mode": "auto_no_vsync" }"#).unwrap();

        assert_eq!(
            settings.present_mode(&[wgpu::PresentMode::AutoNoVsync]),
            wgpu::PresentMode::AutoNoVsync
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let settings = TracerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..TracerSettings::default()
        };

        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];

        assert_eq!(settings.present_mode(&available), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn present_mode_uses_first_available_when_fifo_missing() {
        let settings = TracerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..TracerSettings::default()
        };

        assert_eq!(
            settings.present_mode(&[wgpu::PresentMode::Immediate]),
            wgpu::PresentMode::Immediate
        );
    }
}
