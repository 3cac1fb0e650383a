//! Scene configuration.
//!
//! Every constant of the landscape lives here with its default value. The config
//! is a plain `serde` struct persisted as RON; each section carries
//! `#[serde(default)]` so a file only needs to name what it overrides.
//!
//! Colours are stored as sRGB hex values (`0xRRGGBB`) and converted to linear
//! space with [`srgb_hex`] when they are uploaded to the GPU.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that points to an alternative config file.
pub const CONFIG_ENV: &str = "COSMIC_LANDSCAPE_CONFIG";
/// Config file looked up in the working directory when [`CONFIG_ENV`] is unset.
pub const CONFIG_FILE: &str = "landscape.ron";

/// Errors that can occur while loading or parsing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Seed for every random placement. `None` picks a fresh seed per mount.
    pub seed: Option<u64>,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub terrain: TerrainConfig,
    pub water: WaterConfig,
    pub sky: SkyConfig,
    pub fog: FogConfig,
    pub stars: StarConfig,
    pub planet: PlanetConfig,
    pub plants: PlantConfig,
    pub lights: LightConfig,
    pub bloom: BloomConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Id of the DOM element the canvas is mounted into (wasm only).
    pub mount_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    pub size: f32,
    pub segments: u32,
    pub frequency: f32,
    pub amplitude: f32,
    /// Upper bound (exclusive) of the uniform noise added to every vertex.
    pub noise: f32,
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterConfig {
    pub size: f32,
    pub height: f32,
    /// Side length of the square reflection target.
    pub texture_size: u32,
    pub sun_color: u32,
    pub water_color: u32,
    pub distortion_scale: f32,
    /// Scale applied to the frame delta before it is added to the shader time.
    pub time_scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    pub color: u32,
    pub density: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarConfig {
    pub count: u32,
    /// Edge length of the cube centred on the origin that holds the stars.
    pub extent: f32,
    pub color: u32,
    /// World-space sprite size.
    pub size: f32,
    pub opacity: f32,
    /// Lower bound of the on-screen sprite radius in pixels.
    pub min_pixels: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    pub radius: f32,
    pub segments: u32,
    pub position: [f32; 3],
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
    /// Spin speed around +Y in radians per second.
    pub spin_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlantConfig {
    pub count: u32,
    /// Edge length of the square ground patch centred on the origin.
    pub patch: f32,
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub color: u32,
    pub emissive: u32,
    pub base_intensity: f32,
    pub selected_intensity: f32,
    pub pulse_speed: f32,
    pub interactive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub sun_color: u32,
    pub sun_intensity: f32,
    pub sun_position: [f32; 3],
    pub shadow_map_size: u32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    /// Half-width of the orthographic shadow frustum.
    pub shadow_extent: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomConfig {
    pub threshold: f32,
    pub soft_knee: f32,
    pub strength: f32,
    pub radius: f32,
    pub iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub water_normals_url: String,
    /// Script injected into the host page on wasm. `None` skips it.
    pub compat_script_url: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Cosmic Landscape".to_string(),
            mount_id: "cosmic-landscape".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 75.0,
            near: 0.1,
            far: 2000.0,
            position: [0.0, 5.0, 15.0],
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 500.0,
            segments: 128,
            frequency: 0.05,
            amplitude: 5.0,
            noise: 2.0,
            color: 0x1a3f3e,
            metalness: 0.1,
            roughness: 0.8,
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            size: 1000.0,
            height: 1.0,
            texture_size: 512,
            sun_color: 0xffffff,
            water_color: 0x001e0f,
            distortion_scale: 3.7,
            time_scale: 0.5,
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: 0x000b2e,
            density: 0.0008,
        }
    }
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            extent: 2000.0,
            color: 0xffffff,
            size: 0.2,
            opacity: 0.8,
            min_pixels: 1.0,
        }
    }
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            segments: 64,
            position: [100.0, 50.0, -200.0],
            color: 0x4a86e8,
            roughness: 0.8,
            metalness: 0.2,
            spin_speed: 0.05,
        }
    }
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            count: 200,
            patch: 400.0,
            radius: 0.5,
            height: 2.0,
            radial_segments: 8,
            color: 0x00ff00,
            emissive: 0x00ff00,
            base_intensity: 0.5,
            selected_intensity: 2.0,
            pulse_speed: 2.0,
            interactive: true,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0x404040,
            ambient_intensity: 0.5,
            sun_color: 0xffffff,
            sun_intensity: 1.0,
            sun_position: [0.0, 50.0, 100.0],
            shadow_map_size: 2048,
            shadow_near: 0.5,
            shadow_far: 500.0,
            shadow_extent: 260.0,
        }
    }
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            soft_knee: 0.0,
            strength: 1.5,
            radius: 0.5,
            iterations: 5,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            water_normals_url: "https://threejs.org/examples/textures/waternormals.jpg"
                .to_string(),
            compat_script_url: Some("https://aframe.io/releases/1.7.0/aframe.min.js".to_string()),
        }
    }
}

impl LandscapeConfig {
    /// Parse a config from RON text. Missing fields keep their defaults.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::Parse)
    }

    /// Load the config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::info!("Loading config from {}", path.display());
                Self::from_ron(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Resolve the config for this platform.
    ///
    /// Native builds read `$COSMIC_LANDSCAPE_CONFIG` or `./landscape.ron`; the
    /// browser has no file system and always uses the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            Self::load_from(&path)
        }
        #[cfg(target_arch = "wasm32")]
        {
            Ok(Self::default())
        }
    }
}

/// Convert an sRGB hex colour (`0xRRGGBB`) to linear RGB.
pub fn srgb_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_the_scene_constants() {
        let config = LandscapeConfig::default();
        assert_eq!(config.stars.count, 10_000);
        assert_eq!(config.plants.count, 200);
        assert_eq!(config.terrain.segments, 128);
        assert_eq!(config.camera.position, [0.0, 5.0, 15.0]);
        assert_eq!(config.water.distortion_scale, 3.7);
        assert_eq!(config.sky.turbidity, 10.0);
        assert_eq!(config.bloom.strength, 1.5);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_ron_only_overrides_named_fields() {
        let config = LandscapeConfig::from_ron(
            "(seed: Some(7), stars: (count: 12), plants: (interactive: false))",
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.stars.count, 12);
        assert_eq!(config.stars.extent, 2000.0);
        assert!(!config.plants.interactive);
        assert_eq!(config.plants.count, 200);
        assert_eq!(config.terrain, TerrainConfig::default());
    }

    #[test]
    fn invalid_ron_is_a_parse_error() {
        let err = LandscapeConfig::from_ron("(stars: (count: \"many\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LandscapeConfig::load_from(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, LandscapeConfig::default());
    }

    #[test]
    fn loads_overrides_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(water: (height: 2.5), assets: (compat_script_url: None))").unwrap();
        let config = LandscapeConfig::load_from(file.path()).unwrap();
        assert_eq!(config.water.height, 2.5);
        assert_eq!(config.assets.compat_script_url, None);
        assert_eq!(config.water.size, 1000.0);
    }

    #[test]
    fn srgb_hex_converts_to_linear() {
        assert_eq!(srgb_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(srgb_hex(0x000000), [0.0, 0.0, 0.0]);
        let [r, g, b] = srgb_hex(0x00ff00);
        assert_eq!((r, g, b), (0.0, 1.0, 0.0));
        let [grey, _, _] = srgb_hex(0x808080);
        assert!((grey - 0.2158605).abs() < 1e-5);
    }
}
