use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::text::DEFAULT_GLYPH_CACHE_CAPACITY;

/// Top-level configuration structure for the kiosk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub window: WindowConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Requested capture format; the camera may pick something else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0, width: 1280, height: 720, fps: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub borderless: bool,
    /// Upper bound on presented frames per second.
    pub target_fps: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Rainbow Playground".into(), borderless: true, target_fps: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Font candidates, first existing file wins.
    pub font_paths: Vec<PathBuf>,
    pub glyph_cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let font_paths = [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();
        Self { font_paths, glyph_cache_capacity: DEFAULT_GLYPH_CACHE_CAPACITY }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_json(r#"{ "camera": { "index": 2 }, "render": { "glyph_cache_capacity": 50 } }"#)
            .unwrap();
        assert_eq!(cfg.camera.index, 2);
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.render.glyph_cache_capacity, 50);
        assert!(!cfg.render.font_paths.is_empty());
        assert!(cfg.window.borderless);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = AppConfig::from_json("{ camera: }").unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Path::new("/no/such/rainbow.json")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
