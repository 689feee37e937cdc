use anyhow::Context;
use directories::ProjectDirs;
use graph3d_core::FilterStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Full,
    Simplified,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Simplified => "simplified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub fetch_on_start: bool,
    pub render_mode: RenderMode,
    pub filter_strategy: FilterStrategy,
    pub filter_threshold: f32,

    pub scale: f32,
    pub min_node_size: f32,
    pub max_node_size: f32,
    pub accent_color: String,
    pub edge_color: String,
    pub edge_opacity: f32,
    pub cone_radius: f32,
    pub cone_height: f32,

    pub fov_degrees: f32,
    pub default_eye: [f32; 3],
    pub zoom_factor: f32,
    pub focus_duration_ms: u64,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub reframe_on_reload: bool,

    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 15,
            fetch_on_start: true,
            render_mode: RenderMode::Full,
            filter_strategy: FilterStrategy::Betweenness,
            filter_threshold: 0.5,
            scale: 100.0,
            min_node_size: 0.4,
            max_node_size: 2.0,
            accent_color: "#ff0000".to_string(),
            edge_color: "#bbbbbb".to_string(),
            edge_opacity: 0.1,
            cone_radius: 1.5,
            cone_height: 4.0,
            fov_degrees: 75.0,
            default_eye: [100.0, 50.0, 50.0],
            zoom_factor: 2.0,
            focus_duration_ms: 2000,
            damping: 0.25,
            min_distance: 1.0,
            max_distance: 2000.0,
            reframe_on_reload: false,
            log_filter: "info,wgpu=error,naga=warn".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn focus_duration(&self) -> Duration {
        Duration::from_millis(self.focus_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "graph3d")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable viewer config");
            ViewerConfig::default()
        }
    }
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}
