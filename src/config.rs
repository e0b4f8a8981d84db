use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry and algorithm constants for the layout engine.
///
/// Every distance is in canvas units. Committed node positions are always
/// multiples of `grid_size` on both axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub grid_size: f32,
    pub node_width: f32,
    pub header_height: f32,
    pub field_row_height: f32,
    pub node_spacing: f32,
    pub collision_spacing: f32,
    pub collision_max_passes: usize,
    pub side_penalty: f32,
    pub stub_len: f32,
    pub corner_radius: f32,
    pub arrange_center_x: f32,
    pub arrange_center_y: f32,
    pub snowflake_radius: f32,
    pub group_padding: f32,
    pub group_header_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            node_width: 200.0,
            header_height: 40.0,
            field_row_height: 30.0,
            node_spacing: 50.0,
            collision_spacing: 50.0,
            collision_max_passes: 100,
            side_penalty: 200.0,
            stub_len: 40.0,
            corner_radius: 8.0,
            arrange_center_x: 600.0,
            arrange_center_y: 400.0,
            snowflake_radius: 480.0,
            group_padding: 20.0,
            group_header_height: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            zoom_min: 0.25,
            zoom_max: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    /// Quiet period before a pending layout save fires.
    pub save_quiet_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            save_quiet_ms: 250,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    viewport: Option<ViewportConfigFile>,
    #[serde(rename = "saveQuietMs")]
    save_quiet_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    grid_size: Option<f32>,
    node_width: Option<f32>,
    header_height: Option<f32>,
    field_row_height: Option<f32>,
    node_spacing: Option<f32>,
    collision_spacing: Option<f32>,
    collision_max_passes: Option<usize>,
    side_penalty: Option<f32>,
    stub_len: Option<f32>,
    corner_radius: Option<f32>,
    arrange_center_x: Option<f32>,
    arrange_center_y: Option<f32>,
    snowflake_radius: Option<f32>,
    group_padding: Option<f32>,
    group_header_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewportConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    zoom_min: Option<f32>,
    zoom_max: Option<f32>,
}

/// Load an engine config, overlaying an optional JSON/JSON5 file on the
/// defaults. Absent fields keep their default values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(&contents)
            .map_err(|err| crate::error::EngineError::Config(err.to_string()))?,
    };

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.grid_size {
            config.layout.grid_size = v;
        }
        if let Some(v) = layout.node_width {
            config.layout.node_width = v;
        }
        if let Some(v) = layout.header_height {
            config.layout.header_height = v;
        }
        if let Some(v) = layout.field_row_height {
            config.layout.field_row_height = v;
        }
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.collision_spacing {
            config.layout.collision_spacing = v;
        }
        if let Some(v) = layout.collision_max_passes {
            config.layout.collision_max_passes = v;
        }
        if let Some(v) = layout.side_penalty {
            config.layout.side_penalty = v;
        }
        if let Some(v) = layout.stub_len {
            config.layout.stub_len = v;
        }
        if let Some(v) = layout.corner_radius {
            config.layout.corner_radius = v;
        }
        if let Some(v) = layout.arrange_center_x {
            config.layout.arrange_center_x = v;
        }
        if let Some(v) = layout.arrange_center_y {
            config.layout.arrange_center_y = v;
        }
        if let Some(v) = layout.snowflake_radius {
            config.layout.snowflake_radius = v;
        }
        if let Some(v) = layout.group_padding {
            config.layout.group_padding = v;
        }
        if let Some(v) = layout.group_header_height {
            config.layout.group_header_height = v;
        }
    }

    if let Some(viewport) = parsed.viewport {
        if let Some(v) = viewport.width {
            config.viewport.width = v;
        }
        if let Some(v) = viewport.height {
            config.viewport.height = v;
        }
        if let Some(v) = viewport.zoom_min {
            config.viewport.zoom_min = v;
        }
        if let Some(v) = viewport.zoom_max {
            config.viewport.zoom_max = v;
        }
    }

    if let Some(v) = parsed.save_quiet_ms {
        config.save_quiet_ms = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.grid_size, 20.0);
        assert_eq!(config.save_quiet_ms, 250);
    }

    #[test]
    fn overlay_keeps_unset_fields() {
        let dir = std::env::temp_dir().join("erd-canvas-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cfg.json5");
        // JSON5 on purpose: trailing comma and comment must parse.
        std::fs::write(
            &path,
            "{ layout: { gridSize: 10, }, // partial\n saveQuietMs: 100 }",
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.layout.grid_size, 10.0);
        assert_eq!(config.layout.node_width, 200.0);
        assert_eq!(config.save_quiet_ms, 100);
    }

    #[test]
    fn unparseable_file_is_a_config_error() {
        let dir = std::env::temp_dir().join("erd-canvas-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json5");
        std::fs::write(&path, "{ layout: {{").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }
}
