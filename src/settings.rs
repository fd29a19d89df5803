use std::path::PathBuf;

use crate::ops::compositor::Interpolation;

/// Editor settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Edge length of the square editor viewport, in points
    pub viewport_size: f32,
    /// Edge length of the square preview canvas, in points
    pub preview_size: f32,
    /// Draw the stretch-band highlight
    pub show_patch: bool,
    /// Draw the content-area highlight
    pub show_content: bool,
    /// Resampling filter for the preview and CLI stretch
    pub interpolation: Interpolation,
    /// Initial horizontal preview stretch factor
    pub preview_scale_x: f32,
    /// Initial vertical preview stretch factor
    pub preview_scale_y: f32,
    /// Checkerboard brightness multiplier (1.0 = default, 0.5 = darker, 1.5 = lighter)
    pub checkerboard_brightness: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            viewport_size: 620.0,
            preview_size: 300.0,
            show_patch: true,
            show_content: true,
            interpolation: Interpolation::Bilinear,
            preview_scale_x: 2.0,
            preview_scale_y: 2.0,
            checkerboard_brightness: 1.0,
        }
    }
}

/// Range of the preview stretch sliders.
pub const PREVIEW_SCALE_RANGE: (f32, f32) = (0.5, 20.0);

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/ninepatchfe/ninepatchfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\NinePatchFE\ninepatchfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/NinePatchFE/ninepatchfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("ninepatchfe");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("ninepatchfe_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).unwrap_or_else(|_| {
                std::env::current_exe()
                    .ok()
                    .and_then(|p| p.parent().map(|d| d.to_string_lossy().into_owned()))
                    .unwrap_or_default()
            });
            let config_dir = PathBuf::from(appdata).join("NinePatchFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("ninepatchfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("NinePatchFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("ninepatchfe_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join("ninepatchfe_settings.cfg")))
        }
    }

    /// `key=value` lines, one per setting.
    pub fn to_config_string(&self) -> String {
        format!(
            "viewport_size={}\n\
             preview_size={}\n\
             show_patch={}\n\
             show_content={}\n\
             interpolation={}\n\
             preview_scale_x={}\n\
             preview_scale_y={}\n\
             checkerboard_brightness={}\n",
            self.viewport_size,
            self.preview_size,
            self.show_patch,
            self.show_content,
            self.interpolation.key(),
            self.preview_scale_x,
            self.preview_scale_y,
            self.checkerboard_brightness,
        )
    }

    /// Parse settings text. Unknown keys and malformed values keep defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "viewport_size" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.viewport_size = v.clamp(200.0, 2000.0);
                    }
                }
                "preview_size" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.preview_size = v.clamp(100.0, 1000.0);
                    }
                }
                "show_patch" => s.show_patch = val != "false",
                "show_content" => s.show_content = val != "false",
                "interpolation" => s.interpolation = Interpolation::from_key(val),
                "preview_scale_x" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.preview_scale_x = clamp_preview_scale(v);
                    }
                }
                "preview_scale_y" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.preview_scale_y = clamp_preview_scale(v);
                    }
                }
                "checkerboard_brightness" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.checkerboard_brightness = v.clamp(0.5, 1.5);
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::from_config_str(&content)
    }
}

fn clamp_preview_scale(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(PREVIEW_SCALE_RANGE.0, PREVIEW_SCALE_RANGE.1)
    } else {
        1.0
    }
}
