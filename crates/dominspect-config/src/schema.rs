//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Page agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reconnection attempts after the host link drops. 0 disables reconnection.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Periodically re-apply a highlight that page scripts stripped.
    #[serde(default = "default_true")]
    pub style_check_enabled: bool,

    #[serde(default = "default_style_check_interval_ms")]
    pub style_check_interval_ms: u64,

    /// Include a direct-text summary in element snapshots.
    #[serde(default = "default_true")]
    pub include_text_content: bool,

    #[serde(default = "default_text_summary_max_chars")]
    pub text_summary_max_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            style_check_enabled: true,
            style_check_interval_ms: default_style_check_interval_ms(),
            include_text_content: true,
            text_summary_max_chars: default_text_summary_max_chars(),
        }
    }
}

impl AgentConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn style_check_interval(&self) -> Duration {
        Duration::from_millis(self.style_check_interval_ms)
    }
}

fn default_reconnect_attempts() -> u32 {
    3
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_style_check_interval_ms() -> u64 {
    2000
}

fn default_text_summary_max_chars() -> usize {
    80
}

pub(crate) fn default_true() -> bool {
    true
}

/// Panel controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Upper bound on waiting for an acknowledgement or the update it triggers.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    /// Depth of the tree printed by the CLI `tree` command.
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout_ms(),
            tree_depth: default_tree_depth(),
        }
    }
}

impl PanelConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

fn default_ack_timeout_ms() -> u64 {
    5000
}

fn default_tree_depth() -> usize {
    3
}

/// Visual treatment of highlighted and previewed elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_accent_color")]
    pub accent_color: String,

    #[serde(default = "default_outline_width_px")]
    pub outline_width_px: u32,

    /// Negative values draw the outline inside the element's border box.
    #[serde(default = "default_outline_offset_px")]
    pub outline_offset_px: i32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
            outline_width_px: default_outline_width_px(),
            outline_offset_px: default_outline_offset_px(),
        }
    }
}

impl HighlightConfig {
    /// `outline` value for the selected element.
    pub fn highlight_outline(&self) -> String {
        format!("{}px solid {}", self.outline_width_px, self.accent_color)
    }

    /// `outline` value for the hovered element.
    pub fn preview_outline(&self) -> String {
        format!("{}px dashed {}", self.outline_width_px, self.accent_color)
    }

    /// `outline-offset` value shared by both treatments.
    pub fn outline_offset(&self) -> String {
        format!("{}px", self.outline_offset_px)
    }
}

fn default_accent_color() -> String {
    "#1a73e8".to_string()
}

fn default_outline_width_px() -> u32 {
    2
}

fn default_outline_offset_px() -> i32 {
    -2
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rolling log files. Console only when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
