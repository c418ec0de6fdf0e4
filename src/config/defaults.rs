use crate::config::ToolSettings;

/// Budget of one analyzer invocation
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Budget of the `--version` availability probe
pub const AVAILABILITY_TIMEOUT_SECS: u64 = 10;

/// Directory names no analyzer should descend into
pub const NOISE_DIRECTORIES: &[&str] = &[
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    "build",
    "dist",
];

/// Default settings for a built-in tool
///
/// jscpd walks every file type, so it gets a longer budget than the
/// Python-only tools.
pub fn default_tool_settings(name: &str) -> ToolSettings {
    match name {
        "jscpd" => ToolSettings {
            timeout_secs: 300,
            ..ToolSettings::default()
        },
        _ => ToolSettings::default(),
    }
}
