//! Utility functions for codegauge

use log::{debug, log_enabled, Level};
use std::ffi::OsStr;
use std::path::{Component, Path};
use std::process::Command;

pub mod file_selection;

/// Longest code snippet kept in a description, in characters
pub const MAX_SNIPPET_CHARS: usize = 150;

/// Log a command that is about to be executed
pub fn log_command(command: &Command) {
    // Only log if debug level is enabled (which corresponds to verbose mode)
    if log_enabled!(Level::Debug) {
        let program = command.get_program().to_string_lossy();

        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let working_dir = command
            .get_current_dir()
            .map(|p| format!(" (in {})", p.display()))
            .unwrap_or_default();

        debug!("Executing: {} {}{}", program, args.join(" "), working_dir);
    }
}

/// Check if a command exists in PATH
pub fn command_exists<S: AsRef<OsStr>>(command: S) -> bool {
    let cmd = command.as_ref();
    let result = which::which(cmd).is_ok();
    debug!("Command {:?} exists: {}", cmd, result);
    result
}

/// Path of `reported` relative to `project_root`.
///
/// Analyzers report either `./pkg/mod.py`, `pkg/mod.py` or an absolute path
/// under the project root; all three become `pkg/mod.py`. Paths outside the
/// root are returned as reported.
pub fn relative_file_path(project_root: &Path, reported: &str) -> String {
    let path = Path::new(reported);

    let relative = if path.is_absolute() {
        match path.strip_prefix(project_root) {
            Ok(stripped) => stripped,
            Err(_) => return reported.to_string(),
        }
    } else {
        path
    };

    let parts: Vec<String> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        reported.to_string()
    } else {
        parts.join("/")
    }
}

/// Slice of `output` starting at the first `{` or `[`.
///
/// Some tools print log lines before their JSON payload. Returns `None`
/// when the output holds no JSON opener at all.
pub fn extract_json_payload(output: &str) -> Option<&str> {
    output.find(['{', '[']).map(|start| &output[start..])
}

/// Collapse whitespace runs to single spaces and cap the length
pub fn compact_snippet(code: &str) -> String {
    let collapsed = code.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_SNIPPET_CHARS {
        let kept: String = collapsed.chars().take(MAX_SNIPPET_CHARS - 3).collect();
        format!("{}...", kept)
    } else {
        collapsed
    }
}
