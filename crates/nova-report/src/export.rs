//! Writing reports to caller-supplied paths.

use std::path::Path;

use tracing::info;

use nova_contracts::{
    error::{NovaError, NovaResult},
    report::OrchestrationReport,
};

use crate::markdown::render;

/// Render `report` as Markdown and write it to `path`.
///
/// Missing parent directories are created.
pub fn write_markdown(path: &Path, report: &OrchestrationReport) -> NovaResult<()> {
    write(path, &render(report))?;
    info!(path = %path.display(), status = %report.status, "markdown report written");
    Ok(())
}

/// Serialize the full report, messages included, as pretty-printed JSON.
pub fn write_json(path: &Path, report: &OrchestrationReport) -> NovaResult<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| write_error(path, e))?;
    write(path, &json)?;
    info!(path = %path.display(), messages = report.messages.len(), "json report written");
    Ok(())
}

fn write(path: &Path, contents: &str) -> NovaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }
    std::fs::write(path, contents).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> NovaError {
    NovaError::ReportWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
