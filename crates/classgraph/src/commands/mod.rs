//! CLI command implementations.

mod build;
mod markup;

use std::path::Path;

use classgraph_diagrams::Project;

pub(crate) use build::BuildArgs;
pub(crate) use markup::MarkupArgs;

use crate::error::CliError;

/// Read a reflection project from its JSON file.
fn load_project(path: &Path) -> Result<Project, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Validation(format!(
            "Failed to read project {}: {e}",
            path.display()
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by classgraph\n*\n");
    }

    Ok(())
}
