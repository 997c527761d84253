//! quill_options: quill.json parsing and compiler options.
//!
//! Parses project files and provides the options that steer a compilation.
//! Every field is optional in the file; accessors supply the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default project file name.
pub const PROJECT_FILE_NAME: &str = "quill.json";

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compiler options, matching the `compilerOptions` object of quill.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub module_name: Option<String>,
    /// Compile top-level statements as a script returning its last value.
    pub script: Option<bool>,
    pub show_tree: Option<bool>,
    pub show_program: Option<bool>,
    pub show_control_flow_graph: Option<bool>,
    pub warnings_as_errors: Option<bool>,
}

impl CompilerOptions {
    pub fn is_script(&self) -> bool {
        self.script.unwrap_or(false)
    }

    pub fn show_tree(&self) -> bool {
        self.show_tree.unwrap_or(false)
    }

    pub fn show_program(&self) -> bool {
        self.show_program.unwrap_or(false)
    }

    pub fn show_control_flow_graph(&self) -> bool {
        self.show_control_flow_graph.unwrap_or(false)
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors.unwrap_or(false)
    }

    /// The configured module name, or the stem of `first_file`.
    pub fn module_name_for(&self, first_file: Option<&str>) -> String {
        if let Some(name) = &self.module_name {
            return name.clone();
        }
        first_file
            .and_then(|file| Path::new(file).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string())
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merge(&self, other: &CompilerOptions) -> CompilerOptions {
        CompilerOptions {
            module_name: other.module_name.clone().or_else(|| self.module_name.clone()),
            script: other.script.or(self.script),
            show_tree: other.show_tree.or(self.show_tree),
            show_program: other.show_program.or(self.show_program),
            show_control_flow_graph: other.show_control_flow_graph.or(self.show_control_flow_graph),
            warnings_as_errors: other.warnings_as_errors.or(self.warnings_as_errors),
        }
    }
}

/// The quill.json file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub compiler_options: Option<CompilerOptions>,
    pub files: Option<Vec<String>>,
}

impl ProjectConfig {
    pub fn options(&self) -> CompilerOptions {
        self.compiler_options.clone().unwrap_or_default()
    }

    /// Listed files, resolved against the directory holding the project file.
    pub fn resolved_files(&self, base: &Path) -> Vec<String> {
        self.files
            .iter()
            .flatten()
            .map(|file| base.join(file).to_string_lossy().into_owned())
            .collect()
    }
}

/// Parse a quill.json file from a string.
pub fn parse_config(content: &str) -> Result<ProjectConfig, OptionsError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a quill.json file from a path.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig, OptionsError> {
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}
