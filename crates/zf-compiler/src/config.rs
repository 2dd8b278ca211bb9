//! Compiler options loaded from `zflow.yml`

use crate::error::{CompileError, CompileResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_FUNCTION_NAME: &str = "circuit";

/// Options consumed read-only by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Build a circuit that maps input changes to output changes
    pub incrementalize: bool,

    /// Name of the generated circuit function
    pub function_name: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            incrementalize: false,
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl CompilerOptions {
    /// Parse options from YAML text
    pub fn from_yaml_str(content: &str) -> CompileResult<Self> {
        let options: CompilerOptions = serde_yaml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a file path
    pub fn load(path: &Path) -> CompileResult<Self> {
        if !path.exists() {
            return Err(CompileError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CompileError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load options from a directory
    /// Looks for zflow.yml or zflow.yaml
    pub fn load_from_dir(dir: &Path) -> CompileResult<Self> {
        let yml_path = dir.join("zflow.yml");
        let yaml_path = dir.join("zflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CompileError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the options
    pub fn validate(&self) -> CompileResult<()> {
        if !is_identifier(&self.function_name) {
            return Err(CompileError::ConfigInvalid {
                message: format!(
                    "function_name '{}' is not a valid identifier",
                    self.function_name
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
