use crate::error::{Result, UnprotectError};
use crate::package::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub backup: BackupConfig,
    pub workspace: WorkspaceConfig,
    pub formats: FormatConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    pub enabled: bool,
    pub suffix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    pub temp_root: Option<PathBuf>,
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatConfig {
    pub extensions: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: "-backup".to_string(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_root: None, // Platform temp directory
            namespace: "UnprotectOffice".to_string(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            extensions: DocumentKind::SUPPORTED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(UnprotectError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| UnprotectError::Config {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| UnprotectError::Config {
                message: format!("Failed to parse config file {}: {}", path.display(), e),
            })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["unprotect-office.toml", ".unprotect-office.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(backup) = cli_args.backup {
            self.backup.enabled = backup;
        }

        if let Some(ref temp_root) = cli_args.temp_root {
            self.workspace.temp_root = Some(temp_root.clone());
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| UnprotectError::Config {
                message: format!("Failed to serialize config: {}", e),
            })?;

        std::fs::write(path, content)
            .map_err(|e| UnprotectError::Config {
                message: format!("Failed to write config file {}: {}", path.display(), e),
            })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup.suffix.is_empty() {
            return Err(UnprotectError::Config {
                message: "Backup suffix must not be empty".to_string(),
            });
        }

        if self.backup.suffix.contains(['/', '\\']) {
            return Err(UnprotectError::Config {
                message: format!(
                    "Backup suffix must not contain path separators: {}",
                    self.backup.suffix
                ),
            });
        }

        if !is_single_component(&self.workspace.namespace) {
            return Err(UnprotectError::Config {
                message: format!(
                    "Workspace namespace must be a single directory name: '{}'",
                    self.workspace.namespace
                ),
            });
        }

        if let Some(ref temp_root) = self.workspace.temp_root {
            if !temp_root.is_dir() {
                return Err(UnprotectError::Config {
                    message: format!(
                        "Temporary directory does not exist: {}",
                        temp_root.display()
                    ),
                });
            }
        }

        if self.formats.extensions.is_empty() {
            return Err(UnprotectError::Config {
                message: "At least one document format must be enabled".to_string(),
            });
        }

        for ext in &self.formats.extensions {
            if DocumentKind::from_extension(ext).is_none() {
                return Err(UnprotectError::Config {
                    message: format!(
                        "Unknown document format '{}' (supported: {})",
                        ext,
                        DocumentKind::SUPPORTED_EXTENSIONS.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    /// Root under which per-file scratch directories are created.
    pub fn scratch_root(&self) -> PathBuf {
        self.workspace
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.workspace.namespace)
    }

    pub fn is_format_enabled(&self, extension: &str) -> bool {
        self.formats
            .extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub backup: Option<bool>,
    pub temp_root: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backup(mut self, backup: Option<bool>) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_temp_root(mut self, temp_root: Option<PathBuf>) -> Self {
        self.temp_root = temp_root;
        self
    }
}
