use crate::batch::UnprotectRequest;
use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::package::DocumentKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unprotect-office")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Remove write protection from Office Open XML documents")]
#[command(
    long_about = "Unprotect Office strips the read-only recommendation and enforced editing \
                  restrictions from .docx, .docm, .pptx, .pptm, .xlsx and .xlsm files. \
                  It does not remove password encryption."
)]
#[command(after_help = "EXAMPLES:\n  \
    unprotect-office report.docx\n  \
    unprotect-office --backup slides.pptx budget.xlsx\n  \
    unprotect-office ~/Documents/*.docx --output-format json\n  \
    unprotect-office --generate-config")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Documents to unprotect, processed in the order given
    #[arg(
        value_name = "FILES",
        value_parser = validate_document_path,
        required_unless_present = "generate_config"
    )]
    pub files: Vec<PathBuf>,

    /// Keep each original as <name>-backup.<ext> next to it
    #[arg(short, long)]
    pub backup: bool,

    /// Discard originals even when the configuration enables backups
    #[arg(long, conflicts_with = "backup")]
    pub no_backup: bool,

    /// Configuration file path
    #[arg(short, long, env = "UNPROTECT_OFFICE_CONFIG", help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Directory for temporary working files
    #[arg(long, value_name = "DIR", help = "Directory for temporary working files (default: system temp)")]
    pub temp_dir: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show what would be changed without touching any file")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_backup(self.backup_override())
            .with_temp_root(self.temp_dir.clone())
    }

    fn backup_override(&self) -> Option<bool> {
        if self.backup {
            Some(true)
        } else if self.no_backup {
            Some(false)
        } else {
            None
        }
    }

    pub fn create_request(&self, config: &Config) -> UnprotectRequest {
        UnprotectRequest::new(&self.files).with_backup(config.backup.enabled)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn validate_document_path(s: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(s);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| format!("'{}' has no file extension", s))?;

    if DocumentKind::from_extension(extension).is_none() {
        return Err(format!(
            "'{}' is not an Office Open XML document (supported: {})",
            s,
            DocumentKind::SUPPORTED_EXTENSIONS.join(", ")
        ));
    }

    Ok(path)
}
