pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod package;
pub mod ui;

#[cfg(test)]
pub(crate) mod fixtures;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{BackupConfig, CliOverrides, Config, FormatConfig, WorkspaceConfig};
pub use error::{Result, UnprotectError, UserFriendlyError, BATCH_FAILURE_PREFIX};

// Core functionality re-exports
pub use batch::{BatchReport, BatchStatus, FileOutcome, UnprotectRequest};
pub use package::{DocumentKind, PatchSummary, ProtectionPatcher, ScratchSpace, SourceFile};
pub use ui::{OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};

use batch::BatchProgress;
use package::{extract_package, repack_package, swap_into_place};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What a batch would do to one file, without touching it.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub parts: Vec<&'static str>,
    pub elements: Vec<&'static str>,
    pub backup_path: Option<PathBuf>,
}

/// Main library interface for unprotecting Office documents
pub struct Unprotector {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    patcher: ProtectionPatcher,
}

impl Unprotector {
    /// Create a new Unprotector with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(output_mode == OutputMode::Human && !quiet);
        let patcher = ProtectionPatcher::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            patcher,
        })
    }

    /// Create an Unprotector from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Resolve every requested file up front. Fails on the first path that cannot be
    /// processed, before any document is opened.
    fn resolve(&self, request: &UnprotectRequest) -> Result<Vec<(SourceFile, DocumentKind)>> {
        request
            .files
            .iter()
            .map(|path| {
                let source = SourceFile::from_path(path)?;
                match source.kind() {
                    Some(kind) if self.config.is_format_enabled(&source.extension) => {
                        Ok((source, kind))
                    }
                    _ => Err(UnprotectError::UnsupportedFormat {
                        path: source.path.display().to_string(),
                        extension: source.extension.clone(),
                    }),
                }
            })
            .collect()
    }

    /// Describe what `run_batch` would do for each file.
    pub fn plan(&self, request: &UnprotectRequest) -> Result<Vec<PlannedFile>> {
        let resolved = self.resolve(request)?;

        Ok(resolved
            .into_iter()
            .map(|(source, kind)| {
                let targets = self.patcher.targets_for(kind);
                PlannedFile {
                    parts: targets.iter().map(|target| target.part).collect(),
                    elements: targets.iter().map(|target| target.element).collect(),
                    backup_path: request
                        .keep_backup
                        .then(|| source.backup_path(&self.config.backup.suffix)),
                    path: source.path,
                    kind,
                }
            })
            .collect())
    }

    /// Unprotect every file in order, reporting each pipeline step to `on_status`.
    ///
    /// Halts at the first failure. Files already saved stay modified; later files
    /// are never opened.
    pub fn run_batch<F>(&self, request: &UnprotectRequest, mut on_status: F) -> Result<BatchReport>
    where
        F: FnMut(&BatchStatus),
    {
        on_status(&BatchStatus::Starting);

        let resolved = self.resolve(request)?;
        let mut progress = BatchProgress::new(request.keep_backup);

        for (source, kind) in &resolved {
            let outcome = self.process_file(source, *kind, request.keep_backup, &mut on_status)?;
            progress.record(outcome);
        }

        on_status(&BatchStatus::Done);
        Ok(progress.finish())
    }

    fn process_file<F>(
        &self,
        source: &SourceFile,
        kind: DocumentKind,
        keep_backup: bool,
        on_status: &mut F,
    ) -> Result<FileOutcome>
    where
        F: FnMut(&BatchStatus),
    {
        on_status(&BatchStatus::Extracting(source.name.clone()));
        let scratch = ScratchSpace::create(&self.config.scratch_root(), source)?;
        let entries = extract_package(&source.path, scratch.extraction_root())?;

        on_status(&BatchStatus::Unprotecting(source.name.clone()));
        let removed = self.patcher.unprotect(scratch.extraction_root(), kind)?;

        on_status(&BatchStatus::Compressing(source.name.clone()));
        let repacked = scratch.repacked_archive_path();
        repack_package(scratch.extraction_root(), &repacked)?;

        on_status(&BatchStatus::Saving(source.name.clone()));
        let backup = if keep_backup {
            source.backup_path(&self.config.backup.suffix)
        } else {
            scratch.discarded_backup_path()
        };

        if let Err(error) = swap_into_place(&source.path, &repacked, &backup) {
            return Err(keep_scratch_if_unrecoverable(&source.path, scratch, error));
        }

        scratch.cleanup()?;

        Ok(FileOutcome {
            path: source.path.clone(),
            name: source.name.clone(),
            kind,
            entries,
            removed,
            backup_path: keep_backup.then_some(backup),
        })
    }

    /// Run a batch with progress bar and formatted status output
    pub fn unprotect_files(&self, request: &UnprotectRequest) -> Result<BatchReport> {
        let batch_progress = self
            .progress_manager
            .create_batch_progress(request.files.len() as u64);
        let output = ProgressAwareOutput::new(
            &self.output_formatter,
            self.progress_manager
                .is_enabled()
                .then_some(&self.progress_manager),
        );

        output.debug(&format!(
            "Scratch root: {}",
            self.config.scratch_root().display()
        ));

        let result = self.run_batch(request, |status| {
            if self.progress_manager.is_enabled() {
                ui::progress::update_batch_progress(&batch_progress, status);
            } else {
                output.status(status);
            }
        });

        match result {
            Ok(report) => {
                ui::progress::finish_progress_with_summary(
                    &batch_progress,
                    &BatchStatus::Done.to_string(),
                    report.duration,
                );

                for file in &report.files {
                    output.debug(&format!(
                        "{}: {} entries, {} DocSecurity and {} documentProtection removed",
                        file.name,
                        file.entries,
                        file.removed.doc_security_removed,
                        file.removed.document_protection_removed
                    ));
                    if let Some(ref backup) = file.backup_path {
                        output.debug(&format!("Backup written to {}", backup.display()));
                    }
                }

                self.output_formatter.print_batch_summary(&report);
                Ok(report)
            }
            Err(error) => {
                batch_progress.abandon();
                self.progress_manager.clear();
                Err(error)
            }
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &UnprotectError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// When a failed save left nothing at `original`, keep the scratch directory so its
/// contents can be recovered by hand, and name its location in the error.
fn keep_scratch_if_unrecoverable(
    original: &Path,
    scratch: ScratchSpace,
    error: UnprotectError,
) -> UnprotectError {
    if original.exists() {
        return error;
    }

    let kept = scratch.retain();
    match error {
        UnprotectError::Swap {
            path,
            message,
            source,
        } => UnprotectError::Swap {
            path,
            message: format!("{}; working files kept in {}", message, kept.display()),
            source,
        },
        other => other,
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
