use crate::batch::{BatchReport, BatchStatus};
use crate::error::{UnprotectError, UserFriendlyError};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    /// One line per pipeline step.
    pub fn status(&self, status: &BatchStatus) {
        if !self.should_show_message(0) {
            return;
        }

        let message = status.to_string();
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}{}", ROCKET, style(&message).bold());
                } else {
                    println!("> {}", message);
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "status",
                    "message": message,
                    "file": status.file_name(),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                }));
            }
            OutputMode::Plain => println!("STATUS: {}", message),
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &UnprotectError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_batch_summary(&self, report: &BatchReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_summary(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_summary(report);
                }
            }
        }
    }

    // Specialized output methods
    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {} // No separator in JSON mode
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        let line = if self.use_colors {
            format!("{}{}", msg_type.emoji(), msg_type.styled(message))
        } else {
            format!("{} {}", msg_type.plain_prefix(), message)
        };

        match msg_type {
            MessageType::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, report: &BatchReport) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{} {}", style("Unprotection completed!").green().bold(), CHECKMARK);
        } else {
            println!("✓ Unprotection completed!");
        }

        println!();
        println!(
            "  Files processed:  {}",
            self.highlight(report.files_processed().to_string())
        );
        println!(
            "  Elements removed: {}",
            self.highlight(report.elements_removed().to_string())
        );
        if report.keep_backup {
            println!(
                "  Backups written:  {}",
                self.highlight(report.backups_written().to_string())
            );
        }
        println!(
            "  Time taken:       {}",
            self.highlight(format_duration(report.duration))
        );

        let unchanged: Vec<&str> = report
            .already_unprotected()
            .map(|f| f.name.as_str())
            .collect();
        if !unchanged.is_empty() {
            println!();
            println!("  No protection found in: {}", unchanged.join(", "));
        }

        self.print_separator();
    }

    fn print_plain_summary(&self, report: &BatchReport) {
        println!("COMPLETED: Unprotection");
        println!("Files processed: {}", report.files_processed());
        println!("Elements removed: {}", report.elements_removed());
        if report.keep_backup {
            println!("Backups written: {}", report.backups_written());
        }
        println!("Duration: {:?}", report.duration);
        for file in &report.files {
            match file.backup_path {
                Some(ref backup) => println!("  {} (backup: {})", file.path.display(), backup.display()),
                None => println!("  {}", file.path.display()),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Info,
}

impl MessageType {
    fn emoji(self) -> Emoji<'static, 'static> {
        match self {
            MessageType::Success => CHECKMARK,
            MessageType::Error => CROSS,
            MessageType::Info => INFO,
        }
    }

    fn plain_prefix(self) -> &'static str {
        match self {
            MessageType::Success => "✓",
            MessageType::Error => "✗",
            MessageType::Info => "i",
        }
    }

    fn styled(self, message: &str) -> console::StyledObject<&str> {
        match self {
            MessageType::Success => style(message).green().bold(),
            MessageType::Error => style(message).red().bold(),
            MessageType::Info => style(message).cyan(),
        }
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

// Progress-aware output wrapper
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: Option<&'a crate::ui::ProgressManager>,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(
        formatter: &'a OutputFormatter,
        progress_manager: Option<&'a crate::ui::ProgressManager>,
    ) -> Self {
        Self {
            formatter,
            progress_manager,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        if let Some(pm) = self.progress_manager {
            pm.suspend(|| f(self.formatter));
        } else {
            f(self.formatter);
        }
    }

    pub fn debug(&self, message: &str) {
        self.suspend_and_print(|f| f.debug(message));
    }

    pub fn status(&self, status: &BatchStatus) {
        self.suspend_and_print(|f| f.status(status));
    }
}
