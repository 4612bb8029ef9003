use clap::Parser;
use std::process;
use unprotect_office::{
    Cli, OutputFormatter, OutputMode, UnprotectError, Unprotector, UserFriendlyError,
};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let unprotector = match Unprotector::from_cli(&cli) {
        Ok(unprotector) => unprotector,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let request = cli.create_request(unprotector.config());

    if cli.dry_run {
        return handle_dry_run(&unprotector, &request);
    }

    match unprotector.unprotect_files(&request) {
        Ok(_) => 0,
        Err(e) => {
            unprotector.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &UnprotectError) -> i32 {
    match error {
        UnprotectError::InvalidPath { .. } | UnprotectError::UnsupportedFormat { .. } => 2,
        UnprotectError::Extraction { .. } => 3,
        UnprotectError::Patch { .. } => 4,
        UnprotectError::Repack { .. } => 5,
        UnprotectError::Swap { .. } => 6,
        UnprotectError::Config { .. } | UnprotectError::Io(_) => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "unprotect-office.toml".to_string());

    match Unprotector::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  unprotect-office <FILES>... --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(unprotector: &Unprotector, request: &unprotect_office::UnprotectRequest) -> i32 {
    let formatter = unprotector.output_formatter();

    let plan = match unprotector.plan(request) {
        Ok(plan) => plan,
        Err(e) => {
            unprotector.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if formatter.mode() == OutputMode::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).unwrap_or_else(|_| "[]".to_string())
        );
        return 0;
    }

    formatter.info("DRY RUN MODE - No files will be modified");
    formatter.print_separator();

    let config = unprotector.config();
    formatter.info("Configuration that would be used:");
    println!("  Scratch root: {}", config.scratch_root().display());
    println!("  Keep backups: {}", request.keep_backup);
    println!("  Enabled formats: {}", config.formats.extensions.join(", "));

    formatter.print_separator();

    for file in &plan {
        println!("  {} ({})", file.path.display(), file.kind);
        println!("    patches: {}", file.parts.join(", "));
        println!("    removes: {}", file.elements.join(", "));
        if let Some(ref backup) = file.backup_path {
            println!("    backup:  {}", backup.display());
        }
    }

    formatter.print_separator();
    formatter.success(&format!("Dry run completed: {} file(s) would be unprotected", plan.len()));

    0
}

fn print_startup_error(error: &UnprotectError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
