//! Inject the honeypot field into every form of a static site.
//!
//! ```bash
//! inject-honeypot public/articles --field website_url --dry-run
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use formguard::inject::{self, FileOutcome};

/// Add a hidden honeypot input to the forms of static HTML pages.
#[derive(Parser)]
#[command(name = "inject-honeypot")]
#[command(about = "Add a honeypot field to static HTML forms", long_about = None)]
struct Cli {
    /// Directory scanned recursively for .html/.htm files
    dir: PathBuf,

    /// Honeypot field name
    #[arg(short, long, default_value = "website_url")]
    field: String,

    /// Report what would change without writing files
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let reports = match inject::inject_dir(&cli.dir, &cli.field, cli.dry_run) {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut injected_files = 0;
    let mut injected_forms = 0;
    for report in &reports {
        match report.outcome {
            FileOutcome::Injected(forms) => {
                injected_files += 1;
                injected_forms += forms;
                println!("injected {forms:>3}  {}", report.path.display());
            }
            FileOutcome::AlreadyProtected => println!("skipped       {}", report.path.display()),
            FileOutcome::NoForms => {}
        }
    }

    let verb = if cli.dry_run { "Would inject" } else { "Injected" };
    tracing::info!(
        "{verb} {injected_forms} form(s) across {injected_files} of {} file(s)",
        reports.len()
    );

    ExitCode::SUCCESS
}
