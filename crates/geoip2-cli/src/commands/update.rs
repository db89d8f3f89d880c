//! Update command

use anyhow::{Context, Result};
use geoip2_core::config::{GLOBAL_DIR_NAME, GLOBAL_FILE_NAME};
use geoip2_core::{ConfigLocator, Edition, Error as ConfigError, LocatedConfig};
use geoip2_update::{
    ConsoleProgress, EventBus, EventLog, FileStore, MaxMindClient, UpdateEngine, UpdateResult,
    UpdateResults,
};
use std::path::Path;
use std::process::ExitCode;

use crate::cli::UpdateArgs;
use crate::output;

const EXAMPLE_CONFIG: &str = r#"maxmind-account-id: "YOUR_ACCOUNT_ID"
maxmind-license-key: "YOUR_LICENSE_KEY"
maxmind-database-editions:
  - GeoLite2-Country
  - GeoLite2-City
maxmind-database-folder: var/maxmind"#;

pub async fn run(args: UpdateArgs, config_path: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let Some(located) = locate(config_path)? else {
        print_missing_config();
        return Ok(ExitCode::FAILURE);
    };

    if !located.warnings.is_empty() {
        output::warning("Configuration warnings:");
        for warning in &located.warnings {
            output::line(&format!("  - {}", warning));
        }
    }

    if !located.config.is_valid() {
        output::error(&format!(
            "Configuration in {} is invalid.",
            located.path.display()
        ));
        return Ok(ExitCode::FAILURE);
    }

    let config = if args.editions.is_empty() {
        located.config
    } else {
        located.config.with_editions(args.editions)
    };

    if !quiet {
        output::header("Updating GeoLite2 databases");
        output::kv("Account ID", config.account_id());
        output::kv("Database folder", &config.database_folder().display().to_string());
        output::kv("Editions", &join_editions(config.editions()));
        output::line("");
    }

    let files = FileStore::new();
    let problems = files.validate_dir(config.database_folder());
    if !problems.is_empty() {
        for problem in &problems {
            output::error(problem);
        }
        return Ok(ExitCode::FAILURE);
    }

    let mut events = EventBus::new();
    if let Some(path) = args.event_log {
        events.set_bridge(EventLog::new(path));
    }

    let progress = if quiet {
        ConsoleProgress::hidden()
    } else {
        ConsoleProgress::new()
    };

    let client = MaxMindClient::with_file_store(located.network, files.clone())
        .context("Failed to set up the download client")?;
    let engine = UpdateEngine::new(client)
        .with_files(files)
        .with_events(events)
        .with_progress(progress);

    let results = engine.update(&config, args.force).await;
    let summary = Summary::from_results(&results);
    summary.print();

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Explicit path first, then the local and global search
fn locate(config_path: Option<&Path>) -> Result<Option<LocatedConfig>> {
    match config_path {
        Some(path) => match ConfigLocator::load_path(path) {
            Ok(located) => Ok(Some(located)),
            Err(ConfigError::ConfigNotFound { .. }) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
        },
        None => ConfigLocator::new()?
            .locate()
            .context("Failed to load configuration"),
    }
}

fn print_missing_config() {
    output::error("No geoip2-update configuration found.");
    output::line("");
    output::line(&format!(
        "Create geoip2-update.yaml in your project or ~/{}/{}:",
        GLOBAL_DIR_NAME, GLOBAL_FILE_NAME
    ));
    output::line("");
    output::line(EXAMPLE_CONFIG);
}

fn join_editions(editions: &[Edition]) -> String {
    editions
        .iter()
        .map(Edition::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Updated,
    Unchanged,
    Failed,
}

/// Display line for one result
fn describe(result: &UpdateResult) -> (Outcome, String) {
    if !result.success {
        return (Outcome::Failed, result.message.clone());
    }

    match (&result.old_version, &result.new_version) {
        (Some(old), Some(new)) if old != new => (
            Outcome::Updated,
            format!("{} (updated from {} to {})", result.message, old, new),
        ),
        _ => (Outcome::Unchanged, result.message.clone()),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Printable run summary
#[derive(Debug, Default)]
struct Summary {
    lines: Vec<(Outcome, String)>,
    updated: usize,
    unchanged: usize,
    failed: usize,
}

impl Summary {
    fn from_results(results: &UpdateResults) -> Self {
        let mut summary = Summary::default();
        for (_, result) in results.iter() {
            let (outcome, line) = describe(result);
            match outcome {
                Outcome::Updated => summary.updated += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Failed => summary.failed += 1,
            }
            summary.lines.push((outcome, line));
        }
        summary
    }

    fn print(&self) {
        for (outcome, line) in &self.lines {
            match outcome {
                Outcome::Updated => output::success(line),
                Outcome::Unchanged => output::unchanged(line),
                Outcome::Failed => output::error(line),
            }
        }

        output::line("");
        if self.lines.is_empty() {
            output::info("No databases were processed.");
        }
        if self.updated > 0 {
            output::success(&format!(
                "Updated {} database{}.",
                self.updated,
                plural(self.updated)
            ));
        }
        if self.unchanged > 0 {
            output::info(&format!(
                "Skipped {} database{} (already up to date).",
                self.unchanged,
                plural(self.unchanged)
            ));
        }
        if self.failed > 0 {
            output::error("Some databases failed to update.");
        }
    }
}
