//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use geoip2_core::Edition;
use std::path::PathBuf;

/// geoip2-update - keep MaxMind GeoLite2 databases up to date
#[derive(Parser, Debug)]
#[command(name = "geoip2-update")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a geoip2-update.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update GeoLite2 databases
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Force update even if databases are up to date
    #[arg(short, long)]
    pub force: bool,

    /// Specific editions to update (can be used multiple times)
    #[arg(short, long = "edition", value_name = "EDITION")]
    pub editions: Vec<Edition>,

    /// Append every lifecycle event as a JSON line to this file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,
}
