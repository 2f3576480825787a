use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ncov")]
#[command(about = "Scrape epidemic statistics into dated snapshots and browse them")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot directory, overrides the config file
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the remote page and save a new snapshot
    Fetch(FetchArgs),

    /// List snapshots in the inventory
    List,

    /// Show snapshots captured on a date
    Date(DateArgs),

    /// Show the snapshot at a position (negative counts from the end)
    Index(IndexArgs),

    /// Print a snapshot's country and city tables
    Show(ShowArgs),

    /// Compare two snapshots by province
    Diff(DiffArgs),

    /// Resolve place names through the geocode cache
    Geocode(GeocodeArgs),

    /// Interactive session over the inventory
    Shell,
}

#[derive(Parser)]
pub struct FetchArgs {
    /// Read page text from a local file instead of the remote url
    #[arg(long)]
    pub from_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct DateArgs {
    /// Date as YYYYMMDD
    pub date: String,
}

#[derive(Parser)]
#[command(allow_negative_numbers = true)]
pub struct IndexArgs {
    #[arg(allow_hyphen_values = true)]
    pub index: isize,
}

#[derive(Parser)]
#[command(allow_negative_numbers = true)]
pub struct ShowArgs {
    /// Latest snapshot captured on this date (YYYYMMDD)
    #[arg(long, conflicts_with = "index")]
    pub date: Option<String>,

    /// Snapshot at this position (defaults to the latest)
    #[arg(long, allow_hyphen_values = true)]
    pub index: Option<isize>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Resolve city coordinates (uses the geocode cache and service)
    #[arg(long, default_value_t = false)]
    pub geocode: bool,
}

#[derive(Parser)]
#[command(allow_negative_numbers = true)]
pub struct DiffArgs {
    /// Position of the older snapshot
    #[arg(long, default_value_t = -2, allow_hyphen_values = true)]
    pub from: isize,

    /// Position of the newer snapshot
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub to: isize,
}

#[derive(Parser)]
pub struct GeocodeArgs {
    /// Place names, e.g. "湖北省 武汉". Lists the cache when omitted
    pub places: Vec<String>,
}
