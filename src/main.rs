use clap::Parser;
use ncov_inventory::cli::{Cli, Command, DiffArgs, ShowArgs};
use ncov_inventory::config::Config;
use ncov_inventory::fetch::{CaptureClock, Fetcher, HttpSource, StaticSource};
use ncov_inventory::geocode::{BaiduGeocoder, GeocodeCache};
use ncov_inventory::report;
use ncov_inventory::shell::Shell;
use ncov_inventory::store::diff::{self, DiffResult, DiffType};
use ncov_inventory::store::{Inventory, InventoryEntry};
use std::sync::Mutex;

fn init_logging(level: &str, config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_file = config.log_file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("warning: cannot open log file {}: {e}", path.display()))
            .ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn open_inventory(config: &Config) -> Inventory {
    Inventory::open(&config.inventory_dir).unwrap_or_else(|e| fail(format!("Error opening inventory: {e}")))
}

fn http_fetcher(config: &Config) -> Fetcher<HttpSource> {
    let source = HttpSource::new(&config.source).unwrap_or_else(|e| fail(format!("Error: {e}")));
    Fetcher::new(source, &config.inventory_dir)
}

fn geocode_cache(config: &Config) -> GeocodeCache<BaiduGeocoder> {
    let geocoder = BaiduGeocoder::new(&config.geocode).unwrap_or_else(|e| fail(format!("Error: {e}")));
    GeocodeCache::load(&config.geocode_cache, geocoder)
}

fn print_listing(inventory: &Inventory, entries: &[&InventoryEntry]) {
    let listed: Vec<_> = entries
        .iter()
        .filter_map(|sel| {
            inventory
                .entries()
                .iter()
                .position(|e| e == *sel)
                .map(|i| (i, *sel))
        })
        .collect();
    print!("{}", report::table::render_entries(&listed));
}

fn show(config: &Config, args: &ShowArgs) {
    let inventory = open_inventory(config);

    // like the shell, a date selection prints its last entry
    let entry = if let Some(date) = &args.date {
        match inventory.by_date(date).last() {
            Some(entry) => *entry,
            None => fail(format!("No snapshot on date {date}")),
        }
    } else {
        let index = args.index.unwrap_or(-1);
        inventory
            .by_index(index)
            .unwrap_or_else(|e| fail(format!("No snapshot selected: {e}")))
    };

    let records = entry
        .load()
        .unwrap_or_else(|e| fail(format!("Error loading snapshot {}: {e}", entry.key)));
    let mut dashboard = report::prepare(&entry.key, &records);

    if args.geocode {
        let mut cache = geocode_cache(config);
        match report::attach_coordinates(&mut dashboard, &mut cache) {
            Ok(0) => {}
            Ok(n) => eprintln!("warning: {n} cities could not be geocoded"),
            Err(e) => eprintln!("warning: geocode cache not saved: {e}"),
        }
    }

    if args.json {
        match report::json::render(&dashboard) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(format!("Error rendering json: {e}")),
        }
    } else {
        print!("{}", report::table::render(&dashboard));
        if let Some(center) = report::map_center(&dashboard) {
            println!("\nmap center: ({:.4}, {:.4})", center.latitude, center.longitude);
        }
    }
}

fn print_diff(result: &DiffResult) {
    println!("\nComparing snapshots:");
    println!("  From: {}", result.from_key);
    println!("  To:   {}", result.to_key);
    println!();

    if result.entries.is_empty() {
        println!("No changes detected.");
        return;
    }

    let mut grew: Vec<_> = result.entries.iter().filter(|e| matches!(e.diff_type, DiffType::Grew)).collect();
    let mut shrank: Vec<_> = result.entries.iter().filter(|e| matches!(e.diff_type, DiffType::Shrank)).collect();
    let new: Vec<_> = result.entries.iter().filter(|e| matches!(e.diff_type, DiffType::New)).collect();
    let gone: Vec<_> = result.entries.iter().filter(|e| matches!(e.diff_type, DiffType::Gone)).collect();

    grew.sort_by_key(|e| -(e.delta));
    shrank.sort_by_key(|e| e.delta);

    for entry in grew {
        println!("  [+] {} {} -> {} (+{})", entry.name, entry.old_count, entry.new_count, entry.delta);
    }
    for entry in shrank {
        println!("  [-] {} {} -> {} ({})", entry.name, entry.old_count, entry.new_count, entry.delta);
    }
    for entry in new {
        println!("  [new] {} appeared ({})", entry.name, entry.new_count);
    }
    for entry in gone {
        println!("  [gone] {} no longer reported (was {})", entry.name, entry.old_count);
    }

    println!();
    if result.net_change >= 0 {
        println!("Net change: +{} confirmed", result.net_change);
    } else {
        println!("Net change: {} confirmed", result.net_change);
    }
}

fn run_diff(config: &Config, args: &DiffArgs) {
    let inventory = open_inventory(config);
    if inventory.len() < 2 {
        fail("Need at least 2 snapshots to compare. Run 'ncov fetch' a few times.");
    }

    let from = inventory
        .by_index(args.from)
        .unwrap_or_else(|e| fail(format!("Invalid 'from' snapshot: {e}")));
    let to = inventory
        .by_index(args.to)
        .unwrap_or_else(|e| fail(format!("Invalid 'to' snapshot: {e}")));

    let from_records = from
        .load()
        .unwrap_or_else(|e| fail(format!("Error loading snapshot {}: {e}", from.key)));
    let to_records = to
        .load()
        .unwrap_or_else(|e| fail(format!("Error loading snapshot {}: {e}", to.key)));

    print_diff(&diff::compare_snapshots(&from_records, &to_records, &from.key, &to.key));
}

fn main() {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| fail(format!("Error: {e}")));
    if let Some(dir) = &cli.dir {
        config.inventory_dir = dir.clone();
    }

    init_logging(&cli.log_level, &config);

    if let Err(e) = config.ensure_dirs() {
        fail(format!("Error creating directories: {e}"));
    }

    match cli.command {
        Command::Fetch(args) => {
            let mut inventory = open_inventory(&config);
            let result = match &args.from_file {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .unwrap_or_else(|e| fail(format!("Error reading {}: {e}", path.display())));
                    let source = StaticSource::new(path.display().to_string(), text);
                    inventory.trigger_update(&Fetcher::new(source, &config.inventory_dir))
                }
                None => inventory.trigger_update(&http_fetcher(&config)),
            };

            match result {
                Ok(fetched) => {
                    println!(
                        "Saved snapshot {} ({} records) to {}",
                        fetched.key,
                        fetched.records.len(),
                        fetched.path.display()
                    );
                    if fetched.clock == CaptureClock::WallClock {
                        eprintln!("warning: page timestamp unreadable, snapshot keyed by current time; do not fetch again this second");
                    }
                    println!("Inventory holds {} snapshots.", inventory.len());
                }
                Err(e) => fail(format!("Fetch failed: {e}")),
            }
        }
        Command::List => {
            let inventory = open_inventory(&config);
            let listed: Vec<_> = inventory.entries().iter().enumerate().collect();
            print!("{}", report::table::render_entries(&listed));
        }
        Command::Date(args) => {
            let inventory = open_inventory(&config);
            let found = inventory.by_date(&args.date);
            if found.is_empty() {
                println!("No snapshots on date {}.", args.date);
            } else {
                print_listing(&inventory, &found);
            }
        }
        Command::Index(args) => {
            let inventory = open_inventory(&config);
            match inventory.by_index(args.index) {
                Ok(entry) => print_listing(&inventory, &[entry]),
                Err(e) => fail(e),
            }
        }
        Command::Show(args) => show(&config, &args),
        Command::Diff(args) => run_diff(&config, &args),
        Command::Geocode(args) => {
            let mut cache = geocode_cache(&config);
            if args.places.is_empty() {
                println!("{} places cached in {}", cache.len(), cache.path().display());
                for (place, c) in cache.places() {
                    println!("{place}: {:.6}, {:.6}", c.latitude, c.longitude);
                }
            }
            for place in &args.places {
                match cache.resolve(place) {
                    Some(c) => println!("{place}: {:.6}, {:.6}", c.latitude, c.longitude),
                    None => println!("{place}: unresolved"),
                }
            }
            if cache.is_dirty() {
                if let Err(e) = cache.persist() {
                    fail(format!("Error saving geocode cache: {e}"));
                }
            }
        }
        Command::Shell => {
            let inventory = open_inventory(&config);
            let mut cache = geocode_cache(&config);
            let geocode = if config.geocode.api_key.is_empty() && cache.is_empty() {
                None
            } else {
                Some(&mut cache)
            };
            let mut shell = Shell::new(inventory, http_fetcher(&config), geocode);
            if let Err(e) = shell.run() {
                fail(format!("Shell error: {e}"));
            }
        }
    }
}
