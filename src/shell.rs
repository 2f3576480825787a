//! Interactive session over one inventory.
//!
//! Commands:
//! - `l` list snapshots, `u` fetch and rescan
//! - `d <YYYYMMDD>` select by date, `i <index>` select by position
//! - `p` print the selected snapshot, `h` help, `q` quit
//!
//! Every failure is printed and the loop keeps going.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error};

use crate::fetch::{CaptureClock, Fetcher, Source};
use crate::geocode::{GeocodeCache, Geocoder};
use crate::report;
use crate::store::{Inventory, InventoryEntry};

const HELP: &str = "\
l            list snapshots
u            fetch a new snapshot and rescan
d <date>     select snapshots on YYYYMMDD
i <index>    select snapshot at position (negative from the end)
p            print the selected snapshot
h            this help
q            quit";

#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    List,
    Update,
    Date(String),
    Index(isize),
    Print,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(ShellCommand::Empty);
    };
    let arg = parts.next();

    match (head, arg) {
        ("l", None) => Ok(ShellCommand::List),
        ("u", None) => Ok(ShellCommand::Update),
        ("p", None) => Ok(ShellCommand::Print),
        ("h", None) => Ok(ShellCommand::Help),
        ("q", None) => Ok(ShellCommand::Quit),
        ("d", Some(date)) => Ok(ShellCommand::Date(date.to_string())),
        ("i", Some(index)) => index
            .parse()
            .map(ShellCommand::Index)
            .map_err(|_| format!("not an index: {index}")),
        ("d", None) => Err("usage: d <YYYYMMDD>".to_string()),
        ("i", None) => Err("usage: i <index>".to_string()),
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}

pub struct Shell<'a, S, G> {
    inventory: Inventory,
    fetcher: Fetcher<S>,
    geocode: Option<&'a mut GeocodeCache<G>>,
    selected: Vec<InventoryEntry>,
}

impl<'a, S: Source, G: Geocoder> Shell<'a, S, G> {
    pub fn new(
        inventory: Inventory,
        fetcher: Fetcher<S>,
        geocode: Option<&'a mut GeocodeCache<G>>,
    ) -> Self {
        Shell {
            inventory,
            fetcher,
            geocode,
            selected: Vec::new(),
        }
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        let mut editor = DefaultEditor::new()?;
        println!("{HELP}");

        loop {
            let line = match editor.readline(">> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            };
            if let Err(e) = editor.add_history_entry(line.as_str()) {
                debug!("history not recorded: {e}");
            }

            match parse_command(&line) {
                Ok(ShellCommand::Quit) => break,
                Ok(command) => print!("{}", self.execute(command)),
                Err(message) => println!("{message}"),
            }
        }

        println!("Done.");
        Ok(())
    }

    /// Runs one command and returns what to print.
    pub fn execute(&mut self, command: ShellCommand) -> String {
        match command {
            ShellCommand::List => {
                let listed: Vec<_> = self.inventory.entries().iter().enumerate().collect();
                report::table::render_entries(&listed)
            }
            ShellCommand::Update => match self.inventory.trigger_update(&self.fetcher) {
                Ok(fetched) => {
                    let mut out = format!(
                        "saved {} ({} records)\n",
                        fetched.key,
                        fetched.records.len()
                    );
                    if fetched.clock == CaptureClock::WallClock {
                        out.push_str("warning: page timestamp unreadable, key uses current time\n");
                    }
                    out
                }
                Err(e) => {
                    error!("update: {e}");
                    format!("update failed: {e}\n")
                }
            },
            ShellCommand::Date(date) => {
                self.selected = self.inventory.by_date(&date).into_iter().cloned().collect();
                self.describe_selection()
            }
            ShellCommand::Index(index) => match self.inventory.by_index(index) {
                Ok(entry) => {
                    self.selected = vec![entry.clone()];
                    self.describe_selection()
                }
                Err(e) => {
                    self.selected.clear();
                    format!("{e}\n")
                }
            },
            ShellCommand::Print => self.print_selected(),
            ShellCommand::Help => format!("{HELP}\n"),
            ShellCommand::Quit | ShellCommand::Empty => String::new(),
        }
    }

    pub fn selected(&self) -> &[InventoryEntry] {
        &self.selected
    }

    fn describe_selection(&self) -> String {
        if self.selected.is_empty() {
            return String::from("No record selected.\n");
        }
        let listed: Vec<_> = self
            .selected
            .iter()
            .filter_map(|sel| {
                self.inventory
                    .entries()
                    .iter()
                    .position(|e| e == sel)
                    .map(|i| (i, sel))
            })
            .collect();
        report::table::render_entries(&listed)
    }

    // Prints the last entry of the selection.
    fn print_selected(&mut self) -> String {
        let Some(entry) = self.selected.last() else {
            return String::from("No record selected.\n");
        };

        let records = match entry.load() {
            Ok(records) => records,
            Err(e) => {
                error!("print {}: {e}", entry.key);
                return format!("{e}\n");
            }
        };

        let mut dashboard = report::prepare(&entry.key, &records);
        if let Some(cache) = self.geocode.as_deref_mut() {
            if let Err(e) = report::attach_coordinates(&mut dashboard, cache) {
                error!("geocode cache: {e}");
            }
        }
        report::table::render(&dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodeError;
    use crate::fetch::StaticSource;
    use crate::geocode::Coordinates;

    struct NoGeocoder;

    impl Geocoder for NoGeocoder {
        fn lookup(&self, place: &str) -> Result<Coordinates, GeocodeError> {
            Err(GeocodeError::LookupFailed {
                place: place.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    const PAGE: &str = r#"window.timeStamp=1580000000000</script>window.getAreaStat = [{"provinceName":"湖北省","confirmedCount":5}]"#;

    fn shell(dir: &std::path::Path) -> Shell<'static, StaticSource, NoGeocoder> {
        let inventory = Inventory::open(dir).unwrap();
        let fetcher = Fetcher::new(StaticSource::new("fixture", PAGE), dir);
        Shell::new(inventory, fetcher, None)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("l"), Ok(ShellCommand::List));
        assert_eq!(parse_command("  "), Ok(ShellCommand::Empty));
        assert_eq!(parse_command("d 20200201"), Ok(ShellCommand::Date("20200201".into())));
        assert_eq!(parse_command("i -1"), Ok(ShellCommand::Index(-1)));
        assert!(parse_command("i x").is_err());
        assert!(parse_command("d").is_err());
        assert!(parse_command("zz").is_err());
    }

    #[test]
    fn update_then_select_and_print() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert!(shell.execute(ShellCommand::List).contains("No snapshots"));
        assert!(shell.execute(ShellCommand::Update).contains("1 records"));

        shell.execute(ShellCommand::Index(-1));
        assert_eq!(shell.selected().len(), 1);
        assert!(shell.execute(ShellCommand::Print).contains("湖北省"));
    }

    #[test]
    fn failed_lookups_clear_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert!(shell.execute(ShellCommand::Index(0)).contains("out of range"));
        assert!(shell.execute(ShellCommand::Date("20200101".into())).contains("No record selected"));
        assert!(shell.execute(ShellCommand::Print).contains("No record selected"));
    }
}
