//! combine — copy several source stores into one sandwich database.
//!
//! Opens the destination as a fresh sandwich (it must not already exist),
//! then for each source path allocates a part named after the path and copies
//! every record across.
//!
//! Exit codes: 0 on success, 1 on argument errors, 2 on I/O errors.

use std::process;

use clap::{Arg, Command};

use lamina_bottom::BottomDb;
use lamina_core::{Store, Walker};
use lamina_sandwich::SandwichDb;

fn build_cli() -> Command {
    Command::new("combine")
        .about("Combine several source stores into one sandwich database")
        .arg(
            Arg::new("suffix")
                .short('s')
                .value_name("SUFFIX")
                .help("Append SUFFIX to each source path during open"),
        )
        .arg(
            Arg::new("dest")
                .value_name("DEST")
                .required(true)
                .help("Destination sandwich database (must not exist)"),
        )
        .arg(
            Arg::new("sources")
                .value_name("PART")
                .num_args(0..)
                .help("Source databases to copy, one part per path"),
        )
}

fn main() {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            process::exit(1);
        }
    };

    let Some(dest) = matches.get_one::<String>("dest") else {
        process::exit(1);
    };
    let suffix = matches
        .get_one::<String>("suffix")
        .cloned()
        .unwrap_or_default();
    let sources: Vec<String> = matches
        .get_many::<String>("sources")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let dest_db = match BottomDb::create_new(dest) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open destination database {dest}: {err}");
            process::exit(2);
        }
    };
    let sandwich: SandwichDb<BottomDb> = SandwichDb::new(dest_db);

    for source in &sources {
        eprintln!("processing part {source}");
        let path = format!("{source}{suffix}");

        let source_db = match BottomDb::open(&path) {
            Ok(db) => db,
            Err(err) => {
                eprintln!("failed to open source database {path}: {err}");
                process::exit(2);
            }
        };
        let part = match sandwich.open(source.as_bytes()) {
            Ok(part) => part,
            Err(err) => {
                eprintln!("failed to allocate part {source}: {err}");
                process::exit(2);
            }
        };

        let mut walker = source_db.walker();
        walker.seek_to_first();
        while walker.valid() {
            if let (Some(key), Some(value)) = (walker.key(), walker.value()) {
                if let Err(err) = part.put(&key, &value) {
                    eprintln!("failed to copy record into part {source}: {err}");
                    process::exit(2);
                }
            }
            walker.next();
        }
        if let Err(err) = walker.status() {
            if !err.is_not_found() {
                eprintln!("failed while reading source database {path}: {err}");
                process::exit(2);
            }
        }
    }

    if let Err(err) = sandwich.sync() {
        eprintln!("failed to sync destination database {dest}: {err}");
        process::exit(2);
    }

    eprintln!("done");
}
