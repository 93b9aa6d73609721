//! Fuzzy Record Linker - Command Line Interface
//!
//! This binary runs full matching batches and inspects previously built
//! engine snapshots. A batch builds the token index from the reference
//! table, matches every row of the messy table against it, rearranges rank
//! collisions, and writes `results.csv` plus the engine snapshot into the
//! configured operating directory.
//!
//! # Commands
//!
//! - **`<configuration.yaml>`** - Runs a full matching batch
//! - **`lookup`** - Matches one ad-hoc row against a saved engine snapshot
//! - **`info`** - Displays summary statistics for a saved engine snapshot
//!
//! # Usage Examples
//!
//! ```bash
//! # Run a full batch
//! fuzzylink configuration.yaml
//!
//! # Match a single row against a saved snapshot
//! fuzzylink lookup out/fuzzy_engine.rkyv "Customer_Name=Flat Ridge 4 Wind, LLC"
//!
//! # Inspect a snapshot
//! fuzzylink info out/fuzzy_engine.rkyv
//!
//! # Show help
//! fuzzylink --help
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - General error (I/O, persistence, bad arguments)
//! - `2` - Configuration missing or malformed
//! - `3` - Data table missing or unreadable

use std::env;
use std::process;

use fuzzylink::table::Row;
use fuzzylink::{load_engine, run_matching, Error};

/// Candidates printed by the `lookup` command.
const MAX_LOOKUP_RESULTS: usize = 3;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_help();
        return;
    }

    if args.len() < 2 {
        eprintln!("Error: not enough arguments\n");
        print_help();
        process::exit(1);
    }

    match args[1].as_str() {
        "lookup" => {
            if args.len() < 4 {
                eprintln!("Error: 'lookup' requires a snapshot path and at least one Header=Value pair\n");
                print_help();
                process::exit(1);
            }
            handle_lookup(&args[2], &args[3..]).await;
        }
        "info" => {
            if args.len() != 3 {
                eprintln!("Error: 'info' requires exactly one snapshot path\n");
                print_help();
                process::exit(1);
            }
            handle_info(&args[2]).await;
        }
        config_path => {
            if args.len() != 2 {
                eprintln!("Error: expected exactly one configuration path\n");
                print_help();
                process::exit(1);
            }
            handle_batch(config_path).await;
        }
    }
}

/// Runs a full matching batch from a configuration file.
async fn handle_batch(config_path: &str) {
    println!("Running matching batch from: {}", config_path);

    match run_matching(config_path).await {
        Ok(summary) => {
            println!("\n✓ Matching completed successfully!");
            println!("  Query rows processed:  {}", summary.processed);
            println!("  Exact key matches:     {}", summary.exact_key_matches);
            println!("  Unmatched rows:        {}", summary.unmatched);
            println!("  Verified collisions:   {}", summary.verified_collisions);
            println!("  Results:               {}", summary.results_path);
            println!("  Engine snapshot:       {}", summary.engine_path);
        }
        Err(e) => {
            eprintln!("\n✗ Matching failed: {}", e);
            process::exit(exit_code(&e));
        }
    }
}

/// Matches one command-line row against a saved snapshot.
///
/// Each argument after the snapshot path is a `Header=Value` pair; the pairs
/// form the query row exactly as a messy-table row would.
async fn handle_lookup(snapshot_path: &str, pairs: &[String]) {
    let mut query: Row = Row::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((header, value)) => {
                query.insert(header.trim().to_string(), value.trim().to_string());
            }
            None => {
                eprintln!("Error: '{}' is not a Header=Value pair", pair);
                process::exit(1);
            }
        }
    }

    let engine = match load_engine(snapshot_path).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("✗ Cannot load engine snapshot: {}", e);
            process::exit(exit_code(&e));
        }
    };

    match engine.look_up(&query) {
        Ok(matches) if matches.is_empty() => {
            println!("✗ No candidates for the given row");
        }
        Ok(matches) => {
            println!("✓ {} candidate(s), best first:\n", matches.len());
            for candidate in matches.iter().take(MAX_LOOKUP_RESULTS) {
                for (column, value) in &candidate.row {
                    println!("  {}: {}", column, value);
                }
                println!();
            }
        }
        Err(e) => {
            eprintln!("✗ Lookup failed: {}", e);
            process::exit(exit_code(&e));
        }
    }
}

/// Prints summary statistics for a saved snapshot.
async fn handle_info(snapshot_path: &str) {
    match load_engine(snapshot_path).await {
        Ok(engine) => {
            let info = engine.info();
            println!("Engine snapshot: {}", snapshot_path);
            println!();
            println!("  Name:                 {}", info.name);
            println!("  Reference rows:       {}", info.reference_rows);
            println!("  Reference groups:     {}", info.reference_groups);
            println!("  Target groups:        {}", info.target_groups);
            println!("  Pools:                {}", info.pools);
            println!("  Distinct tokens:      {}", info.distinct_tokens);
            println!("  Postings:             {}", info.postings);
        }
        Err(e) => {
            eprintln!("✗ Cannot load engine snapshot: {}", e);
            process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Config(_) | Error::InvalidGroup { .. } => 2,
        Error::Input(_) => 3,
        _ => 1,
    }
}

/// Prints usage information for the CLI.
fn print_help() {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "fuzzylink".to_string());
    println!("Fuzzy Record Linker");
    println!();
    println!("USAGE:");
    println!("  {} <configuration.yaml>", program);
    println!("  {} lookup <snapshot> <Header=Value>...", program);
    println!("  {} info <snapshot>", program);
    println!("  {} --help", program);
    println!();
    println!("COMMANDS:");
    println!("  <configuration.yaml>   Run a full matching batch");
    println!("  lookup                 Match one ad-hoc row against a saved snapshot");
    println!("  info                   Display snapshot statistics");
    println!();
    println!("The configuration file names the reference and messy CSV tables,");
    println!("the backbone of weighted column groups, and the operating");
    println!("directory that receives results.csv and the engine snapshot.");
    println!();
    println!("OPTIONS:");
    println!("  --help, -h             Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("  RUST_LOG               Log filter (e.g. RUST_LOG=fuzzylink=debug)");
}
