use std::{
    io::{BufRead, BufReader},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{BatchArgs, Cli, Command, ExplainArgs, SearchArgs, TermsArgs};
use keymatch::{
    DataDir,
    RedbStore,
    error,
    scoring,
    search::{self, Query},
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("KEYMATCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Exit status for failures, kept apart from the "no match" status 1.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: &Cli) -> error::Result<ExitCode> {
    match &cli.command {
        Command::Search(args) => {
            let store = open_store(cli)?;
            return cmd_search(&store, args);
        }
        Command::Batch(args) => {
            let store = open_store(cli)?;
            cmd_batch(&store, args)?;
        }
        Command::Terms(args) => cmd_terms(args)?,
        Command::Explain(args) => cmd_explain(args)?,
        Command::Status(args) => cmd_status(cli, args.json)?,
        Command::Completions(args) => args.generate(),
    }

    Ok(ExitCode::SUCCESS)
}

fn store_path(cli: &Cli) -> error::Result<PathBuf> {
    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    Ok(data_dir.store(cli.store.as_deref()))
}

fn open_store(cli: &Cli) -> error::Result<RedbStore> {
    RedbStore::open(&store_path(cli)?, &cli.table)
}

/// Exits with status 1 when nothing matches, so scripts can branch on it.
fn cmd_search(
    store: &RedbStore,
    args: &SearchArgs,
) -> error::Result<ExitCode> {
    let query = Query::parse(&args.query)?;
    let outcome = search::search(store, &query);

    if args.json {
        println!("{}", search::format_json(&query, &outcome)?);
    } else {
        println!("{}", search::format_human(&outcome));
    }

    Ok(if outcome.is_found() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_batch(store: &RedbStore, args: &BatchArgs) -> error::Result<()> {
    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let mut queries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        // Blank lines are skipped rather than rejected as empty queries.
        if line.is_empty() {
            continue;
        }
        queries.push(Query::parse(line)?);
    }
    tracing::debug!(count = queries.len(), "resolving batch");

    let outcomes = search::search_batch(store, &queries);

    for (query, outcome) in queries.iter().zip(&outcomes) {
        if args.json {
            println!("{}", search::format_json(query, outcome)?);
        } else {
            match outcome.candidate() {
                Some(c) => {
                    println!("{query}\t[{}] {}\t{}", c.score, c.key, c.value);
                }
                None => println!("{query}\t-"),
            }
        }
    }

    let found = outcomes.iter().filter(|m| m.is_found()).count();
    eprintln!("{found}/{} queries matched", queries.len());
    Ok(())
}

fn cmd_terms(args: &TermsArgs) -> error::Result<()> {
    let query = Query::parse(&args.query)?;
    let terms = query.probe_terms();

    if args.json {
        println!("{}", serde_json::to_string(&terms)?);
    } else {
        for term in &terms {
            println!("{term}");
        }
    }
    Ok(())
}

fn cmd_explain(args: &ExplainArgs) -> error::Result<()> {
    let query = Query::parse(&args.query)?;
    let breakdown = scoring::explain(&args.key, query.as_str());

    if args.json {
        println!("{}", serde_json::to_string(&breakdown)?);
        return Ok(());
    }

    println!("key: {}", breakdown.key);
    println!("query: {}", breakdown.query);
    for t in &breakdown.terms {
        println!("  {:<20} {:>3}", t.term, t.score);
    }
    if let Some(agg) = &breakdown.aggregate {
        println!(
            "highest: {}  other average: {}  matched: {}",
            agg.highest, agg.other_average, agg.matched
        );
    }
    println!("score: {}", breakdown.total);
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    store: String,
    table: String,
    records: u64,
}

fn cmd_status(cli: &Cli, json: bool) -> error::Result<()> {
    let path = store_path(cli)?;
    let store = RedbStore::open(&path, &cli.table)?;

    let report = StatusReport {
        store: path.display().to_string(),
        table: store.table_name().to_string(),
        records: store.len()?,
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("Store: {}", report.store);
        println!("Table: {}", report.table);
        println!("Records: {}", report.records);
    }
    Ok(())
}
