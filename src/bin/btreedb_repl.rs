//! Line-oriented REPL for manually exercising a `btreedb` database.
//!
//! This is the one place in the project that turns a library `Err` into a
//! process exit code and a stderr diagnostic — the library itself never
//! calls `std::process::exit`. Run with `RUST_LOG=btreedb=trace` to watch
//! pages load, flush, split, and promote a new root.

use std::process::ExitCode;

use btreedb::{Database, DatabaseConfig};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> btreedb::Result<()> {
    let db = Database::open(DatabaseConfig::new("btree.db"))?;
    let mut rl = DefaultEditor::new()
        .map_err(|e| std::io::Error::other(format!("failed to initialize REPL: {e}")))?;

    println!("btreedb REPL");
    println!("Commands:");
    println!("  set <key> <value>  - insert or update a key-value pair");
    println!("  get <key>          - retrieve a value by key");
    println!("  .dump              - print the tree structure");
    println!("  .exit              - flush all data to disk and exit");
    println!();

    loop {
        match rl.readline("btreedb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == ".exit" {
                    break;
                }
                if line == ".dump" {
                    match db.test_print() {
                        Ok(tree) => print!("{tree}"),
                        Err(e) => println!("error: {e}"),
                    }
                    continue;
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts.as_slice() {
                    ["set", key, rest @ ..] if !rest.is_empty() => {
                        let value = rest.join(" ");
                        match db.set(key, &value) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("error: {e}"),
                        }
                    }
                    ["get", key] => match db.get(key) {
                        Ok(Some(value)) => println!("{value}"),
                        Ok(None) => println!("(nil)"),
                        Err(e) => println!("error: {e}"),
                    },
                    _ => {
                        println!("unknown command, use 'set', 'get', '.dump', or '.exit'");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(e) => {
                println!("error: {e}");
                break;
            }
        }
    }

    db.close()?;
    println!("flushed to disk, goodbye");
    Ok(())
}
