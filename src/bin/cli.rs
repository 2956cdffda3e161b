//! SnapDB - interactive shell

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use snapdb::{Engine, Output, ResultSet};

const DEFAULT_SNAPSHOT: &str = "snapdb.json";

/// Print welcome banner
fn print_banner(snapshot_path: &str) {
    println!(
        r#"
 ____                    ____  ____
/ ___| _ __   __ _ _ __ |  _ \| __ )
\___ \| '_ \ / _` | '_ \| | | |  _ \
 ___) | | | | (_| | |_) | |_| | |_) |
|____/|_| |_|\__,_| .__/|____/|____/
                  |_|

 A minimal relational database with snapshot persistence
 Snapshot: {}
 Type '.help' for help, '.quit' to exit
"#,
        snapshot_path
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Save and exit
  .tables            List all tables
  .schema <table>    Show table schema
  .save              Write the snapshot now

SQL Statements:
  CREATE TABLE ...   Create a new table
  DROP TABLE ...     Drop a table
  INSERT INTO ...    Insert a row
  SELECT ...         Query data (single-table or one JOIN)
  UPDATE ...         Update rows
  DELETE FROM ...    Delete rows

Examples:
  CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE);
  INSERT INTO users (name, email) VALUES ('Alice', 'alice@example.com');
  SELECT * FROM users WHERE email = 'alice@example.com';
"#
    );
}

/// Format a result set as an ASCII table
fn format_results(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.to_string().len());
        }
    }

    let mut output = String::new();

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    output.push_str(&separator);
    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    for row in &result.rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:>width$} ", v.to_string(), width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !result.rows.is_empty() {
        output.push_str(&separator);
    }
    output.push_str(&format!("{} row(s) returned\n", result.len()));

    output
}

/// Execute one SQL statement and print its outcome
fn execute_sql(sql: &str, engine: &mut Engine) {
    let sql = sql.trim();
    if sql.is_empty() {
        return;
    }

    match engine.execute(sql) {
        Ok(Output::Rows(result)) => print!("{}", format_results(&result)),
        Ok(Output::Affected {
            count,
            last_insert_id,
        }) => match last_insert_id {
            Some(id) => println!("{} row(s) affected, id {}", count, id),
            None => println!("{} row(s) affected", count),
        },
        Ok(Output::Ack) => println!("OK"),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Handle special dot commands. Returns false when the shell should exit.
fn handle_special_command(cmd: &str, engine: &mut Engine, snapshot_path: &str) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => {
            if let Err(e) = engine.save(snapshot_path) {
                eprintln!("Error saving snapshot: {}", e);
            }
            println!("Goodbye!");
            return false;
        }
        Some(".save") => match engine.save(snapshot_path) {
            Ok(()) => println!("Saved to {}", snapshot_path),
            Err(e) => eprintln!("Error saving snapshot: {}", e),
        },
        Some(".tables") => {
            let names = engine.database().table_names();
            if names.is_empty() {
                println!("No tables found.");
            } else {
                println!("Tables:");
                for name in names {
                    println!("  {}", name);
                }
            }
        }
        Some(".schema") => match parts.get(1).copied() {
            Some(name) => match engine.database().table(name) {
                Ok(table) => print!("{}", describe_table(table)),
                Err(e) => eprintln!("Error: {}", e),
            },
            None => {
                for table in engine.database().tables() {
                    print!("{}", describe_table(table));
                }
            }
        },
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }

    true
}

/// Human-readable schema listing for one table
fn describe_table(table: &snapdb::storage::Table) -> String {
    let mut info = format!("Table: {} ({} rows)\n", table.name(), table.row_count());
    for col in table.schema().columns() {
        let mut line = format!("  {} {}", col.name, col.data_type);
        if col.primary_key {
            line.push_str(" PRIMARY KEY");
        } else {
            if col.unique {
                line.push_str(" UNIQUE");
            }
            if col.not_null {
                line.push_str(" NOT NULL");
            }
        }
        info.push_str(&line);
        info.push('\n');
    }
    info
}

/// Main REPL loop
fn run_repl(snapshot_path: &str) -> Result<()> {
    let mut engine = Engine::open(snapshot_path);
    let mut editor = DefaultEditor::new()?;

    print_banner(snapshot_path);

    let mut input_buffer = String::new();

    loop {
        let prompt = if input_buffer.is_empty() {
            "snapdb> "
        } else {
            "   ...> "
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                input_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                if let Err(e) = engine.save(snapshot_path) {
                    eprintln!("Error saving snapshot: {}", e);
                }
                println!("Goodbye!");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();

        // Dot commands run immediately, outside any pending statement.
        if input_buffer.is_empty() && trimmed.starts_with('.') {
            editor.add_history_entry(trimmed)?;
            if !handle_special_command(trimmed, &mut engine, snapshot_path) {
                break;
            }
            continue;
        }

        if trimmed.is_empty() {
            // Blank line ends a pending multiline statement.
            if !input_buffer.is_empty() {
                let sql = std::mem::take(&mut input_buffer);
                editor.add_history_entry(sql.trim())?;
                execute_sql(&sql, &mut engine);
            }
            continue;
        }

        input_buffer.push_str(&line);
        input_buffer.push('\n');

        // A semicolon completes the statement.
        if trimmed.ends_with(';') {
            let sql = std::mem::take(&mut input_buffer);
            editor.add_history_entry(sql.trim())?;
            execute_sql(&sql, &mut engine);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let snapshot_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string());

    run_repl(&snapshot_path)
}
