use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use itertools::Itertools;
use select_columns::{extract_columns, parse_statement};
use std::{
    fs,
    io::{self, IsTerminal, Read, Write},
    path::PathBuf,
};

/// Command line arguments for the column extractor
#[derive(Debug, Parser)]
#[command(name = "select-columns", version, about = "List the columns a SQL SELECT produces")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the display name of every selected column
    Columns {
        #[command(flatten)]
        input: Input,

        /// Separator between names, one per line by default
        #[arg(short, long)]
        delimiter: Option<String>,
    },
    /// Print the grouped token tree of the statement
    Tree {
        #[command(flatten)]
        input: Input,
    },
}

/// Where the SQL statement comes from
#[derive(Debug, Args)]
pub struct Input {
    /// SQL statement text; read from --file or stdin when absent
    pub sql: Option<String>,

    /// Read the statement from a file
    #[arg(short, long, conflicts_with = "sql")]
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Default tracing filter when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Input {
    /// Returns the statement text, or `None` when stdin is an interactive terminal
    pub fn read(&self) -> Result<Option<String>> {
        if let Some(sql) = &self.sql {
            return Ok(Some(sql.clone()));
        }
        if let Some(path) = &self.file {
            let sql = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Ok(Some(sql));
        }
        let mut stdin = io::stdin();
        if stdin.is_terminal() {
            return Ok(None);
        }
        let mut sql = String::new();
        stdin
            .read_to_string(&mut sql)
            .context("failed to read SQL from stdin")?;
        Ok(Some(sql))
    }
}

/// Renders extracted names joined by `delimiter`
pub fn format_columns(columns: &[String], delimiter: Option<&str>) -> String {
    columns.iter().join(delimiter.unwrap_or("\n"))
}

pub struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Reads one line; returns false at end of input
    pub fn read_input(&mut self) -> Result<bool> {
        self.buffer.clear();
        io::stdout().flush()?;
        let read = io::stdin().read_line(&mut self.buffer)?;
        self.buffer = self.buffer.trim_end().to_string();
        Ok(read > 0)
    }
}

pub fn print_prompt() {
    print!("sql> ");
}

/// Shell state toggled by dot commands
#[derive(Debug, Default)]
pub struct Session {
    pub show_tree: bool,
}

/// Handles one line of input; returns true when the shell should exit
pub fn handle_command(line: &str, session: &mut Session) -> Result<bool> {
    match line.trim() {
        ".exit" | ".quit" => Ok(true),
        ".tree" => {
            session.show_tree = !session.show_tree;
            println!("tree output {}", if session.show_tree { "on" } else { "off" });
            Ok(false)
        }
        cmd if cmd.is_empty() => Ok(false),
        cmd if cmd.starts_with('.') => {
            println!("Unrecognized command '{}'.", cmd);
            Ok(false)
        }
        sql => {
            match extract_columns(sql) {
                Ok(columns) => println!("{}", format_columns(&columns, Some(", "))),
                Err(err) => println!("Error: {}", err),
            }
            if session.show_tree {
                if let Ok(statement) = parse_statement(sql) {
                    print!("{}", statement.dump());
                }
            }
            Ok(false)
        }
    }
}

pub fn repl_mode(show_tree: bool) -> Result<()> {
    let mut input_buffer = InputBuffer::new();
    let mut session = Session { show_tree };

    loop {
        print_prompt();
        if !input_buffer.read_input()? {
            println!();
            break Ok(());
        }

        if handle_command(&input_buffer.buffer, &mut session)? {
            break Ok(());
        }
    }
}
