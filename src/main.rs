use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(args)
}

pub fn run(args: cli::Cli) -> Result<()> {
    match args.command {
        cli::Command::Columns { input, delimiter } => match input.read()? {
            Some(sql) => {
                let columns = select_columns::extract_columns(&sql)?;
                info!("Columns: {:?}", columns);
                if !columns.is_empty() {
                    println!("{}", cli::format_columns(&columns, delimiter.as_deref()));
                }
            }
            None => cli::repl_mode(false)?,
        },
        cli::Command::Tree { input } => match input.read()? {
            Some(sql) => {
                let statement = select_columns::parse_statement(&sql)?;
                print!("{}", statement.dump());
            }
            None => cli::repl_mode(true)?,
        },
    }
    Ok(())
}
