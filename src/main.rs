//! CLI entry point for sheetwright.

mod cli;
mod cmd;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, PriorityCommands, RuleCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.quiet {
        std::env::set_var("SHEETWRIGHT_QUIET", "1");
    }

    run(cli)
}

/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env("SHEETWRIGHT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { name, force } => cmd::init::cmd_init(name, force),
        Commands::Import { paths, kind } => cmd::import::cmd_import(&paths, kind),
        Commands::Validate { format, entity } => cmd::validate::cmd_validate(format, entity),
        Commands::Show { entity, issues } => cmd::validate::cmd_show(entity, issues),
        Commands::Edit {
            entity,
            row,
            column,
            value,
        } => cmd::edit::cmd_edit(entity, &row, &column, &value),
        Commands::Delete { entity, row } => cmd::edit::cmd_delete(entity, &row),
        Commands::Search {
            query,
            entity,
            offline,
            format,
        } => cmd::search::cmd_search(&query, entity, offline, format),
        Commands::Rule { command } => match command {
            RuleCommands::Add { description } => cmd::rule::cmd_rule_add(&description),
            RuleCommands::AddJson { json } => cmd::rule::cmd_rule_add_json(&json),
            RuleCommands::List => cmd::rule::cmd_rule_list(),
            RuleCommands::Remove { index } => cmd::rule::cmd_rule_remove(index),
            RuleCommands::Suggest { apply } => cmd::rule::cmd_rule_suggest(apply),
        },
        Commands::Priorities { command } => match command {
            PriorityCommands::Show => cmd::priorities::cmd_priorities_show(),
            PriorityCommands::Set { criterion, weight } => {
                cmd::priorities::cmd_priorities_set(&criterion, weight)
            }
            PriorityCommands::Preset { name } => cmd::priorities::cmd_priorities_preset(&name),
            PriorityCommands::Rank { criteria } => cmd::priorities::cmd_priorities_rank(&criteria),
        },
        Commands::Export { out, force } => cmd::export::cmd_export(out, force),
        Commands::Config { validate } => {
            if validate {
                cmd::config::cmd_config_validate()
            } else {
                println!("Usage: sheetwright config --validate");
                Ok(())
            }
        }
        Commands::Version => cmd::util::cmd_version(cli.verbose),
        Commands::Completion { shell } => cmd::util::cmd_completion(shell),
    }
}
