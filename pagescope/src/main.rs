use colored::Colorize;
use commands::command_argument_builder;
use pagescope::handlers::{handle_analyze, handle_serve};
use pagescope_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // JSON on stdout must stay parseable
    let json_output = chosen_command
        .subcommand_matches("analyze")
        .and_then(|sub| sub.get_one::<String>("format"))
        .is_some_and(|format| format == "json");

    if !quiet && !json_output {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("serve", primary_command)) => handle_serve(primary_command).await,
        Some(("analyze", primary_command)) => handle_analyze(primary_command, quiet).await,
        None => return,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
