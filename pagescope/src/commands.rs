use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("pagescope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pagescope")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to a JSON settings file (default: ~/.config/pagescope/config.json)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("serve")
                .about("Run the analysis HTTP endpoint (POST /api/analyze, GET /health)")
                .arg(
                    arg!(--"host" <HOST>)
                        .required(false)
                        .help("Address to bind, overrides the settings file"),
                )
                .arg(
                    arg!(-p --"port" <PORT>)
                        .required(false)
                        .help("Port to bind, overrides the settings file")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            command!("analyze")
                .about("Analyze one page, or every page listed in a file, and print an SEO report")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The page to analyze")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("urls-file"),
                )
                .arg(
                    arg!(-U --"urls-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of pages to analyze")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"no-link-check")
                        .help("Classify links without requesting them")
                        .required(false),
                )
                .arg(
                    arg!(-k --"keywords")
                        .help("Ask the configured model for keyword suggestions")
                        .required(false),
                )
                .arg(
                    arg!(-t --"threads" <THREADS>)
                        .required(false)
                        .help("Maximum number of links checked at once")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-link timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the report to a file instead of stdout")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
