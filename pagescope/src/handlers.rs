use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pagescope_core::analysis::{AnalyzeRequest, Analyzer, PageAnalysis};
use pagescope_core::config::Settings;
use pagescope_core::report::{ReportFormat, render, save_report};
use pagescope_core::server;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

/// `RUST_LOG` wins; otherwise use `default_level`. Logs go to stderr so
/// reports on stdout stay clean.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse a single line as a page URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line) {
        if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
            return Some(line.to_string());
        }
    }

    let with_scheme = format!("https://{}", line);
    let plausible_host = |url: Url| {
        url.host_str()
            .is_some_and(|host| host.contains('.') || host == "localhost")
    };
    if Url::parse(&with_scheme).is_ok_and(plausible_host) {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

/// Load and parse page URLs from a file, skipping blanks and `#` comments
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    urls_file: Option<&PathBuf>,
) -> Result<Vec<String>> {
    if let Some(path) = urls_file {
        load_urls_from_file(path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        bail!("Either --url or --urls-file must be provided")
    }
}

pub fn load_settings(config: Option<&PathBuf>) -> Result<Settings> {
    Settings::load(config.map(PathBuf::as_path)).context("Failed to load settings")
}

/// Command line flags take precedence over the settings file.
pub fn apply_serve_overrides(settings: &mut Settings, host: Option<&String>, port: Option<u16>) {
    if let Some(host) = host {
        settings.server.host = host.clone();
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
}

pub fn apply_analyze_overrides(
    settings: &mut Settings,
    threads: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    if let Some(threads) = threads {
        if threads == 0 {
            bail!("--threads must be at least 1");
        }
        settings.verifier.concurrency = threads;
    }
    if let Some(timeout_secs) = timeout_secs {
        if timeout_secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        settings.verifier.timeout_secs = timeout_secs;
    }
    Ok(())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_serve(args: &ArgMatches) -> Result<()> {
    init_tracing("info");

    let mut settings = load_settings(args.get_one::<PathBuf>("config"))?;
    apply_serve_overrides(
        &mut settings,
        args.get_one::<String>("host"),
        args.get_one::<u16>("port").copied(),
    );

    let analyzer = Arc::new(Analyzer::new(&settings)?);
    let app = server::router(analyzer, Duration::from_secs(settings.server.request_timeout_secs));

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    print_divider();
    println!("{}", "  PAGESCOPE SERVER".bright_white().bold());
    print_divider();
    println!("{} POST http://{}/api/analyze", "→".blue(), address);
    println!("{} GET  http://{}/health", "→".blue(), address);
    println!();

    server::serve(listener, app).await.context("Server error")?;
    Ok(())
}

pub async fn handle_analyze(args: &ArgMatches, quiet: bool) -> Result<()> {
    init_tracing("warn");

    let urls = load_urls_from_source(
        args.get_one::<Url>("url"),
        args.get_one::<PathBuf>("urls-file"),
    )?;

    let mut settings = load_settings(args.get_one::<PathBuf>("config"))?;
    apply_analyze_overrides(
        &mut settings,
        args.get_one::<usize>("threads").copied(),
        args.get_one::<u64>("timeout").copied(),
    )?;

    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let check_links = !args.get_flag("no-link-check");
    let suggest_keywords = args.get_flag("keywords");
    let output = args.get_one::<PathBuf>("output");

    let analyzer = Analyzer::new(&settings)?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut analyses: Vec<PageAnalysis> = Vec::new();
    let mut failures = 0usize;
    for url in &urls {
        spinner.set_message(format!("Analyzing {}", url));
        let request = AnalyzeRequest {
            url: url.clone(),
            check_links,
            suggest_keywords,
        };
        match analyzer.analyze(&request).await {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                failures += 1;
                warn!("Analysis of {} failed: {}", url, e);
                spinner.suspend(|| eprintln!("{} {}: {}", "✗".red().bold(), url, e));
            }
        }
    }
    spinner.finish_and_clear();

    if analyses.is_empty() {
        bail!("No page could be analyzed");
    }

    let content = match format {
        ReportFormat::Json if analyses.len() > 1 => serde_json::to_string_pretty(&analyses)?,
        _ => analyses
            .iter()
            .map(|analysis| render(analysis, format))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
    };

    match output {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !quiet {
                println!("{} Report written to {}", "✓".green().bold(), path.display());
            }
        }
        None => println!("{}", content),
    }

    if !quiet && urls.len() > 1 {
        print_divider();
        println!(
            "{} {} analyzed, {} failed",
            "ℹ".blue(),
            analyses.len(),
            failures
        );
    }

    Ok(())
}
