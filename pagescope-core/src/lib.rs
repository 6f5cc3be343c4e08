pub mod analysis;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod keywords;
pub mod report;
pub mod scoring;
pub mod server;

use colored::Colorize;

pub use analysis::{AnalyzeRequest, Analyzer, PageAnalysis};
pub use config::Settings;
pub use error::{AnalyzeError, ConfigError, Result};
pub use extract::{PageSignals, extract_signals};
pub use keywords::{KeywordClient, KeywordError};
pub use report::{ReportFormat, render_report};
pub use scoring::{SeoScore, score_page};

pub fn print_banner() {
    println!(
        "{} {}",
        "pagescope".bright_blue().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", "single-page SEO analysis with broken-link verification".bright_white());
    println!();
}
