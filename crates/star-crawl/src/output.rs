use crate::cli::OutputFormat;
use colored::Colorize;
use crawler_core::{CrawlSummary, Repository};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a CrawlSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<&'a [&'a Repository]>,
}

/// Print the outcome of a crawl, with the top repositories for dry runs
pub fn output_summary(summary: &CrawlSummary, top: Option<&[&Repository]>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let report = JsonReport { summary, top };
            if let Ok(json) = serde_json::to_string_pretty(&report) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => {
            if let Some(from) = summary.resumed_from {
                println!("Resumed after {} repositories", from);
            }
            println!("Fetched: {}", summary.fetched.to_string().bold());
            println!("Stored:  {}", summary.stored.to_string().bold());

            if let Some(top) = top {
                println!();
                println!("Top repositories:");
                for repo in top {
                    println!(
                        "  {:>8} {}  {}",
                        repo.stars.to_string().yellow(),
                        format!("{}/{}", repo.owner, repo.name).cyan(),
                        repo.url.dimmed()
                    );
                }
            }

            println!("{}", "Done!".green().bold());
        }
    }
}

#[derive(Serialize)]
pub struct JsonError {
    pub error: bool,
    pub message: String,
}

pub fn output_error(err: &anyhow::Error, format: OutputFormat) {
    eprintln!("{}", format_error(err, format));
}

fn format_error(err: &anyhow::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let json_err = JsonError {
                error: true,
                message: format!("{:#}", err),
            };
            serde_json::to_string_pretty(&json_err).unwrap_or_else(|_| {
                serde_json::json!({"error": true, "message": &json_err.message}).to_string()
            })
        }
        OutputFormat::Text => format!("{}: {:#}", "Error".red().bold(), err),
    }
}
