//! Validate command - surface input issues without the full computation report

use crate::cmd::read_return;
use crate::tax::{self, warnings::Warning};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON file containing the return document (or "-" for stdin)
    #[arg(short, long)]
    r#return: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    assessment_year: String,
    issue_count: usize,
    issues: Vec<Warning>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = read_return(&self.r#return)?;
        let computation = tax::compute(&input)?;

        if self.json {
            let output = ValidationOutput {
                assessment_year: computation.assessment_year.display(),
                issue_count: computation.warnings.len(),
                issues: computation.warnings.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(&computation.warnings, &computation.assessment_year.display());
        }

        // Exit with code 1 if issues found
        if !computation.warnings.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, warnings: &[Warning], year: &str) {
        println!();
        println!("VALIDATION RESULTS ({})", year);
        println!();

        if warnings.is_empty() {
            println!("\u{2713} No issues found.");
        } else {
            println!("\u{26A0} {} issue(s) found:", warnings.len());
            println!();
            for (i, warning) in warnings.iter().enumerate() {
                println!("  {}. {}", i + 1, warning.message());
            }
            println!();
        }
    }
}
