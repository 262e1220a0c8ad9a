//! Validate command - Debate a hypothesis and record a verdict
//!
//! Usage:
//! ```bash
//! conclave validate "SMBs will pay $50/month for bookkeeping" \
//!     --category pricing --impact high --risk medium --testability easy \
//!     --criterion "10 of 50 trial users convert" --report
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use conclave_core::{Hypothesis, HypothesisCategory, HypothesisStatus, Level, Testability};
use conclave_runtime::{HypothesisValidator, ValidationReport, ValidatorConfig};

use super::debate::{level_label, print_debate};
use super::panel::PanelArgs;

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// The hypothesis statement
    pub statement: String,

    /// Longer description of the hypothesis
    #[arg(long)]
    pub description: Option<String>,

    /// Success criterion (repeatable)
    #[arg(long = "criterion")]
    pub criteria: Vec<String>,

    /// Category (market, customer, problem, solution, pricing, channel, technical, competitive, regulatory, financial)
    #[arg(long, default_value = "market")]
    pub category: HypothesisCategory,

    /// Impact if the hypothesis is wrong (high, medium, low)
    #[arg(long, default_value = "medium")]
    pub impact: Level,

    /// Risk (high, medium, low)
    #[arg(long, default_value = "medium")]
    pub risk: Level,

    /// How cheaply it can be tested (easy, medium, hard)
    #[arg(long, default_value = "medium")]
    pub testability: Testability,

    /// Extra context for the panel
    #[arg(long)]
    pub context: Option<String>,

    /// Minimum score to validate
    #[arg(long, default_value_t = 70.0)]
    pub validation_threshold: f64,

    /// Maximum score to invalidate a rejecting answer
    #[arg(long, default_value_t = 40.0)]
    pub invalidation_threshold: f64,

    #[command(flatten)]
    pub panel: PanelArgs,

    /// Print a markdown report instead of the summary
    #[arg(long, conflicts_with = "json")]
    pub report: bool,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the validate command
pub async fn run(args: ValidateArgs) -> Result<()> {
    let mut hypothesis = Hypothesis::new(&args.statement, args.category).with_ratings(
        args.impact,
        args.risk,
        args.testability,
    );
    if let Some(description) = &args.description {
        hypothesis = hypothesis.with_description(description);
    }
    for criterion in &args.criteria {
        hypothesis = hypothesis.with_success_criterion(criterion);
    }
    tracing::info!(statement = %args.statement, "Validating hypothesis");
    let handle = hypothesis.into_handle();

    let orchestrator = args.panel.orchestrator(args.panel.orchestrator_config())?;
    let validator = HypothesisValidator::new(
        orchestrator,
        ValidatorConfig {
            validation_threshold: args.validation_threshold,
            invalidation_threshold: args.invalidation_threshold,
            ..Default::default()
        },
    );

    let result = validator
        .validate(&handle, args.context.as_deref())
        .await
        .context("Validation could not start")?;
    let hypothesis = handle.lock().await.clone();

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{}", json);
        return Ok(());
    }

    if args.report {
        print!("{}", ValidationReport::new(&hypothesis, &result));
        return Ok(());
    }

    print_debate(&result.debate);
    println!();

    if !result.is_success() {
        crate::print_error(&format!(
            "Validation failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ));
        println!("{} {}", "Next step:".bold(), result.recommendation);
        return Ok(());
    }

    let verdict = match result.status {
        HypothesisStatus::Validated => result.status.to_string().green().bold(),
        HypothesisStatus::Invalidated => result.status.to_string().red().bold(),
        _ => result.status.to_string().yellow().bold(),
    };
    println!("{} {}", "Verdict:".bold(), verdict);
    println!(
        "{} {:.1}  {} {}  {} {:.1}",
        "Score:".dimmed(),
        result.validation_score,
        "Consensus:".dimmed(),
        level_label(result.consensus_level),
        "Priority:".dimmed(),
        hypothesis.priority_score()
    );
    println!(
        "{} {} supporting, {} contradicting",
        "Evidence:".dimmed(),
        hypothesis.supporting_count(),
        hypothesis.contradicting_count()
    );
    println!("{} {}", "Next step:".bold(), result.recommendation);

    Ok(())
}
