//! Debate command - Ask the panel a question
//!
//! Usage:
//! ```bash
//! conclave debate "Should we expand to Europe?" --context "ARR grew 40%" --rounds 3
//! conclave debate "Rewrite in Rust?" --provider openai --model gpt-4o-mini --json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use conclave_core::{ConsensusLevel, DebateResult, DebateStatus};

use super::panel::PanelArgs;

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// Question to debate
    pub question: String,

    /// Background shared with every agent
    #[arg(long)]
    pub context: Option<String>,

    #[command(flatten)]
    pub panel: PanelArgs,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the debate command
pub async fn run(args: DebateArgs) -> Result<()> {
    let config = args.panel.orchestrator_config();
    let orchestrator = args.panel.orchestrator(config)?;
    tracing::info!(
        agents = orchestrator.agents().len(),
        max_rounds = orchestrator.config.max_rounds,
        "Starting debate"
    );

    if !args.json {
        println!(
            "{} {} agents, up to {} rounds",
            "🗣  Debating with".bold().cyan(),
            orchestrator.agents().len(),
            orchestrator.config.max_rounds
        );
        println!();
    }

    let result = orchestrator
        .debate(&args.question, args.context.as_deref())
        .await;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{}", json);
    } else {
        print_debate(&result);
    }

    Ok(())
}

/// Colour a consensus level for terminal output
pub fn level_label(level: ConsensusLevel) -> ColoredString {
    let label = level.as_str().to_uppercase();
    match level {
        ConsensusLevel::Strong => label.green().bold(),
        ConsensusLevel::Moderate => label.cyan().bold(),
        ConsensusLevel::Weak => label.yellow().bold(),
        ConsensusLevel::Deadlock => label.red().bold(),
    }
}

/// Print every round and the final outcome
pub fn print_debate(result: &DebateResult) {
    for round in &result.rounds {
        println!(
            "{} {}  consensus: {}",
            "Round".bold(),
            round.round_number + 1,
            level_label(round.level())
        );

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Agent").fg(Color::Cyan),
                Cell::new("Answer").fg(Color::Cyan),
                Cell::new("Confidence").fg(Color::Cyan),
                Cell::new("Model").fg(Color::Cyan),
            ]);
        for answer in &round.answers {
            let text = if answer.degraded {
                format!("{} (unstructured)", answer.answer)
            } else {
                answer.answer.clone()
            };
            table.add_row(vec![
                Cell::new(&answer.agent_name),
                Cell::new(text),
                Cell::new(format!("{}%", answer.confidence)),
                Cell::new(&answer.model_id),
            ]);
        }
        println!("{table}");
        println!();
    }

    match result.status {
        DebateStatus::Completed => crate::print_success(&format!(
            "Debate completed in {} round(s)",
            result.total_rounds()
        )),
        _ => crate::print_warning(&format!(
            "Debate ended with status {}: {}",
            result.status,
            result.error_message.as_deref().unwrap_or("no details")
        )),
    }

    println!();
    println!("{} {}", "Final answer:".bold(), result.final_answer.green());
    println!(
        "{} {:.1}%  {} {}",
        "Confidence:".dimmed(),
        result.final_confidence,
        "Consensus:".dimmed(),
        level_label(result.consensus_level)
    );
    println!("{} ${:.4}", "Cost:".dimmed(), result.total_cost);

    if !result.dissenting_views.is_empty() {
        println!();
        println!("{}", "Dissent:".bold());
        for view in &result.dissenting_views {
            println!(
                "  {} {} ({}%): {}",
                "•".yellow(),
                view.agent_name,
                view.confidence,
                view.answer
            );
        }
    }
}
