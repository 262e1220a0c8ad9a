//! Info command - Show system information
//!
//! Usage:
//! ```bash
//! conclave info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use conclave_debate::AgentRole;
use conclave_llm::LlmConfig;
use conclave_runtime::{OrchestratorConfig, ValidatorConfig};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let llm = LlmConfig::from_env();
    let orchestrator = OrchestratorConfig::from_env();
    let validator = ValidatorConfig::default();

    println!("{}", "Conclave - Multi-agent debate".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Providers:".bold());
    for provider in ["mock", "ollama", "openai"] {
        let mark = if llm.is_configured(provider) {
            "✓".green()
        } else {
            "✗".red()
        };
        let default = if provider == llm.default_provider {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {} {}{}", mark, provider, default);
    }
    println!("  {} {}", "Default model:".dimmed(), llm.default_model);
    println!("  {} {}", "Ollama URL:".dimmed(), llm.ollama_url);
    if !llm.is_configured("openai") {
        crate::print_warning("Set OPENAI_API_KEY to enable the openai provider");
    }
    println!();

    println!("{}", "Roles:".bold());
    for role in AgentRole::ALL {
        println!("  {} {} ({})", "•".cyan(), role.to_string().green(), role.default_model());
    }
    println!();

    println!("{}", "Debate defaults:".bold());
    println!("  {} {}", "Max rounds:".dimmed(), orchestrator.max_rounds);
    println!("  {} {:?}", "Collection:".dimmed(), orchestrator.mode);
    println!("  {} {}s", "Round timeout:".dimmed(), orchestrator.round_timeout.as_secs());
    println!(
        "  {} agreement {:.0}%, strong {:.0}, moderate {:.0}",
        "Consensus:".dimmed(),
        orchestrator.consensus.agreement_threshold * 100.0,
        orchestrator.consensus.strong_confidence,
        orchestrator.consensus.moderate_confidence
    );
    println!(
        "  {} validate at {:.0}, invalidate at {:.0}, support at {}",
        "Verdicts:".dimmed(),
        validator.validation_threshold,
        validator.invalidation_threshold,
        validator.support_threshold
    );
    println!();

    Ok(())
}
