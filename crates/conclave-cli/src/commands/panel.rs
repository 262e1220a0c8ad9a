//! Panel options shared by `debate` and `validate`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use conclave_debate::{AgentRole, LoggingEventSink};
use conclave_llm::LlmConfig;
use conclave_runtime::{AgentRegistry, CollectionMode, DebateOrchestrator, OrchestratorConfig};

/// Which agents debate and how
#[derive(Args, Debug)]
pub struct PanelArgs {
    /// LLM provider (mock, ollama, openai)
    #[arg(long, env = "CONCLAVE_DEFAULT_PROVIDER")]
    pub provider: Option<String>,

    /// Model for every agent (defaults to each role's model with the mock provider)
    #[arg(long, env = "CONCLAVE_DEFAULT_MODEL")]
    pub model: Option<String>,

    /// Agent roles, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "analyst,skeptic,strategist"
    )]
    pub roles: Vec<AgentRole>,

    /// Maximum number of rounds
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Ask agents one at a time instead of all at once
    #[arg(long)]
    pub sequential: bool,

    /// Round timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Fail the debate when any agent fails
    #[arg(long)]
    pub require_all: bool,
}

impl PanelArgs {
    /// Orchestrator settings: environment first, then flags
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::from_env();
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if self.sequential {
            config.mode = CollectionMode::Sequential;
        }
        if let Some(secs) = self.timeout {
            config.round_timeout = Duration::from_secs(secs);
        }
        if self.require_all {
            config.require_all_agents = true;
        }
        config
    }

    /// Build the agent registry for these options
    pub fn registry(&self, config: OrchestratorConfig) -> Result<AgentRegistry> {
        let mut llm_config = LlmConfig::from_env();
        if let Some(provider) = &self.provider {
            llm_config.default_provider = provider.to_lowercase();
        }
        if let Some(model) = &self.model {
            llm_config.default_model = model.clone();
        }

        let llm = llm_config
            .default_llm()
            .with_context(|| format!("Failed to set up provider '{}'", llm_config.default_provider))?;

        // Role default models only make sense for the mock provider
        let shared_model = match (&self.model, llm_config.default_provider.as_str()) {
            (Some(model), _) => Some(model.clone()),
            (None, "mock") => None,
            (None, _) => Some(llm_config.default_model.clone()),
        };

        let mut registry = AgentRegistry::new(llm, config);
        for role in &self.roles {
            let agent = match &shared_model {
                Some(model) => registry.build_agent(*role, model),
                None => registry.build_agent(*role, role.default_model()),
            };
            registry
                .register(agent)
                .with_context(|| format!("Invalid panel: role '{}' listed twice", role))?;
        }
        Ok(registry)
    }

    /// Build an orchestrator that logs its events
    pub fn orchestrator(&self, config: OrchestratorConfig) -> Result<DebateOrchestrator> {
        self.registry(config)?
            .build_orchestrator(Some(Arc::new(LoggingEventSink)))
            .context("Failed to build orchestrator")
    }
}
