//! Agent registry - explicit, per-process panel construction
//!
//! Holds the LLM providers and the agents built from them. Construct one per
//! process (or per test) and pass it where a panel is needed.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use conclave_debate::{AgentRole, DebateAgent, EventSink};
use conclave_llm::LlmProvider;

use crate::orchestrator::{DebateError, DebateOrchestrator, OrchestratorConfig};

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Agent '{0}' is already registered")]
    Duplicate(String),
    #[error(transparent)]
    Debate(#[from] DebateError),
}

/// Registry of agents and the providers backing them
#[derive(Debug)]
pub struct AgentRegistry {
    /// Configuration applied to agents and orchestrators built here
    pub config: OrchestratorConfig,
    default_llm: Arc<dyn LlmProvider>,
    /// Model id -> provider override
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    agents: Vec<DebateAgent>,
}

impl AgentRegistry {
    /// Create an empty registry whose agents default to `default_llm`
    pub fn new(default_llm: Arc<dyn LlmProvider>, config: OrchestratorConfig) -> Self {
        Self {
            config,
            default_llm,
            providers: HashMap::new(),
            agents: Vec::new(),
        }
    }

    /// Route a model id to a specific provider
    pub fn with_provider(mut self, model: impl Into<String>, llm: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(model.into(), llm);
        self
    }

    /// The provider used for a model id
    pub fn provider_for(&self, model: &str) -> Arc<dyn LlmProvider> {
        self.providers
            .get(model)
            .cloned()
            .unwrap_or_else(|| self.default_llm.clone())
    }

    /// Add a prebuilt agent; names must be unique
    pub fn register(&mut self, agent: DebateAgent) -> Result<(), RegistryError> {
        if self.get(agent.name()).is_some() {
            return Err(RegistryError::Duplicate(agent.name().to_string()));
        }
        tracing::debug!(agent = %agent.name(), role = %agent.role(), model = %agent.model(), "Agent registered");
        self.agents.push(agent);
        Ok(())
    }

    /// Build and add an agent for a role, using the role's default model
    pub fn register_role(&mut self, role: AgentRole) -> Result<(), RegistryError> {
        let agent = self.build_agent(role, role.default_model());
        self.register(agent)
    }

    /// Build an agent for a role and model without registering it
    pub fn build_agent(&self, role: AgentRole, model: &str) -> DebateAgent {
        DebateAgent::new(role, self.provider_for(model))
            .with_model(model)
            .with_sampling(self.config.temperature, self.config.max_tokens)
    }

    /// Register one agent per role
    pub fn standard_panel(
        default_llm: Arc<dyn LlmProvider>,
        config: OrchestratorConfig,
        roles: &[AgentRole],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(default_llm, config);
        for role in roles {
            registry.register_role(*role)?;
        }
        Ok(registry)
    }

    /// Remove an agent by name
    pub fn remove(&mut self, name: &str) -> Option<DebateAgent> {
        let idx = self.agents.iter().position(|a| a.name() == name)?;
        Some(self.agents.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&DebateAgent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn agents(&self) -> &[DebateAgent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Build an orchestrator over the registered agents
    pub fn build_orchestrator(
        &self,
        events: Option<Arc<dyn EventSink>>,
    ) -> Result<DebateOrchestrator, RegistryError> {
        let orchestrator = DebateOrchestrator::new(self.agents.clone(), self.config.clone())?;
        Ok(match events {
            Some(sink) => orchestrator.with_events(sink),
            None => orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_llm::MockProvider;

    fn mock() -> Arc<dyn LlmProvider> {
        Arc::new(MockProvider::smart())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = AgentRegistry::new(mock(), OrchestratorConfig::default());
        registry.register_role(AgentRole::Analyst).unwrap();

        let err = registry.register_role(AgentRole::Analyst).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "analyst"));

        let renamed = registry.build_agent(AgentRole::Analyst, "gpt-4o").with_name("analyst-2");
        registry.register(renamed).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_model_routing() {
        let special: Arc<dyn LlmProvider> = Arc::new(MockProvider::smart().named("special"));
        let registry = AgentRegistry::new(mock(), OrchestratorConfig::default())
            .with_provider("claude-3-5-sonnet", special);

        assert_eq!(registry.provider_for("claude-3-5-sonnet").name(), "special");
        assert_eq!(registry.provider_for("gpt-4o").name(), "smart-mock");
    }

    #[test]
    fn test_standard_panel_and_orchestrator() {
        let registry = AgentRegistry::standard_panel(
            mock(),
            OrchestratorConfig::default(),
            &AgentRole::ALL,
        )
        .unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("skeptic").unwrap().model(), "claude-3-5-sonnet");

        let orchestrator = registry.build_orchestrator(None).unwrap();
        assert_eq!(orchestrator.agents().len(), 5);
    }

    #[test]
    fn test_empty_registry_cannot_debate() {
        let mut registry = AgentRegistry::standard_panel(
            mock(),
            OrchestratorConfig::default(),
            &[AgentRole::Pragmatist],
        )
        .unwrap();
        assert!(registry.remove("pragmatist").is_some());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.build_orchestrator(None),
            Err(RegistryError::Debate(DebateError::NoAgents))
        ));
    }
}
