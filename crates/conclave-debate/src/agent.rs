//! Debate agents
//!
//! A [`DebateAgent`] wraps one LLM call behind a role. Roles only change the
//! prompt framing and the default backing model; every agent follows the
//! same answer contract and the same parsing rules.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use conclave_core::StructuredAnswer;
use conclave_llm::{LlmError, LlmProvider, LlmRequest};

use crate::parse::parse_reply;

/// Instructions appended to every system prompt
pub const RESPONSE_CONTRACT: &str = r#"Respond ONLY with a JSON object in exactly this format:
```json
{
  "answer": "short, direct answer (a few words)",
  "reasoning": "why you hold this position",
  "confidence": 0-100,
  "evidence": ["fact or source supporting your answer"]
}
```
Keep "answer" short and plain so it can be compared with the other participants' answers."#;

/// Perspective an agent argues from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Data-driven, looks for quantitative support
    Analyst,
    /// Looks for flaws, missing evidence and failure modes
    Skeptic,
    /// Weighs long-term positioning and opportunity cost
    Strategist,
    /// Focuses on feasibility, cost and execution risk
    Pragmatist,
    /// Brings domain knowledge and precedent
    DomainExpert,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        Self::Analyst,
        Self::Skeptic,
        Self::Strategist,
        Self::Pragmatist,
        Self::DomainExpert,
    ];

    /// Default agent name
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Analyst => "analyst",
            Self::Skeptic => "skeptic",
            Self::Strategist => "strategist",
            Self::Pragmatist => "pragmatist",
            Self::DomainExpert => "domain_expert",
        }
    }

    /// Default backing model
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Analyst => "gpt-4o",
            Self::Skeptic => "claude-3-5-sonnet",
            Self::Strategist => "gemini-1.5-pro",
            Self::Pragmatist => "gpt-4o-mini",
            Self::DomainExpert => "llama-3.1-70b",
        }
    }

    /// Role framing used at the top of the system prompt
    pub fn framing(&self) -> &'static str {
        match self {
            Self::Analyst => {
                "You are a rigorous analyst in a panel debate. Ground every position in data, \
                 base rates and measurable signals. Say so when the numbers are missing."
            }
            Self::Skeptic => {
                "You are the skeptic in a panel debate. Actively look for flaws, hidden \
                 assumptions, missing evidence and ways the proposal could fail. Do not agree \
                 just because others do."
            }
            Self::Strategist => {
                "You are a strategist in a panel debate. Weigh long-term positioning, \
                 competitive dynamics and opportunity cost before answering."
            }
            Self::Pragmatist => {
                "You are a pragmatic operator in a panel debate. Focus on feasibility, cost, \
                 timelines and execution risk."
            }
            Self::DomainExpert => {
                "You are a domain expert in a panel debate. Draw on industry precedent and \
                 specialist knowledge, and flag where the question leaves your expertise."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|r| r.default_name() == wanted)
            .ok_or_else(|| format!("unknown agent role: {}", s))
    }
}

/// Failure of a single agent call
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent '{agent}' LLM call failed: {source}")]
    Llm {
        agent: String,
        #[source]
        source: LlmError,
    },
}

/// A parsed answer plus the accounting of the call that produced it
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub answer: StructuredAnswer,
    /// Cost of the LLM call in USD
    pub cost: f64,
    pub latency_ms: u64,
}

/// A role-bound wrapper around one LLM call
#[derive(Debug, Clone)]
pub struct DebateAgent {
    name: String,
    role: AgentRole,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: Option<String>,
    llm: Arc<dyn LlmProvider>,
}

impl DebateAgent {
    /// Create an agent with the role's default name and model
    pub fn new(role: AgentRole, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            name: role.default_name().to_string(),
            role,
            model: role.default_model().to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            system_prompt: None,
            llm,
        }
    }

    /// Override the agent name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the backing model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set sampling parameters
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the role framing with an externally supplied template
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The effective system prompt, always ending with the answer contract
    pub fn system_prompt(&self) -> String {
        let framing = self.system_prompt.as_deref().unwrap_or(self.role.framing());
        format!("{}\n\n{}", framing.trim_end(), RESPONSE_CONTRACT)
    }

    /// Answer a question, optionally seeing the previous round's answers
    ///
    /// Only the LLM call can fail; unreadable output becomes a degraded answer.
    pub async fn respond(
        &self,
        question: &str,
        context: Option<&str>,
        prior_answers: Option<&[StructuredAnswer]>,
    ) -> Result<AgentResponse, AgentError> {
        let prompt = round_prompt(question, context, prior_answers);
        let request = LlmRequest::with_role(&self.system_prompt(), &prompt)
            .sampling(self.temperature, self.max_tokens)
            .for_model(self.model.clone());

        let response = self.llm.complete(request).await.map_err(|source| {
            metrics::counter!("conclave_agent_llm_failures_total").increment(1);
            AgentError::Llm {
                agent: self.name.clone(),
                source,
            }
        })?;

        let model_id = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model.clone()
        };
        let reply = parse_reply(&response.content);
        if !reply.is_structured() {
            metrics::counter!("conclave_agent_degraded_answers_total").increment(1);
            tracing::warn!(agent = %self.name, model = %model_id, "Unstructured reply, using degraded answer");
        }

        Ok(AgentResponse {
            answer: reply.into_answer(&self.name, &model_id),
            cost: response.cost,
            latency_ms: response.latency_ms,
        })
    }
}

/// Build the user prompt for one round
///
/// Round 0 carries the question and optional context. Later rounds append
/// every peer answer from the previous round, and nothing older.
pub fn round_prompt(
    question: &str,
    context: Option<&str>,
    prior_answers: Option<&[StructuredAnswer]>,
) -> String {
    let mut prompt = format!("## Question\n{}\n", question.trim());

    if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n## Context\n{}\n", ctx));
    }

    match prior_answers {
        Some(answers) if !answers.is_empty() => {
            prompt.push_str("\n## Answers from the previous round\n");
            for answer in answers {
                prompt.push_str(&format!(
                    "\n### {}\nAnswer: {}\nConfidence: {}%\nReasoning: {}\n",
                    answer.agent_name,
                    answer.answer,
                    answer.confidence,
                    if answer.reasoning.is_empty() {
                        "(none given)"
                    } else {
                        answer.reasoning.as_str()
                    }
                ));
            }
            prompt.push_str(
                "\nConsider your peers' answers. Keep your position if you still hold it, \
                 or change it if their arguments convinced you.\n",
            );
        }
        _ => {
            prompt.push_str("\nGive your independent answer.\n");
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_llm::{json_answer, MockProvider};

    #[tokio::test]
    async fn test_respond_parses_contract() {
        let llm = Arc::new(MockProvider::new(vec![json_answer(
            "Expand",
            88,
            &["Churn fell 12%"],
        )])
        .with_cost(0.02));
        let agent = DebateAgent::new(AgentRole::Analyst, llm.clone());

        let response = agent.respond("Should we expand?", None, None).await.unwrap();

        assert_eq!(response.answer.answer, "Expand");
        assert_eq!(response.answer.confidence, 88);
        assert_eq!(response.answer.agent_name, "analyst");
        assert_eq!(response.answer.model_id, "gpt-4o");
        assert_eq!(response.cost, 0.02);

        let request = &llm.requests()[0];
        assert!(request.system.contains("rigorous analyst"));
        assert!(request.system.contains("\"confidence\": 0-100"));
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn test_respond_degrades_on_prose() {
        let llm = Arc::new(MockProvider::constant("Honestly, I'm not sure."));
        let agent = DebateAgent::new(AgentRole::Skeptic, llm);

        let response = agent.respond("q", None, None).await.unwrap();
        assert!(response.answer.degraded);
        assert_eq!(response.answer.answer, "Honestly, I'm not sure.");
        assert_eq!(response.answer.confidence, 50);
    }

    #[tokio::test]
    async fn test_respond_surfaces_llm_failure() {
        let llm = Arc::new(MockProvider::failing(LlmError::NotAvailable));
        let agent = DebateAgent::new(AgentRole::Pragmatist, llm).with_name("ops");

        let err = agent.respond("q", None, None).await.unwrap_err();
        let AgentError::Llm { agent, .. } = err;
        assert_eq!(agent, "ops");
    }

    #[test]
    fn test_custom_system_prompt_keeps_contract() {
        let llm = Arc::new(MockProvider::smart());
        let agent = DebateAgent::new(AgentRole::Strategist, llm)
            .with_system_prompt("You are the CFO.");
        let system = agent.system_prompt();
        assert!(system.starts_with("You are the CFO."));
        assert!(system.contains(RESPONSE_CONTRACT));
    }

    #[test]
    fn test_round_prompt_includes_all_prior_answers() {
        let prior = vec![
            StructuredAnswer::new("analyst", "m", "Expand", 80).with_reasoning("growth"),
            StructuredAnswer::new("skeptic", "m", "Wait", 60),
        ];
        let prompt = round_prompt("Expand?", Some("EU market"), Some(&prior));

        assert!(prompt.contains("## Context\nEU market"));
        assert!(prompt.contains("### analyst\nAnswer: Expand\nConfidence: 80%\nReasoning: growth"));
        assert!(prompt.contains("### skeptic\nAnswer: Wait"));
        assert!(prompt.contains("(none given)"));
    }

    #[test]
    fn test_first_round_prompt_has_no_peers() {
        let prompt = round_prompt("Expand?", None, None);
        assert!(!prompt.contains("previous round"));
        assert!(!prompt.contains("## Context"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Domain Expert".parse::<AgentRole>().unwrap(), AgentRole::DomainExpert);
        assert_eq!("skeptic".parse::<AgentRole>().unwrap(), AgentRole::Skeptic);
        assert!("oracle".parse::<AgentRole>().is_err());
    }
}
