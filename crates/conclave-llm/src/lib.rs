//! # Conclave LLM
//!
//! The LLM call boundary used by debate agents.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI (and compatible gateways) | API | `OPENAI_API_KEY` |
//! | Ollama | Local | None |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use conclave_llm::{MockProvider, LlmProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("42");
//!     let response = llm.ask("What is the answer?").await.unwrap();
//!     assert_eq!(response, "42");
//! }
//! ```

mod chat;
pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use config::{ConfigError, LlmConfig};
pub use mock::{json_answer, MockProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{estimate_cost, LlmError, LlmProvider, LlmRequest, LlmResponse};
