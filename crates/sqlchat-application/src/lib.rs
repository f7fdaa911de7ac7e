pub mod orchestrator;
pub mod prompts;
pub mod query_synthesizer;
pub mod response_synthesizer;
pub mod session;

pub use orchestrator::{Orchestrator, TurnOutcome, is_report_request};
pub use prompts::PromptTemplates;
pub use query_synthesizer::QuerySynthesizer;
pub use response_synthesizer::ResponseSynthesizer;
pub use session::{SessionContext, SessionSettings};
