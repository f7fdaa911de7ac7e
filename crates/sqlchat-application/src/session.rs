//! Session context: everything one chat session owns.
//!
//! Created when the operator connects and torn down with [`SessionContext::close`].
//! Nothing here is global; two sessions never share a conversation.

use std::sync::Arc;
use uuid::Uuid;

use sqlchat_core::config::PromptConfig;
use sqlchat_core::{
    CompletionService, Conversation, DatabaseHandle, DialectProfile, Result, SchemaProvider,
};

use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::prompts::PromptTemplates;
use crate::query_synthesizer::QuerySynthesizer;
use crate::response_synthesizer::ResponseSynthesizer;

/// Prompt-side settings of a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub dialect: DialectProfile,
    pub domain_notes: Vec<String>,
    /// Seeded as the first assistant turn; `None` starts empty.
    pub greeting: Option<String>,
    pub max_rows: usize,
}

impl SessionSettings {
    pub fn from_prompt_config(config: &PromptConfig) -> Self {
        Self {
            dialect: config.dialect.profile(),
            domain_notes: config.domain_notes.clone(),
            greeting: Some(config.greeting.clone()).filter(|g| !g.trim().is_empty()),
            max_rows: config.max_rows,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_prompt_config(&PromptConfig::default())
    }
}

pub struct SessionContext {
    id: Uuid,
    database: Arc<dyn DatabaseHandle>,
    schema: Arc<dyn SchemaProvider>,
    orchestrator: Orchestrator,
    conversation: Conversation,
    greeting: Option<String>,
}

impl SessionContext {
    /// Wires the pipeline around an already-connected database handle.
    pub fn new<D>(
        database: Arc<D>,
        completion: Arc<dyn CompletionService>,
        settings: SessionSettings,
    ) -> Result<Self>
    where
        D: DatabaseHandle + 'static,
    {
        let templates = Arc::new(PromptTemplates::new(settings.dialect, settings.domain_notes)?);
        let schema: Arc<dyn SchemaProvider> = database.clone();

        let orchestrator = Orchestrator::new(
            schema.clone(),
            database.clone(),
            QuerySynthesizer::new(completion.clone(), templates.clone()),
            ResponseSynthesizer::new(completion, templates, settings.max_rows),
        );

        let id = Uuid::new_v4();
        tracing::info!(session = %id, "session started");

        Ok(Self {
            id,
            database,
            schema,
            orchestrator,
            conversation: new_conversation(settings.greeting.as_deref()),
            greeting: settings.greeting,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handles one question and records it in this session's conversation.
    pub async fn ask(&mut self, question: &str) -> TurnOutcome {
        self.orchestrator.handle(&mut self.conversation, question).await
    }

    /// Reads the live schema snapshot.
    pub async fn schema_snapshot(&self) -> Result<String> {
        self.schema.get_table_info().await
    }

    /// Discards the transcript and starts over (greeting only).
    pub fn reset(&mut self) {
        self.conversation = new_conversation(self.greeting.as_deref());
        tracing::info!(session = %self.id, "conversation reset");
    }

    /// Ends the session and releases the database handle.
    pub async fn close(self) {
        self.database.close().await;
        tracing::info!(session = %self.id, turns = self.conversation.len(), "session closed");
    }
}

fn new_conversation(greeting: Option<&str>) -> Conversation {
    match greeting {
        Some(greeting) => Conversation::with_greeting(greeting),
        None => Conversation::new(),
    }
}
