//! Chat orchestration.
//!
//! One call to [`ChatService::chat`] runs the whole turn: agent and prompt
//! resolution, policy and alias lookup, image gating, retrieval, system
//! prompt composition, and the streamed completion. The transcript and run
//! metric are persisted in a completion hook that fires exactly once, on
//! stream end or on irrecoverable error.

mod context;
mod images;

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use plinth_core::ErrorKind;
use plinth_opendal::StorageBackend;
use plinth_postgres::model::{ModelAlias, NewRunMetric, NewTranscript};
use plinth_postgres::query::{AgentRepository, ModelRepository, PromptRepository, TranscriptRepository};
use plinth_postgres::types::{ModelProvider, PromptLabel};
use plinth_postgres::PgClient;
use plinth_inference::client::{ChatMessage, TokenEvent, TokenStream};
use plinth_inference::provider::{GenParams, Provider};
use plinth_inference::{LlmError, ModelRef, ProviderRegistry, UsageStats};
use plinth_runtime::retrieve::{
    ChatTurn, RetrievalDebug, RetrievalOverrides, Retriever,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use images::{IMAGE_SKIPPED_PLACEHOLDER, IMAGE_UNAVAILABLE_PLACEHOLDER};

use crate::TRACING_TARGET;
use crate::error::{ServiceError, ServiceResult};
use crate::prompt::render_template;
use crate::service::retrieval_config_for;

/// Role of an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingRole {
    /// End-user turn.
    User,
    /// Assistant turn (prior history).
    Assistant,
}

/// One part of an incoming message.
#[derive(Debug, Clone)]
pub enum IncomingPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Reference to a stored chat image.
    Image {
        /// The chat image id.
        image_id: Uuid,
    },
}

/// One incoming message of a chat request.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Who spoke.
    pub role: IncomingRole,
    /// Message parts.
    pub parts: Vec<IncomingPart>,
}

impl IncomingMessage {
    /// Creates a plain-text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: IncomingRole::User,
            parts: vec![IncomingPart::Text { text: text.into() }],
        }
    }

    /// Creates a plain-text assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: IncomingRole::Assistant,
            parts: vec![IncomingPart::Text { text: text.into() }],
        }
    }

    /// Concatenates the text parts of this message.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                IncomingPart::Text { text } => Some(text.as_str()),
                IncomingPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Slug of the agent to chat with.
    pub agent_slug: String,
    /// Conversation messages, oldest first; the last user message is the
    /// current turn.
    pub messages: Vec<IncomingMessage>,
    /// Model alias override; falls back to the agent's current policy.
    pub model_alias: Option<String>,
    /// Template variables merged over the prompt version's defaults.
    pub variables: HashMap<String, String>,
    /// Per-request retrieval overrides.
    pub retrieval: RetrievalOverrides,
    /// Request tags; the first tag, when a UUID, is the conversation id.
    pub request_tags: Vec<String>,
}

impl ChatRequest {
    /// Creates a request with a single user message.
    pub fn new(agent_slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent_slug: agent_slug.into(),
            messages: vec![IncomingMessage::user(message)],
            model_alias: None,
            variables: HashMap::new(),
            retrieval: RetrievalOverrides::default(),
            request_tags: Vec::new(),
        }
    }
}

/// Terminal payload of a completed turn.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Full response text.
    pub response_text: String,
    /// Token usage.
    pub usage: UsageStats,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
    /// The retrieval debug record of the turn.
    pub retrieval: RetrievalDebug,
    /// End-to-end latency in milliseconds.
    pub latency_ms: u64,
}

/// One event of a chat turn.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// An incremental response delta.
    Delta(String),
    /// Terminal event; the transcript has been persisted.
    Done(ChatCompletion),
}

/// Stream of chat events.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ServiceResult<ChatEvent>> + Send>>;

/// Handle to a running chat turn.
pub struct ChatHandle {
    /// Unique id of this turn.
    pub run_id: Uuid,
    /// Conversation grouping id; newly generated when the request carried
    /// none.
    pub conversation_id: Uuid,
    /// The event stream.
    pub events: ChatEventStream,
}

/// Chat orchestration service.
#[derive(Clone)]
pub struct ChatService {
    inner: Arc<ChatInner>,
}

struct ChatInner {
    db: PgClient,
    storage: StorageBackend,
    registry: Arc<ProviderRegistry>,
    retriever: Retriever,
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(
        db: PgClient,
        storage: StorageBackend,
        registry: Arc<ProviderRegistry>,
        retriever: Retriever,
    ) -> Self {
        Self {
            inner: Arc::new(ChatInner {
                db,
                storage,
                registry,
                retriever,
            }),
        }
    }

    /// Runs one chat turn.
    ///
    /// NotFound and Invalid conditions surface before any model call.
    /// Provider failures after streaming begins surface through the event
    /// stream; a minimal error-tagged run metric is persisted either way.
    pub async fn chat(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<ChatHandle> {
        let started = jiff::Timestamp::now();
        let mut conn = self.inner.db.get_connection().await.map_err(ServiceError::from)?;

        // Resolve the agent; only active agents serve chat turns.
        let agent = conn
            .find_agent_by_slug(&request.agent_slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("agent", &request.agent_slug))?;
        if !agent.can_serve() {
            return Err(ServiceError::invalid(format!(
                "agent {} is not active",
                agent.slug
            )));
        }

        // Resolve the prod-labeled system prompt and render it.
        let prompt = conn
            .find_prompt(agent.id, "system")
            .await?
            .ok_or_else(|| ServiceError::not_found("prompt", "system"))?;
        let version = conn
            .find_version_by_label(prompt.id, PromptLabel::Prod)
            .await?
            .ok_or_else(|| ServiceError::not_found("prod prompt version", prompt.id))?;

        let mut variables: HashMap<String, String> =
            version.variable_defaults().into_iter().collect();
        variables.extend(request.variables.clone());

        let rendered = render_template(&version.body, &variables)
            .map_err(|error| ServiceError::invalid(error.to_string()))?;

        // Resolve the current policy and the final model alias.
        let policy = conn
            .find_current_model_policy(agent.id)
            .await?
            .ok_or_else(|| {
                ServiceError::invalid(format!("agent {} has no model policy", agent.slug))
            })?;

        let alias = match &request.model_alias {
            Some(name) => conn
                .find_model_alias(name)
                .await?
                .ok_or_else(|| ServiceError::invalid(format!("unknown model alias: {name}")))?,
            None => conn
                .find_model_alias_by_id(policy.alias_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("model alias", policy.alias_id))?,
        };

        // Gate image parts on the model's capabilities.
        let capabilities = alias.capabilities();
        let mut wire_messages = Vec::with_capacity(request.messages.len());
        for message in &request.messages {
            let wire = match message.role {
                IncomingRole::User => {
                    let parts = images::resolve_parts(
                        &mut conn,
                        &self.inner.storage,
                        capabilities,
                        &message.parts,
                    )
                    .await;
                    ChatMessage::user_parts(parts)
                }
                IncomingRole::Assistant => ChatMessage::assistant(message.text_content()),
            };
            wire_messages.push(wire);
        }

        // Derive the effective user query and the history before it.
        let last_user_index = request
            .messages
            .iter()
            .rposition(|m| m.role == IncomingRole::User)
            .ok_or_else(|| ServiceError::invalid("request has no user message"))?;
        let user_query = request.messages[last_user_index].text_content();
        if user_query.trim().is_empty() {
            return Err(ServiceError::invalid("request has no user message text"));
        }

        let history: Vec<ChatTurn> = request.messages[..last_user_index]
            .iter()
            .map(|m| match m.role {
                IncomingRole::User => ChatTurn::user(m.text_content()),
                IncomingRole::Assistant => ChatTurn::assistant(m.text_content()),
            })
            .collect();

        // Merge retrieval config and run the pipeline.
        let config = retrieval_config_for(&agent).with_overrides(&request.retrieval);
        let retrieval = self
            .inner
            .retriever
            .retrieve(agent.id, &user_query, &history, &config, cancel)
            .await;

        // Compose the final system prompt.
        let system_prompt = context::compose_system_prompt(
            &rendered,
            retrieval.context.as_deref(),
            agent.guardrail_context_only,
        );

        let conversation_id = request
            .request_tags
            .first()
            .and_then(|tag| Uuid::parse_str(tag).ok())
            .unwrap_or_else(Uuid::new_v4);
        let run_id = Uuid::new_v4();

        let request_payload = serde_json::json!({
            "agentSlug": request.agent_slug.clone(),
            "modelAlias": alias.alias.clone(),
            "promptVersion": version.version,
            "variables": request.variables.clone(),
            "query": user_query.clone(),
            "ragDebug": retrieval.debug.clone(),
        });

        let recorder = TurnRecorder {
            db: self.inner.db.clone(),
            agent_id: agent.id,
            conversation_id,
            run_id,
            model_alias: alias.alias.clone(),
            input_cost_per_million: alias.input_cost_per_million,
            output_cost_per_million: alias.output_cost_per_million,
            request_payload,
            retrieval_ms: retrieval.debug.total_rag_ms,
            started,
        };

        let provider = completion_provider(&self.inner.registry, &alias)?;
        let params = GenParams {
            temperature: Some(policy.temperature),
            top_p: Some(policy.top_p),
            max_tokens: Some(policy.max_tokens.max(1) as u32),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            agent = %agent.slug,
            run_id = %run_id,
            model = %alias.alias,
            "Starting chat turn"
        );

        let tokens = match provider
            .stream(Some(&system_prompt), wire_messages, params, cancel)
            .await
        {
            Ok(tokens) => tokens,
            Err(error) => {
                recorder.record_failure(error.kind()).await;
                return Err(error.into());
            }
        };

        let events = build_event_stream(tokens, recorder, retrieval.debug);

        Ok(ChatHandle {
            run_id,
            conversation_id,
            events,
        })
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService").finish_non_exhaustive()
    }
}

/// Maps a stored model alias onto a completion provider from the registry.
fn completion_provider(
    registry: &ProviderRegistry,
    alias: &ModelAlias,
) -> ServiceResult<plinth_inference::provider::CompletionProvider> {
    let provider = match alias.provider {
        ModelProvider::OpenAi => Provider::OpenAi,
        ModelProvider::OpenRouter => Provider::OpenRouter,
        ModelProvider::HuggingFace => Provider::HuggingFace,
        ModelProvider::Local => Provider::Local,
    };

    let model_ref = ModelRef::new(provider, alias.provider_model_id.clone());
    registry.completion(&model_ref).map_err(ServiceError::from)
}

/// Persists the turn outcome exactly once.
struct TurnRecorder {
    db: PgClient,
    agent_id: Uuid,
    conversation_id: Uuid,
    run_id: Uuid,
    model_alias: String,
    input_cost_per_million: f64,
    output_cost_per_million: f64,
    request_payload: serde_json::Value,
    retrieval_ms: u64,
    started: jiff::Timestamp,
}

impl TurnRecorder {
    fn latency_ms(&self) -> u64 {
        jiff::Timestamp::now()
            .duration_since(self.started)
            .as_millis()
            .max(0) as u64
    }

    fn cost_usd(&self, usage: &UsageStats) -> f64 {
        (usage.input_tokens as f64 * self.input_cost_per_million
            + usage.output_tokens as f64 * self.output_cost_per_million)
            / 1_000_000.0
    }

    /// Persists the transcript and run metric for a completed turn.
    async fn record_completion(&self, response_text: &str, usage: &UsageStats) -> u64 {
        let latency_ms = self.latency_ms();

        let result = async {
            let mut conn = self.db.get_connection().await?;

            conn.create_transcript(NewTranscript {
                agent_id: self.agent_id,
                conversation_id: self.conversation_id,
                run_id: self.run_id,
                request: self.request_payload.clone(),
                response_text: response_text.to_string(),
                usage: serde_json::to_value(usage).unwrap_or_default(),
                latency_ms: latency_ms.min(i32::MAX as u64) as i32,
            })
            .await?;

            conn.create_run_metric(NewRunMetric {
                agent_id: self.agent_id,
                run_id: self.run_id,
                model_alias: self.model_alias.clone(),
                input_tokens: usage.input_tokens.min(i32::MAX as u32) as i32,
                output_tokens: usage.output_tokens.min(i32::MAX as u32) as i32,
                cost_usd: self.cost_usd(usage),
                retrieval_ms: self.retrieval_ms.min(i32::MAX as u64) as i32,
                total_ms: latency_ms.min(i32::MAX as u64) as i32,
                error_kind: None,
            })
            .await?;

            Ok::<(), plinth_postgres::PgError>(())
        }
        .await;

        if let Err(error) = result {
            tracing::error!(
                target: TRACING_TARGET,
                run_id = %self.run_id,
                error = %error,
                "Failed to persist chat turn"
            );
        }

        latency_ms
    }

    /// Persists a minimal run metric tagged with the error kind.
    async fn record_failure(&self, kind: ErrorKind) {
        let latency_ms = self.latency_ms();

        let result = async {
            let mut conn = self.db.get_connection().await?;
            conn.create_run_metric(NewRunMetric {
                agent_id: self.agent_id,
                run_id: self.run_id,
                model_alias: self.model_alias.clone(),
                input_tokens: 0,
                output_tokens: 0,
                cost_usd: 0.0,
                retrieval_ms: self.retrieval_ms.min(i32::MAX as u64) as i32,
                total_ms: latency_ms.min(i32::MAX as u64) as i32,
                error_kind: Some(kind.as_str().to_string()),
            })
            .await?;
            Ok::<(), plinth_postgres::PgError>(())
        }
        .await;

        if let Err(error) = result {
            tracing::error!(
                target: TRACING_TARGET,
                run_id = %self.run_id,
                error = %error,
                "Failed to persist error run metric"
            );
        }
    }
}

/// Wraps the provider token stream with the persistence hook.
fn build_event_stream(
    mut tokens: TokenStream,
    recorder: TurnRecorder,
    retrieval_debug: RetrievalDebug,
) -> ChatEventStream {
    Box::pin(async_stream::try_stream! {
        let mut accumulated = String::new();
        let mut persisted = false;

        while let Some(event) = tokens.next().await {
            match event {
                Ok(TokenEvent::Delta(delta)) => {
                    accumulated.push_str(&delta);
                    yield ChatEvent::Delta(delta);
                }
                Ok(TokenEvent::Done { usage, finish_reason }) => {
                    let latency_ms = recorder.record_completion(&accumulated, &usage).await;
                    persisted = true;

                    yield ChatEvent::Done(ChatCompletion {
                        response_text: accumulated.clone(),
                        usage,
                        finish_reason,
                        retrieval: retrieval_debug.clone(),
                        latency_ms,
                    });
                }
                Err(error) => {
                    if !persisted {
                        recorder.record_failure(error.kind()).await;
                        persisted = true;
                    }

                    let service_error = match error {
                        LlmError::Cancelled => ServiceError::Cancelled,
                        other => ServiceError::from(other),
                    };
                    Err::<(), ServiceError>(service_error)?;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_skips_images() {
        let message = IncomingMessage {
            role: IncomingRole::User,
            parts: vec![
                IncomingPart::Text {
                    text: "look at ".to_string(),
                },
                IncomingPart::Image {
                    image_id: Uuid::new_v4(),
                },
                IncomingPart::Text {
                    text: "this".to_string(),
                },
            ],
        };
        assert_eq!(message.text_content(), "look at this");
    }

    #[test]
    fn request_builder_defaults() {
        let request = ChatRequest::new("support-bot", "hi");
        assert_eq!(request.agent_slug, "support-bot");
        assert_eq!(request.messages.len(), 1);
        assert!(request.model_alias.is_none());
        assert!(request.request_tags.is_empty());
    }
}
