//! The request pipeline: validate → classify → (fetch) → compose → invoke.
//!
//! Every request runs in one of two modes, chosen at startup:
//! - [`ClassifiedPipeline`]: the lexicon decides whether the spreadsheet is
//!   read, and the model sees one composed prompt.
//! - [`ToolMediatedAgent`]: the model decides, through sheet tools.
//!
//! Both sit behind [`QueryEngine`], so the HTTP and CLI surfaces only ever
//! hold an `Arc<dyn QueryEngine>`.

use async_trait::async_trait;
use sheetwise_config::{AppConfig, PipelineMode, PromptVariant};
use sheetwise_core::error::{Error, QueryError};
use sheetwise_core::provider::{Provider, ProviderRequest};
use sheetwise_core::query::{Classification, Query, QueryClassifier};
use std::sync::Arc;
use tracing::{debug, info};

use crate::accessor::ContextAccessor;
use crate::classifier;
use crate::composer::{ComposedPrompt, PromptComposer};
use crate::envelope::{ResultEnvelope, SecretScrubber, assemble};
use crate::persona::PersonaTemplate;
use crate::tool_mediated::ToolMediatedAgent;

/// Answers one validated query. Stateless between calls.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// `"classified"` or `"tool_mediated"`, for logs and health output.
    fn mode(&self) -> &str;

    async fn answer(&self, query: &Query) -> Result<String, QueryError>;
}

pub struct ClassifiedPipeline {
    classifier: Box<dyn QueryClassifier>,
    accessor: ContextAccessor,
    persona: Option<PersonaTemplate>,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ClassifiedPipeline {
    pub fn new(
        classifier: Box<dyn QueryClassifier>,
        accessor: ContextAccessor,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            accessor,
            persona: None,
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_persona(mut self, persona: Option<PersonaTemplate>) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn classify(&self, query: &Query) -> Classification {
        self.classifier.classify(query)
    }

    /// Classify, fetch context only for personal queries, then compose.
    /// Everything short of the model call.
    pub async fn prepare(&self, query: &Query) -> Result<ComposedPrompt, QueryError> {
        let classification = self.classify(query);
        info!(
            classification = ?classification,
            classifier = self.classifier.name(),
            query_len = query.as_str().len(),
            "Query classified"
        );

        let context = if classification.needs_context() {
            Some(self.accessor.fetch().await?)
        } else {
            None
        };

        PromptComposer::compose(query, classification, context.as_ref(), self.persona.as_ref())
    }
}

#[async_trait]
impl QueryEngine for ClassifiedPipeline {
    fn mode(&self) -> &str {
        "classified"
    }

    async fn answer(&self, query: &Query) -> Result<String, QueryError> {
        let prompt = self.prepare(query).await?;
        debug!(prompt_len = prompt.as_str().len(), "Prompt composed");

        let request = ProviderRequest::prompt(&self.model, prompt.into_string())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        info!(
            provider = self.provider.name(),
            model = %response.model,
            "Model responded"
        );
        Ok(response.message.content)
    }
}

/// One request, start to finish: validate the raw text, run the engine, and
/// collapse the outcome into an envelope. Input errors never reach the
/// engine.
pub async fn respond(
    engine: &dyn QueryEngine,
    scrubber: &SecretScrubber,
    raw: Option<&str>,
) -> ResultEnvelope {
    let result = match Query::parse_optional(raw) {
        Ok(query) => engine.answer(&query).await,
        Err(e) => Err(e),
    };
    assemble(result, scrubber)
}

/// Wire the configured provider, tabular source, and persona into an engine.
pub fn build_engine_from_config(config: &AppConfig) -> Result<Arc<dyn QueryEngine>, Error> {
    let provider = sheetwise_providers::build_from_config(config)
        .default_provider()
        .ok_or_else(|| Error::Config {
            message: format!("no provider registered for '{}'", config.model.provider),
        })?;
    let source = sheetwise_sheets::build_from_config(config)?;

    let persona = match config.pipeline.variant {
        PromptVariant::Persona => {
            PersonaTemplate::from_config(&config.persona).map_err(|e| Error::Config {
                message: e.to_string(),
            })?
        }
        PromptVariant::Direct => None,
    };

    let engine: Arc<dyn QueryEngine> = match config.pipeline.mode {
        PipelineMode::Classified => Arc::new(
            ClassifiedPipeline::new(
                classifier::from_kind(config.pipeline.classifier),
                ContextAccessor::new(source, config.sheets.range_spec()),
                provider,
                &config.model.model,
            )
            .with_persona(persona)
            .with_temperature(config.model.temperature)
            .with_max_tokens(config.model.max_tokens),
        ),
        PipelineMode::ToolMediated => Arc::new(
            ToolMediatedAgent::new(
                provider,
                &config.model.model,
                Arc::new(sheetwise_sheets::sheet_tools(source)),
            )
            .with_persona(persona)
            .with_temperature(config.model.temperature)
            .with_max_tokens(config.model.max_tokens)
            .with_max_iterations(config.pipeline.max_tool_iterations),
        ),
    };

    info!(
        mode = engine.mode(),
        provider = %config.model.provider,
        model = %config.model.model,
        "Query engine ready"
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{SubstringClassifier, WordBoundaryClassifier};
    use crate::envelope::FailureKind;
    use crate::test_helpers::*;
    use sheetwise_config::SheetsBackend;
    use sheetwise_core::error::{ProviderError, SheetError};
    use sheetwise_core::sheet::{CellRange, RangeSpec};
    use std::io::Write;

    fn tasks_range() -> RangeSpec {
        RangeSpec {
            sheet: Some("Tasks".into()),
            cells: CellRange::default(),
        }
    }

    fn pipeline(provider: Arc<dyn Provider>, source: Arc<CountingSource>) -> ClassifiedPipeline {
        ClassifiedPipeline::new(
            Box::new(SubstringClassifier::default()),
            ContextAccessor::new(source, tasks_range()),
            provider,
            "mock-model",
        )
    }

    #[tokio::test]
    async fn empty_query_makes_no_external_calls() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source.clone());

        for raw in [None, Some(""), Some("   ")] {
            let env = respond(&engine, &SecretScrubber::default(), raw).await;
            assert_eq!(env.failure_kind(), Some(FailureKind::Input));
        }
        assert_eq!(provider.call_count(), 0);
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn general_query_skips_fetch_and_passes_query_through() {
        let provider = Arc::new(SequentialMockProvider::single_text("Shakespeare."));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source.clone());

        let env = respond(&engine, &SecretScrubber::default(), Some("Who wrote Hamlet?")).await;

        assert_eq!(env, ResultEnvelope::success("Shakespeare."));
        assert_eq!(source.total_calls(), 0);
        assert_eq!(provider.first_prompt(), "Who wrote Hamlet?");
    }

    #[tokio::test]
    async fn personal_query_is_grounded_in_rows() {
        let provider = Arc::new(SequentialMockProvider::single_text("Your spec is done."));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source.clone());

        let env = respond(&engine, &SecretScrubber::default(), Some("my project update")).await;

        assert_eq!(env, ResultEnvelope::success("Your spec is done."));
        assert_eq!(source.range_reads(), 1);
        assert_eq!(
            provider.first_prompt(),
            "Available data:\nTask | Status\nWrite spec | Done\n\n\
             User query: my project update\n\n\
             Please analyze the data and respond to the query."
        );
    }

    #[tokio::test]
    async fn substring_classifier_grounds_capital_question() {
        let provider = Arc::new(SequentialMockProvider::single_text("Paris."));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source.clone());

        engine
            .answer(&Query::parse("What is the capital of France?").unwrap())
            .await
            .unwrap();
        assert_eq!(source.range_reads(), 1);
    }

    #[tokio::test]
    async fn word_boundary_classifier_skips_fetch_for_capital_question() {
        let provider = Arc::new(SequentialMockProvider::single_text("Paris."));
        let source = Arc::new(CountingSource::tasks());
        let engine = ClassifiedPipeline::new(
            Box::new(WordBoundaryClassifier::default()),
            ContextAccessor::new(source.clone(), tasks_range()),
            provider.clone(),
            "mock-model",
        );

        let answer = engine
            .answer(&Query::parse("What is the capital of France?").unwrap())
            .await
            .unwrap();
        assert_eq!(answer, "Paris.");
        assert_eq!(source.total_calls(), 0);
        assert_eq!(provider.first_prompt(), "What is the capital of France?");
    }

    #[tokio::test]
    async fn fetch_failure_stops_before_model() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let source = Arc::new(CountingSource::failing(SheetError::NotFound(
            "spreadsheet 'abc'".into(),
        )));
        let engine = pipeline(provider.clone(), source.clone());

        let env = respond(&engine, &SecretScrubber::default(), Some("my tasks")).await;

        assert_eq!(env.failure_kind(), Some(FailureKind::ContextFetch));
        assert_eq!(provider.call_count(), 0);
        assert_eq!(source.range_reads(), 1);
    }

    #[tokio::test]
    async fn model_failure_is_reported_once() {
        let provider = Arc::new(FailingProvider::new(ProviderError::RateLimited));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source);

        let env = respond(&engine, &SecretScrubber::default(), Some("Who wrote Hamlet?")).await;

        assert_eq!(env.failure_kind(), Some(FailureKind::ModelInvocation));
        assert_eq!(provider.call_count(), 1);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["error"], "Error processing query: Rate limited by provider");
    }

    #[tokio::test]
    async fn model_error_secrets_are_scrubbed() {
        let provider = Arc::new(FailingProvider::new(ProviderError::AuthenticationFailed(
            "API key sk-test-secret-123 invalid".into(),
        )));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider, source);
        let scrubber = SecretScrubber::new(vec!["sk-test-secret-123".to_string()]);

        let env = respond(&engine, &scrubber, Some("Who wrote Hamlet?")).await;
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("sk-test-secret-123"));
    }

    #[tokio::test]
    async fn persona_variant_wraps_prompt() {
        let provider = Arc::new(SequentialMockProvider::single_text("Done, Sir."));
        let source = Arc::new(CountingSource::tasks());
        let persona = PersonaTemplate::new("butler", "You are Jarvis.").with_addressee("Sir");
        let engine = pipeline(provider.clone(), source).with_persona(Some(persona));

        engine
            .answer(&Query::parse("my project update").unwrap())
            .await
            .unwrap();

        let prompt = provider.first_prompt();
        assert!(prompt.starts_with("You are Jarvis.\n\nAvailable data:\n"));
        assert!(prompt.ends_with("- Keep the response natural and easy to speak aloud."));
    }

    #[tokio::test]
    async fn request_carries_model_settings() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let source = Arc::new(CountingSource::tasks());
        let engine = pipeline(provider.clone(), source)
            .with_temperature(0.2)
            .with_max_tokens(Some(128));

        engine
            .answer(&Query::parse("Who wrote Hamlet?").unwrap())
            .await
            .unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.model, "mock-model");
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(128));
        assert!(request.tools.is_empty());
    }

    fn fixture_config(mode: PipelineMode) -> (AppConfig, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name": "Tasks", "rows": [["Task", "Status"], ["Write spec", "Done"]]}]"#)
            .unwrap();

        let mut config = AppConfig::default();
        config.model.provider = "ollama".into();
        config.model.model = "llama3".into();
        config.sheets.backend = SheetsBackend::Fixture;
        config.sheets.fixture_path = Some(file.path().to_path_buf());
        config.pipeline.mode = mode;
        (config, file)
    }

    #[test]
    fn builds_classified_engine_from_config() {
        let (config, _file) = fixture_config(PipelineMode::Classified);
        let engine = build_engine_from_config(&config).unwrap();
        assert_eq!(engine.mode(), "classified");
    }

    #[test]
    fn builds_tool_mediated_engine_from_config() {
        let (config, _file) = fixture_config(PipelineMode::ToolMediated);
        let engine = build_engine_from_config(&config).unwrap();
        assert_eq!(engine.mode(), "tool_mediated");
    }

    #[test]
    fn missing_fixture_path_fails_startup() {
        let (mut config, _file) = fixture_config(PipelineMode::Classified);
        config.sheets.fixture_path = None;
        assert!(matches!(
            build_engine_from_config(&config),
            Err(Error::Sheet(_))
        ));
    }

    #[test]
    fn persona_variant_requires_readable_block() {
        let (mut config, _file) = fixture_config(PipelineMode::Classified);
        config.pipeline.variant = PromptVariant::Persona;
        config.persona.block_file = Some("/nonexistent/persona.txt".into());
        assert!(matches!(
            build_engine_from_config(&config),
            Err(Error::Config { .. })
        ));
    }
}
