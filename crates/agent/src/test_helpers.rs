//! Shared test helpers: scripted providers and a call-counting source.

use async_trait::async_trait;
use sheetwise_core::error::{ProviderError, SheetError};
use sheetwise_core::message::{Message, MessageToolCall};
use sheetwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use sheetwise_core::sheet::{CellRange, TabularSource};
use sheetwise_sheets::FixtureSource;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock provider that returns a sequence of scripted responses and
/// records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the first message of the first request: the composed prompt
    /// in classified mode.
    pub fn first_prompt(&self) -> String {
        self.requests.lock().unwrap()[0].messages[0].content.clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// A tabular source that counts its calls, optionally failing them all.
pub struct CountingSource {
    inner: FixtureSource,
    failure: Option<SheetError>,
    range_reads: AtomicUsize,
    metadata_reads: AtomicUsize,
}

impl CountingSource {
    pub fn new(inner: FixtureSource) -> Self {
        Self {
            inner,
            failure: None,
            range_reads: AtomicUsize::new(0),
            metadata_reads: AtomicUsize::new(0),
        }
    }

    /// "Tasks" with a header and one row, then an empty "Notes".
    pub fn tasks() -> Self {
        Self::new(
            FixtureSource::new()
                .with_sheet(
                    "Tasks",
                    vec![
                        vec!["Task".into(), "Status".into()],
                        vec!["Write spec".into(), "Done".into()],
                    ],
                )
                .with_sheet("Notes", vec![]),
        )
    }

    pub fn empty() -> Self {
        Self::new(FixtureSource::new())
    }

    pub fn failing(error: SheetError) -> Self {
        Self {
            failure: Some(error),
            ..Self::empty()
        }
    }

    pub fn range_reads(&self) -> usize {
        self.range_reads.load(Ordering::SeqCst)
    }

    pub fn metadata_reads(&self) -> usize {
        self.metadata_reads.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.range_reads() + self.metadata_reads()
    }
}

#[async_trait]
impl TabularSource for CountingSource {
    fn name(&self) -> &str {
        "counting_mock"
    }

    async fn get_range(
        &self,
        sheet_name: &str,
        cells: &CellRange,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        self.range_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.inner.get_range(sheet_name, cells).await
    }

    async fn sheet_names(&self) -> Result<Vec<String>, SheetError> {
        self.metadata_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.inner.sheet_names().await
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}
