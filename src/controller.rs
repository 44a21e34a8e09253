//! The streaming session controller.
//!
//! [`ChatController`] owns the session identifier, the transcript, the pending
//! input buffer and the observable status. A send appends the user message,
//! posts it, and grows an assistant placeholder in place as body chunks
//! arrive. Every failure is recovered locally: it is logged, reported to the
//! renderer, and returned as a [`SendOutcome`]; nothing is written into the
//! transcript on its behalf.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::to_writer_pretty;

use crate::client::ChatBackend;
use crate::decoder::Utf8StreamDecoder;
use crate::error::{Error, Result};
use crate::history::load_history;
use crate::identity::{KeyValueStore, get_or_create_session_id};
use crate::observability::{
    SEND_FAILURES, SENDS, SENDS_IGNORED, STREAM_BYTES, STREAM_CHUNKS, STREAM_DURATION,
    STREAM_TTFB,
};
use crate::render::Renderer;
use crate::types::{ChatRequest, Message, MessageRole, Phase, Status};

/// How a call to [`ChatController::send`] ended.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The text was empty or whitespace; nothing happened.
    Ignored,

    /// The service answered without a body; only the user message was added.
    NoBody,

    /// The stream ran to its end.
    Completed {
        /// Raw bytes received.
        bytes: u64,
    },

    /// The request or the stream failed. The transcript keeps whatever was
    /// appended before the failure.
    Failed(Error),
}

impl SendOutcome {
    /// Returns true if the exchange reached the end of the stream.
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed { .. })
    }

    /// The failure, if the send failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SendOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The session identifier.
    pub session_id: String,
    /// The number of messages in the transcript.
    pub message_count: usize,
    /// Messages written by the user.
    pub user_messages: usize,
    /// Messages written by the assistant.
    pub assistant_messages: usize,
    /// Sends that reached the service during this process.
    pub exchanges: u64,
    /// Sends that failed during this process.
    pub failures: u64,
    /// Whether history hydration has run.
    pub hydrated: bool,
}

#[derive(Debug)]
struct ChatState {
    session_id: String,
    messages: Vec<Message>,
    input: String,
    status: Status,
    hydrated: bool,
    exchanges: u64,
    failures: u64,
}

/// Owns a chat session and drives the send/stream/accumulate protocol.
pub struct ChatController<B: ChatBackend> {
    backend: B,
    state: ChatState,
}

impl<B: ChatBackend> ChatController<B> {
    /// Creates a controller for a known session with an empty transcript.
    pub fn new(backend: B, session_id: impl Into<String>) -> Self {
        Self {
            backend,
            state: ChatState {
                session_id: session_id.into(),
                messages: Vec::new(),
                input: String::new(),
                status: Status::IDLE,
                hydrated: false,
                exchanges: 0,
                failures: 0,
            },
        }
    }

    /// Resolves the session identifier from `store` and hydrates history.
    pub async fn start(backend: B, store: &dyn KeyValueStore) -> Self {
        let session_id = get_or_create_session_id(store);
        let mut controller = Self::new(backend, session_id);
        controller.hydrate().await;
        controller
    }

    /// Loads the stored transcript, replacing the in-memory one wholesale.
    ///
    /// Runs at most once per controller; later calls return 0 without a
    /// request. An empty or failed load leaves the transcript untouched.
    /// Returns the number of messages loaded.
    pub async fn hydrate(&mut self) -> usize {
        if self.state.hydrated {
            return 0;
        }
        self.state.hydrated = true;
        let messages = load_history(&self.backend, &self.state.session_id).await;
        let count = messages.len();
        if count > 0 {
            self.state.messages = messages;
        }
        count
    }

    /// The session identifier sent with every message.
    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    /// The transcript, in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    /// The current observable status.
    pub fn status(&self) -> Status {
        self.state.status
    }

    /// The backend this controller talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The pending input buffer.
    pub fn input(&self) -> &str {
        &self.state.input
    }

    /// Replaces the pending input buffer.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.input = input.into();
    }

    /// Sends the pending input buffer.
    pub async fn send_input(&mut self, renderer: &mut dyn Renderer) -> SendOutcome {
        let text = self.state.input.clone();
        self.send(&text, renderer).await
    }

    /// Sends `text` as a user message and streams the reply into the
    /// transcript.
    ///
    /// Blank text is ignored without any side effect. Otherwise the user
    /// message is appended at once and the status is reset exactly once when
    /// the send ends, including when the returned future is dropped early.
    pub async fn send(&mut self, text: &str, renderer: &mut dyn Renderer) -> SendOutcome {
        if text.trim().is_empty() {
            SENDS_IGNORED.click();
            return SendOutcome::Ignored;
        }
        debug_assert_eq!(self.state.status.phase, Phase::Idle);
        SENDS.click();

        let mut exchange = Exchange::begin(&mut self.state, renderer, text);
        let outcome = exchange.run(&self.backend, text).await;
        drop(exchange);
        outcome
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let count = |role| {
            self.state
                .messages
                .iter()
                .filter(|m| m.role == role)
                .count()
        };
        SessionStats {
            session_id: self.state.session_id.clone(),
            message_count: self.state.messages.len(),
            user_messages: count(MessageRole::User),
            assistant_messages: count(MessageRole::Assistant),
            exchanges: self.state.exchanges,
            failures: self.state.failures,
            hydrated: self.state.hydrated,
        }
    }

    /// Saves the transcript to the specified path as pretty-printed JSON.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.state.session_id, &self.state.messages);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }
}

/// One send in flight. Dropping it is the single cleanup path.
struct Exchange<'a> {
    state: &'a mut ChatState,
    renderer: &'a mut dyn Renderer,
    started: Instant,
}

impl<'a> Exchange<'a> {
    fn begin(state: &'a mut ChatState, renderer: &'a mut dyn Renderer, text: &str) -> Self {
        let message = Message::user(text);
        renderer.push_message(&message);
        state.messages.push(message);
        state.input.clear();

        let mut exchange = Self {
            state,
            renderer,
            started: Instant::now(),
        };
        exchange.set_status(Status {
            phase: Phase::Sending,
            loading: true,
            streaming: true,
        });
        exchange
    }

    fn set_status(&mut self, status: Status) {
        if self.state.status != status {
            self.state.status = status;
            self.renderer.status_changed(&status);
        }
    }

    async fn run<B>(&mut self, backend: &B, text: &str) -> SendOutcome
    where
        B: ChatBackend + ?Sized,
    {
        let request = ChatRequest::new(text, self.state.session_id.as_str());
        let mut body = match backend.chat(&request).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                tracing::debug!(session_id = %self.state.session_id, "chat response had no body");
                return SendOutcome::NoBody;
            }
            Err(err) => return self.fail(err),
        };
        STREAM_TTFB.add(self.started.elapsed().as_secs_f64());

        let placeholder = Message::assistant("");
        self.renderer.push_message(&placeholder);
        self.state.messages.push(placeholder);
        let index = self.state.messages.len() - 1;
        self.set_status(Status {
            phase: Phase::Streaming,
            ..self.state.status
        });

        let mut decoder = Utf8StreamDecoder::new();
        let mut accumulated = String::new();
        let mut bytes = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => return self.fail(err),
            };
            STREAM_CHUNKS.click();
            STREAM_BYTES.count(chunk.len() as u64);
            bytes += chunk.len() as u64;
            let text = decoder.decode(&chunk);
            self.apply(index, &mut accumulated, &text);
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            tracing::warn!("chat stream ended inside a multi-byte character");
            self.apply(index, &mut accumulated, &tail);
        }

        tracing::debug!(
            session_id = %self.state.session_id,
            bytes,
            chars = accumulated.chars().count(),
            "chat stream complete"
        );
        SendOutcome::Completed { bytes }
    }

    /// Extends the accumulator and overwrites the placeholder with all of it.
    fn apply(&mut self, index: usize, accumulated: &mut String, text: &str) {
        accumulated.push_str(text);
        self.state.messages[index].content.clone_from(accumulated);
        self.renderer
            .update_assistant(&self.state.messages[index].content);
        if self.state.status.loading && !accumulated.is_empty() {
            self.set_status(Status {
                loading: false,
                ..self.state.status
            });
        }
    }

    fn fail(&mut self, err: Error) -> SendOutcome {
        SEND_FAILURES.click();
        self.state.failures += 1;
        tracing::error!(session_id = %self.state.session_id, error = %err, "error sending message");
        self.renderer.print_error(&err.to_string());
        SendOutcome::Failed(err)
    }
}

impl Drop for Exchange<'_> {
    fn drop(&mut self) {
        STREAM_DURATION.add(self.started.elapsed().as_secs_f64());
        self.state.exchanges += 1;
        self.set_status(Status {
            phase: Phase::Settled,
            loading: false,
            streaming: false,
        });
        self.state.status = Status::IDLE;
        self.renderer.finish_response();
    }
}

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    session_id: String,
    messages: Vec<Message>,
}

impl TranscriptFile {
    fn new(session_id: &str, messages: &[Message]) -> Self {
        Self {
            version: 1,
            session_id: session_id.to_string(),
            messages: messages.to_vec(),
        }
    }
}
