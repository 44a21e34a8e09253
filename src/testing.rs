//! In-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::{StreamExt, stream};

use crate::client::{ByteStream, ChatBackend};
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::types::{ChatRequest, Message, Status};

/// What the fake service does with the next chat request.
pub(crate) enum Reply {
    /// Stream these chunks, in order.
    Chunks(Vec<Result<Bytes>>),
    /// Stream these chunks, then never yield again.
    Stalled(Vec<Result<Bytes>>),
    /// Answer without a body.
    NoBody,
    /// Fail before any response arrives.
    Fail(Error),
}

impl Reply {
    pub(crate) fn text(chunks: &[&str]) -> Self {
        Reply::Chunks(
            chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                .collect(),
        )
    }
}

pub(crate) struct FakeBackend {
    history: Result<Vec<Message>>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
    history_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            history: Ok(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            history_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_history(mut self, history: Result<Vec<Message>>) -> Self {
        self.history = history;
        self
    }

    pub(crate) fn with_reply(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChatBackend for FakeBackend {
    async fn history(&self, _session_id: &str) -> Result<Vec<Message>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history.clone()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(Error::connection("no reply scripted", None)));
        match reply {
            Reply::Chunks(chunks) => Ok(Some(Box::pin(stream::iter(chunks)))),
            Reply::Stalled(chunks) => Ok(Some(Box::pin(
                stream::iter(chunks).chain(stream::pending()),
            ))),
            Reply::NoBody => Ok(None),
            Reply::Fail(err) => Err(err),
        }
    }
}

/// Everything a renderer was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Pushed(Message),
    Updated(String),
    Status(Status),
    Finished,
    Error(String),
    Info(String),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub(crate) events: Vec<Event>,
}

impl RecordingRenderer {
    pub(crate) fn updates(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Updated(content) => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn statuses(&self) -> Vec<Status> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Status(status) => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn push_message(&mut self, message: &Message) {
        self.events.push(Event::Pushed(message.clone()));
    }

    fn update_assistant(&mut self, content: &str) {
        self.events.push(Event::Updated(content.to_string()));
    }

    fn status_changed(&mut self, status: &Status) {
        self.events.push(Event::Status(*status));
    }

    fn finish_response(&mut self) {
        self.events.push(Event::Finished);
    }

    fn print_error(&mut self, error: &str) {
        self.events.push(Event::Error(error.to_string()));
    }

    fn print_info(&mut self, info: &str) {
        self.events.push(Event::Info(info.to_string()));
    }
}
