//! One-shot transcript hydration.

use crate::client::ChatBackend;
use crate::types::Message;

/// Fetch the stored transcript for `session_id`.
///
/// Makes exactly one attempt. Every failure (unreachable service, non-2xx
/// status, malformed body) is logged and yields an empty transcript, as does
/// a session the service has never seen.
pub async fn load_history<B>(backend: &B, session_id: &str) -> Vec<Message>
where
    B: ChatBackend + ?Sized,
{
    match backend.history(session_id).await {
        Ok(messages) => {
            tracing::debug!(session_id, count = messages.len(), "loaded chat history");
            messages
        }
        Err(err) => {
            tracing::warn!(session_id, error = %err, "could not load chat history");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn returns_server_order() {
        let backend = FakeBackend::new().with_history(Ok(vec![
            Message::user("hi"),
            Message::assistant("hello"),
        ]));
        let messages = load_history(&backend, "s1").await;
        assert_eq!(messages, vec![Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_empty_without_retry() {
        let backend =
            FakeBackend::new().with_history(Err(Error::connection("connection refused", None)));
        assert!(load_history(&backend, "s1").await.is_empty());
        assert_eq!(backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_empty() {
        let backend = FakeBackend::new().with_history(Err(Error::api(500, "boom")));
        assert!(load_history(&backend, "s1").await.is_empty());
    }
}
