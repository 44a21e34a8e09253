use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ragchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ragchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ragchat.client.request_duration_seconds");

pub(crate) static HISTORY_LOADS: Counter = Counter::new("ragchat.history.loads");
pub(crate) static HISTORY_FAILURES: Counter = Counter::new("ragchat.history.failures");

pub(crate) static SENDS: Counter = Counter::new("ragchat.controller.sends");
pub(crate) static SEND_FAILURES: Counter = Counter::new("ragchat.controller.send_failures");
pub(crate) static SENDS_IGNORED: Counter = Counter::new("ragchat.controller.sends_ignored");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("ragchat.stream.chunks");
pub(crate) static STREAM_BYTES: Counter = Counter::new("ragchat.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("ragchat.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("ragchat.stream.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&HISTORY_LOADS);
    collector.register_counter(&HISTORY_FAILURES);

    collector.register_counter(&SENDS);
    collector.register_counter(&SEND_FAILURES);
    collector.register_counter(&SENDS_IGNORED);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);
}
