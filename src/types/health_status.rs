use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` when the service is up.
    pub status: String,
}

impl HealthStatus {
    /// Returns true if the service reported itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_status_ok() {
        let status: HealthStatus = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(status.is_ok());
    }

    #[test]
    fn health_status_degraded() {
        let status: HealthStatus = serde_json::from_value(json!({"status": "degraded"})).unwrap();
        assert!(!status.is_ok());
    }
}
