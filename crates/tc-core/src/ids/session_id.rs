use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifier of a single TCP session.
/// Format: "{role}-{remote_addr}-{random}"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl_id!(SessionId);

impl SessionId {
    pub fn generate(prefix: &str) -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", prefix, &random[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_str() {
        let id: SessionId = "out-127.0.0.1:7878-abc123".into();
        assert_eq!(id.as_str(), "out-127.0.0.1:7878-abc123");
    }

    #[test]
    fn test_generated_session_id_keeps_prefix() {
        let id = SessionId::generate("in-10.0.0.2:5000");
        assert!(id.as_str().starts_with("in-10.0.0.2:5000-"));
        assert_eq!(id.as_str().len(), "in-10.0.0.2:5000-".len() + 8);
    }
}
