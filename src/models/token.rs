use chrono::{DateTime, Utc};

/// Purpose tag stored alongside every server-tracked token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Refresh,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Refresh => "refresh",
        }
    }
}

/// A freshly issued refresh token.
///
/// `plaintext` exists only in memory long enough to be handed to the client;
/// stores only ever see `hash`.
#[derive(Clone)]
pub struct RefreshToken {
    pub plaintext: String,
    pub hash: Vec<u8>,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

// Keeps the plaintext out of logs.
impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshToken")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_plaintext() {
        let token = RefreshToken {
            plaintext: "SECRETPLAINTEXT".to_string(),
            hash: vec![1, 2, 3],
            user_id: 1,
            expiry: Utc::now(),
            scope: TokenScope::Refresh,
        };
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("SECRETPLAINTEXT"));
        assert_eq!(TokenScope::Refresh.as_str(), "refresh");
    }
}
