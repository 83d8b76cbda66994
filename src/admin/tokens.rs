//! One-time anti-replay tokens for admin actions.
//!
//! A token is bound to one action identifier and is consumed by the first
//! successful verification.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::store::clock::{deadline, Clock, SystemClock};

/// Actions that require a token, with their stable identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAction {
    Unblock,
    RemoveLog,
}

impl TokenAction {
    pub fn id(self) -> &'static str {
        match self {
            TokenAction::Unblock => "ip_block_unblock_action",
            TokenAction::RemoveLog => "ip_block_remove_log",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "ip_block_unblock_action" => Some(TokenAction::Unblock),
            "ip_block_remove_log" => Some(TokenAction::RemoveLog),
            _ => None,
        }
    }
}

/// Issues and checks tokens. Hosts with their own scheme can plug it in here.
pub trait ActionTokens: Send + Sync {
    fn issue(&self, action: TokenAction) -> String;

    /// True when `token` was issued for `action`, is unexpired and unused.
    fn verify(&self, action: TokenAction, token: &str) -> bool;
}

/// In-memory single-use tokens. Expiry is kept in epoch milliseconds and
/// saturates, so any TTL is accepted.
pub struct OneTimeTokens {
    tokens: DashMap<String, (TokenAction, u64)>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl OneTimeTokens {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Tokens issued and not yet used or swept.
    pub fn outstanding(&self) -> usize {
        self.tokens.len()
    }
}

impl ActionTokens for OneTimeTokens {
    fn issue(&self, action: TokenAction) -> String {
        let now = self.clock.now_millis();
        self.tokens.retain(|_, (_, expires)| *expires > now);

        let token = Uuid::new_v4().simple().to_string();
        self.tokens
            .insert(token.clone(), (action, deadline(now, self.ttl)));
        token
    }

    fn verify(&self, action: TokenAction, token: &str) -> bool {
        let now = self.clock.now_millis();
        self.tokens
            .remove_if(token, |_, (bound, expires)| *bound == action && *expires > now)
            .is_some()
    }
}
