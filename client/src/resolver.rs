//! Conflict resolvers.
//!
//! A resolver turns one [`Conflict`] into a [`Decision`]. The automatic
//! resolver answers immediately from a fixed policy; the prompt resolver
//! suspends until whoever holds the other end of its channel answers.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use quotesync_engine::{Conflict, Decision, ResolutionPolicy};
use tokio::sync::{mpsc, oneshot};

/// Decides the winner of a single conflict.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Decide `conflict`; may suspend until an external decision arrives.
    async fn resolve(&self, conflict: &Conflict) -> Result<Decision>;
}

/// Resolves every conflict with a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoResolver {
    policy: ResolutionPolicy,
}

impl AutoResolver {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }
}

#[async_trait]
impl ConflictResolver for AutoResolver {
    async fn resolve(&self, conflict: &Conflict) -> Result<Decision> {
        let decision = self.policy.decide(conflict);
        tracing::debug!(key = %conflict.key, %decision, "Conflict resolved by policy");
        Ok(decision)
    }
}

/// A pending question for the decision-maker.
#[derive(Debug)]
pub struct PromptRequest {
    /// The conflict to decide
    pub conflict: Conflict,
    reply: oneshot::Sender<Decision>,
}

impl PromptRequest {
    /// Answer the prompt. Returns false if the cycle already gave up on it.
    pub fn answer(self, decision: Decision) -> bool {
        self.reply.send(decision).is_ok()
    }
}

/// Asks an external decision-maker through a channel.
///
/// Dropping the receiving end, or a [`PromptRequest`] without answering it,
/// abandons the cycle waiting on it.
#[derive(Debug, Clone)]
pub struct PromptResolver {
    requests: mpsc::Sender<PromptRequest>,
}

impl PromptResolver {
    /// Create a resolver and the receiver its prompts arrive on.
    pub fn channel() -> (Self, mpsc::Receiver<PromptRequest>) {
        // Cycles ask one question at a time
        let (requests, receiver) = mpsc::channel(1);
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl ConflictResolver for PromptResolver {
    async fn resolve(&self, conflict: &Conflict) -> Result<Decision> {
        let (reply, answer) = oneshot::channel();
        let request = PromptRequest {
            conflict: conflict.clone(),
            reply,
        };

        self.requests
            .send(request)
            .await
            .map_err(|_| SyncError::ResolutionAbandoned)?;

        let decision = answer.await.map_err(|_| SyncError::ResolutionAbandoned)?;
        tracing::debug!(key = %conflict.key, %decision, "Conflict resolved by prompt");
        Ok(decision)
    }
}

/// How conflicts get decided, as chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverMode {
    /// Ask interactively
    Prompt,
    /// Apply a fixed policy
    Auto(ResolutionPolicy),
}

impl Default for ResolverMode {
    fn default() -> Self {
        ResolverMode::Auto(ResolutionPolicy::default())
    }
}

impl std::str::FromStr for ResolverMode {
    type Err = quotesync_engine::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("prompt") {
            Ok(ResolverMode::Prompt)
        } else {
            s.parse().map(ResolverMode::Auto)
        }
    }
}
