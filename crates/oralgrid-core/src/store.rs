//! In-memory evaluation store.
//!
//! The store is an explicit object owned by the session rather than a
//! process global. A mutex keeps append and clear atomic; the expected
//! workload is a single writer with tens to hundreds of records.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{ClearError, ValidationError};
use crate::model::{Evaluation, Responses};

/// Default lifetime of a clear confirmation.
pub const DEFAULT_CONFIRM_TTL_SECS: u64 = 30;

const MIN_CONFIRM_TTL_SECS: u64 = 1;
const MAX_CONFIRM_TTL_SECS: u64 = 86_400;

/// A pending request to wipe the store, waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearToken {
    pub id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ClearToken {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Result of [`EvaluationStore::clear`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// First step: nothing was deleted, confirmation is now pending.
    Pending(ClearToken),
    /// Second step: this many evaluations were deleted.
    Cleared(usize),
}

#[derive(Debug, Default)]
struct StoreState {
    evaluations: Vec<Evaluation>,
    pending_clear: Option<ClearToken>,
}

/// Append-only list of accepted evaluations, in submission order.
#[derive(Debug)]
pub struct EvaluationStore {
    state: Mutex<StoreState>,
    confirm_ttl: Duration,
}

impl Default for EvaluationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject blank evaluator or subject names.
pub fn validate_identity(evaluator: &str, subject: &str) -> Result<(), ValidationError> {
    if evaluator.trim().is_empty() {
        return Err(ValidationError::MissingEvaluator);
    }
    if subject.trim().is_empty() {
        return Err(ValidationError::MissingSubject);
    }
    Ok(())
}

impl EvaluationStore {
    pub fn new() -> Self {
        Self::with_confirm_ttl(DEFAULT_CONFIRM_TTL_SECS)
    }

    /// Create a store whose clear confirmations expire after `secs` seconds,
    /// clamped to between one second and one day.
    pub fn with_confirm_ttl(secs: u64) -> Self {
        let secs = secs.clamp(MIN_CONFIRM_TTL_SECS, MAX_CONFIRM_TTL_SECS);
        Self {
            state: Mutex::new(StoreState::default()),
            confirm_ttl: Duration::seconds(secs as i64),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and append an evaluation stamped with the current time.
    pub fn submit(
        &self,
        evaluator: &str,
        subject: &str,
        responses: Responses,
    ) -> Result<Evaluation, ValidationError> {
        self.submit_at(evaluator, subject, responses, Utc::now())
    }

    /// Validate and append an evaluation stamped with `at`.
    ///
    /// Names are stored trimmed. A successful submission cancels any pending
    /// clear request.
    pub fn submit_at(
        &self,
        evaluator: &str,
        subject: &str,
        responses: Responses,
        at: DateTime<Utc>,
    ) -> Result<Evaluation, ValidationError> {
        if let Err(e) = validate_identity(evaluator, subject) {
            tracing::warn!("rejected submission: {e}");
            return Err(e);
        }

        let evaluation = Evaluation {
            timestamp: at,
            evaluator: evaluator.trim().to_string(),
            subject: subject.trim().to_string(),
            responses,
        };

        let mut state = self.state();
        state.evaluations.push(evaluation.clone());
        if state.pending_clear.take().is_some() {
            tracing::debug!("pending clear request cancelled by new submission");
        }
        tracing::info!(
            evaluator = %evaluation.evaluator,
            subject = %evaluation.subject,
            responses = evaluation.responses.len(),
            total = state.evaluations.len(),
            "evaluation accepted"
        );

        Ok(evaluation)
    }

    pub fn len(&self) -> usize {
        self.state().evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().evaluations.is_empty()
    }

    /// Copy of all evaluations in submission order.
    pub fn snapshot(&self) -> Vec<Evaluation> {
        self.state().evaluations.clone()
    }

    /// Run `f` over the stored evaluations without copying them.
    pub fn with_evaluations<T>(&self, f: impl FnOnce(&[Evaluation]) -> T) -> T {
        f(&self.state().evaluations)
    }

    /// The pending clear request, if one is waiting.
    pub fn pending_clear(&self) -> Option<ClearToken> {
        self.state().pending_clear.clone()
    }

    /// First step of a bulk clear: issue a confirmation token.
    ///
    /// A new request replaces any previous one.
    pub fn request_clear(&self, now: DateTime<Utc>) -> ClearToken {
        let token = ClearToken {
            id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + self.confirm_ttl,
        };
        let mut state = self.state();
        state.pending_clear = Some(token.clone());
        tracing::info!(
            evaluations = state.evaluations.len(),
            expires_at = %token.expires_at,
            "clear requested, awaiting confirmation"
        );
        token
    }

    /// Second step of a bulk clear. Returns the number of deleted evaluations.
    pub fn confirm_clear(&self, token_id: Uuid, now: DateTime<Utc>) -> Result<usize, ClearError> {
        let mut state = self.state();
        let pending = state
            .pending_clear
            .as_ref()
            .ok_or(ClearError::NoPendingRequest)?;

        if pending.id != token_id {
            return Err(ClearError::TokenMismatch);
        }
        if !pending.is_live(now) {
            state.pending_clear = None;
            tracing::warn!("clear confirmation arrived after expiry");
            return Err(ClearError::Expired);
        }

        state.pending_clear = None;
        let removed = std::mem::take(&mut state.evaluations).len();
        tracing::info!(removed, "evaluation store cleared");
        Ok(removed)
    }

    /// Two-invocation clear: the first call requests, a second call while the
    /// request is live performs the clear. An expired request is replaced by
    /// a fresh one.
    pub fn clear(&self, now: DateTime<Utc>) -> ClearOutcome {
        let live = self
            .pending_clear()
            .filter(|token| token.is_live(now))
            .map(|token| token.id);

        match live.map(|id| self.confirm_clear(id, now)) {
            Some(Ok(removed)) => ClearOutcome::Cleared(removed),
            _ => ClearOutcome::Pending(self.request_clear(now)),
        }
    }
}
