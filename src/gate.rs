//! Gate verification.
//!
//! Validates a presented pass token at the point of entry. Every rejection
//! is a reason code in the returned [`Verification`] — gate stewards need
//! `already_used`, not a stack trace — and only infrastructure failures
//! surface as errors.

use crate::error::Result;
use crate::providers::PassRepository;
use crate::types::{PassState, RejectReason, Verification};
use crate::utils::hash_token;
use chrono::Utc;
use std::sync::Arc;

/// Verifies pass tokens at the stadium gate.
pub struct GateVerifier<P> {
    passes: Arc<P>,
}

impl<P> GateVerifier<P>
where
    P: PassRepository,
{
    /// Create a verifier over the pass repository.
    pub const fn new(passes: Arc<P>) -> Self {
        Self { passes }
    }

    /// Verify a presented token.
    ///
    /// `dry_run` answers "would this currently succeed" for steward
    /// pre-checks and never mutates state. A live verification consumes
    /// the pass through a conditional transition (`Used` only from a live
    /// state), so two gates scanning a photographed QR at once produce
    /// exactly one admission and one `already_used`.
    ///
    /// # Errors
    ///
    /// Only retryable store errors; rejections are data in the returned
    /// [`Verification`].
    pub async fn verify(&self, token: &str, dry_run: bool, steward: &str) -> Result<Verification> {
        let Some(pass) = self.passes.find_by_token_hash(&hash_token(token)).await? else {
            // Covers unknown tokens and tokens invalidated by rotation:
            // the old hash simply no longer exists.
            return Ok(Verification::rejected(RejectReason::NotFound, None));
        };

        match pass.state {
            PassState::Used => Ok(Verification::rejected(
                RejectReason::AlreadyUsed,
                Some(pass),
            )),
            PassState::Revoked => {
                Ok(Verification::rejected(RejectReason::Revoked, Some(pass)))
            }
            PassState::Issued | PassState::Active => {
                if dry_run {
                    return Ok(Verification::granted(pass));
                }

                match self.passes.consume(pass.id, steward, Utc::now()).await? {
                    Some(consumed) => {
                        tracing::info!(
                            pass_id = %consumed.id,
                            steward = %steward,
                            zone = %consumed.zone,
                            "pass consumed at gate"
                        );
                        Ok(Verification::granted(consumed))
                    }
                    // Lost the race against another scan (or a concurrent
                    // revocation); report what the pass became.
                    None => {
                        let reason = match self.passes.get_pass(pass.id).await? {
                            Some(current) if current.state == PassState::Revoked => {
                                RejectReason::Revoked
                            }
                            _ => RejectReason::AlreadyUsed,
                        };
                        Ok(Verification::rejected(reason, Some(pass)))
                    }
                }
            }
        }
    }
}
