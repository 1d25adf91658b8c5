// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Bounded retry around a transport
//!
//! A call makes `retry_count + 1` attempts at most. Between attempts the
//! executor waits `retry_interval`, unless the request context is cancelled
//! or its deadline passes first.

use std::time::Duration;

use tracing::{debug, warn};

use super::transport::{SendFailure, Transport};
use crate::error::Result;
use crate::http::{OutboundRequest, RawResponse};

/// Sends one request with bounded retry
pub struct RetryExecutor<'a> {
    transport: &'a dyn Transport,
    retry_count: u32,
    retry_interval: Duration,
}

impl<'a> RetryExecutor<'a> {
    pub fn new(transport: &'a dyn Transport, retry_count: u32, retry_interval: Duration) -> Self {
        Self {
            transport,
            retry_count,
            retry_interval,
        }
    }

    /// Maximum number of sends this executor will make
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Send `request`, retrying failures until the budget is spent
    ///
    /// `on_failed_response` sees any response a failed attempt carried, just
    /// before that response is released. The error of the last attempt is
    /// returned verbatim.
    pub async fn execute<F>(&self, request: &OutboundRequest, mut on_failed_response: F) -> Result<RawResponse>
    where
        F: FnMut(&RawResponse) + Send,
    {
        let mut remaining = self.retry_count;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            // A finished context wins over a send that is ready at once
            let outcome = tokio::select! {
                biased;
                reason = request.context.done() => return Err(reason),
                outcome = self.transport.send(request) => outcome,
            };

            let SendFailure { error, response } = match outcome {
                Ok(response) => {
                    debug!(attempt, status = %response.status, "Request sent");
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            // Release whatever the failed attempt produced
            if let Some(response) = response {
                on_failed_response(&response);
                response.release();
            }

            if remaining == 0 {
                if self.retry_count > 0 {
                    warn!(attempts = attempt, error = %error, "Retries exhausted");
                }
                return Err(error);
            }
            remaining -= 1;

            warn!(
                attempt,
                remaining,
                delay_ms = self.retry_interval.as_millis() as u64,
                error = %error,
                "Request failed, retrying"
            );

            tokio::select! {
                biased;
                reason = request.context.done() => {
                    debug!(reason = %reason, "Context finished while waiting to retry");
                    return Err(error);
                }
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}
