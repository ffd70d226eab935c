// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscribes to the event bus and hands each decoded [`DomainEvent`] to the
//! broadcaster. Reconnects with exponential backoff and jitter on
//! disconnect, bounded by `reconnect_max_attempts`; a connect failure also
//! counts against the bus circuit breaker so sustained bus outages stop
//! being retried as aggressively.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use gateway_core::DomainEvent;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Subjects the gateway subscribes to, relative to the configured prefix.
/// `branch.*.waiters` / `branch.*.kitchen` / `branch.*.admin` carry
/// branch-scoped fan-out, `sector.*.waiters` carries sector-scoped
/// waiter events, and `session.*` carries table-session-scoped events.
const SUBJECTS: &[&str] = &["branch.*.waiters", "branch.*.kitchen", "branch.*.admin", "sector.*.waiters", "session.*"];

pub struct BusSubscriber {
    url: String,
    prefix: String,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    circuit: Arc<CircuitBreaker>,
}

impl BusSubscriber {
    pub fn new(config: &GatewayConfig, circuit: Arc<CircuitBreaker>) -> Self {
        Self {
            url: config.nats_url.clone(),
            prefix: config.nats_subject_prefix.clone(),
            max_attempts: config.reconnect_max_attempts,
            base_delay: gateway_core::constants::RECONNECT_BASE_DELAY,
            max_delay: config.reconnect_max_delay(),
            circuit,
        }
    }

    fn subject(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}.{}", self.prefix, suffix)
        }
    }

    /// Runs until `cancel` fires or reconnect attempts are exhausted,
    /// dispatching every decoded event to `on_event`.
    pub async fn run<F>(&self, cancel: CancellationToken, on_event: F) -> Result<(), GatewayError>
    where
        F: Fn(DomainEvent) + Send + Sync,
    {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            self.circuit.before_call()?;
            match self.connect_and_consume(&cancel, &on_event).await {
                Ok(()) => {
                    self.circuit.on_success();
                    return Ok(());
                }
                Err(err) => {
                    self.circuit.on_failure();
                    attempt += 1;
                    if attempt > self.max_attempts {
                        error!(attempts = attempt, "bus subscriber exhausted reconnect attempts");
                        return Err(GatewayError::ReconnectExhausted);
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, err = %err, "bus subscriber reconnecting");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Ok(()),
                    }
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = exp.min(self.max_delay.as_secs_f64());
        let jitter: f64 = rand::rng().random_range(0.5..1.0);
        Duration::from_secs_f64(capped * jitter)
    }

    async fn connect_and_consume<F>(&self, cancel: &CancellationToken, on_event: &F) -> Result<(), GatewayError>
    where
        F: Fn(DomainEvent) + Send + Sync,
    {
        let client = async_nats::connect(&self.url).await?;
        info!(url = %self.url, "bus subscriber connected");

        let mut subs = Vec::new();
        for suffix in SUBJECTS {
            let subject = self.subject(suffix);
            subs.push(client.subscribe(subject).await?);
        }
        let mut merged = futures_util::stream::select_all(subs);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                msg = merged.next() => {
                    let Some(msg) = msg else { return Err(GatewayError::ReconnectExhausted) };
                    match serde_json::from_slice::<serde_json::Value>(&msg.payload) {
                        Ok(value) => match DomainEvent::from_json(&value) {
                            Ok(event) => on_event(event),
                            Err(e) => warn!(err = %e, subject = %msg.subject, "dropping malformed bus event"),
                        },
                        Err(e) => warn!(err = %e, subject = %msg.subject, "dropping non-JSON bus message"),
                    }
                }
            }
        }
    }
}
