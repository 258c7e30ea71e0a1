//! # Consent Watch
//!
//! Command-line runtime for the debt-consent workflow. Opens the merchant's
//! realtime connection, waits for the customer's decision on one debt, and
//! exits once the wait resolves.
//!
//! ## Configuration (environment)
//!
//! - `CONSENT_WS_ENDPOINT` — WebSocket endpoint of the consent stream
//! - `MERCHANT_ID` — merchant identity the connection is keyed by
//! - `DEBT_ID` — the debt to await a decision for
//! - `CONSENT_TIMEOUT_SECS` — optional timeout override (default 300)
//! - `RUST_LOG` — tracing filter (default `info`)
//!
//! ## Exit status
//!
//! `0` when consent was accepted; non-zero when it was rejected, expired,
//! or the wait was interrupted.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dc_connection::adapters::{WebSocketConfig, WebSocketTransport};
use dc_connection::{ConnectionManager, ConsentTransport};
use dc_consent::{ConsentWaiter, OutcomeNotifier, TracingNotifier, WaiterConfig};
use shared_types::{ConsentOutcome, DebtId, MerchantId};

/// Environment-derived runtime configuration.
struct WatchConfig {
    websocket: WebSocketConfig,
    merchant_id: MerchantId,
    debt_id: DebtId,
    waiter: WaiterConfig,
}

impl WatchConfig {
    fn from_env() -> Result<Self> {
        let websocket =
            WebSocketConfig::from_env().context("CONSENT_WS_ENDPOINT must be set")?;
        let merchant_id = MerchantId::new(
            env::var("MERCHANT_ID").context("MERCHANT_ID must be set")?,
        );
        let debt_id = DebtId::new(env::var("DEBT_ID").context("DEBT_ID must be set")?);

        let mut waiter = WaiterConfig::default();
        if let Ok(raw) = env::var("CONSENT_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .context("CONSENT_TIMEOUT_SECS must be a whole number of seconds")?;
            waiter = waiter.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            websocket,
            merchant_id,
            debt_id,
            waiter,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = WatchConfig::from_env()?;

    let transport = Arc::new(WebSocketTransport::new(config.websocket));
    let manager = Arc::new(ConnectionManager::new(
        transport as Arc<dyn ConsentTransport>,
    ));
    let waiter = ConsentWaiter::new(Arc::clone(&manager), config.waiter);
    let notifier = TracingNotifier;

    info!(
        debt = %config.debt_id,
        merchant = %config.merchant_id,
        "starting consent watch"
    );

    let (done_tx, done_rx) = oneshot::channel();
    waiter
        .start_waiting(
            config.debt_id.clone(),
            config.merchant_id.clone(),
            move |outcome| {
                let _ = done_tx.send(outcome);
            },
        )
        .await?;

    let outcome = tokio::select! {
        outcome = done_rx => outcome.context("wait task ended without an outcome")?,
        _ = tokio::signal::ctrl_c() => {
            warn!(debt = %config.debt_id, "interrupted; cancelling consent wait");
            waiter.cancel().await?;
            bail!("consent wait was interrupted");
        }
    };

    notifier.notify(&config.debt_id, outcome);
    match outcome {
        ConsentOutcome::Accepted => Ok(()),
        ConsentOutcome::Rejected => bail!("customer rejected the debt"),
        ConsentOutcome::Expired => bail!("consent wait expired without a decision"),
    }
}
