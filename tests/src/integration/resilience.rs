//! # Resilience Integration
//!
//! The unhappy paths: timeout expiry, transport loss, cancellation, double
//! starts, and the one-connection-per-merchant invariant under churn. Timer
//! behavior runs under the paused tokio clock, so the five-minute product
//! timeout elapses in virtual time.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout};

    use dc_connection::adapters::InMemoryTransport;
    use dc_connection::{ConnectionManager, ConsentTransport};
    use dc_consent::{ConsentWaiter, WaiterConfig, WaiterError, WaiterStatus};
    use shared_types::{ConsentOutcome, DebtId, MerchantId};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Harness {
        waiter: ConsentWaiter,
        transport: Arc<InMemoryTransport>,
        manager: Arc<ConnectionManager>,
    }

    fn harness() -> Harness {
        harness_with(WaiterConfig::default())
    }

    fn harness_with(config: WaiterConfig) -> Harness {
        let transport = Arc::new(InMemoryTransport::new());
        let manager = Arc::new(ConnectionManager::new(
            transport.clone() as Arc<dyn ConsentTransport>
        ));
        let waiter = ConsentWaiter::new(Arc::clone(&manager), config);
        Harness {
            waiter,
            transport,
            manager,
        }
    }

    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    async fn recv_outcome(rx: oneshot::Receiver<ConsentOutcome>) -> ConsentOutcome {
        timeout(Duration::from_secs(600), rx)
            .await
            .expect("timed out awaiting outcome")
            .expect("outcome channel closed")
    }

    // =========================================================================
    // TIMEOUT
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_wait_expires_after_five_minutes() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();

        // Nothing arrives; virtual time runs to the timeout.
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Expired);
        assert_eq!(h.waiter.status(), WaiterStatus::Idle);
        assert!(!h.manager.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_counter_tracks_virtual_seconds() {
        let h = harness();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), |_| {})
            .await
            .unwrap();

        sleep(Duration::from_secs(90)).await;
        let elapsed = h.waiter.elapsed_secs().expect("still waiting");
        assert!((89..=90).contains(&elapsed), "elapsed was {elapsed}");

        h.waiter.cancel().await.unwrap();
        assert_eq!(h.waiter.elapsed_secs(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_after_expiry_is_ignored() {
        let h = harness_with(WaiterConfig::default().with_timeout(Duration::from_secs(5)));
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();

        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Expired);

        // A late decision hits a torn-down session: no handler, no panic.
        assert!(!h.transport.push_consent("42", "accepted"));
        settle().await;
        assert_eq!(h.waiter.status(), WaiterStatus::Idle);
    }

    // =========================================================================
    // TRANSPORT LOSS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_unintentional_disconnect_expires_the_wait() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        h.transport.drop_link();

        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Expired);
        assert_eq!(h.waiter.status(), WaiterStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_still_expires() {
        let h = harness_with(WaiterConfig::default().with_timeout(Duration::from_secs(5)));
        h.transport.fail_next_open();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        // No session came up; the wait still resolves through the timeout
        // rather than hanging or erroring out of `start_waiting`.
        assert!(!h.manager.is_connected());
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Expired);
    }

    // =========================================================================
    // CANCELLATION
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_silent_and_complete() {
        let h = harness();
        let fired = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&fired);

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |_| {
                probe.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        settle().await;

        h.waiter.cancel().await.unwrap();

        assert_eq!(h.waiter.status(), WaiterStatus::Idle);
        assert!(!h.manager.is_connected());
        assert_eq!(h.transport.live_sessions(), 0);

        // Run out the clock: the cleared timer must not fire a late outcome.
        sleep(Duration::from_secs(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "cancel never reports back");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_without_wait_is_an_error() {
        let h = harness();
        assert_eq!(h.waiter.cancel().await.unwrap_err(), WaiterError::NotWaiting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_restarts_cleanly_after_cancel() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), |_| {})
            .await
            .unwrap();
        settle().await;
        h.waiter.cancel().await.unwrap();

        h.waiter
            .start_waiting(DebtId::new("43"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        assert!(h.transport.push_consent("43", "accepted"));
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Accepted);
    }

    // =========================================================================
    // CONCURRENT STARTS AND CONNECTION CHURN
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_the_first_wait() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();

        let err = h
            .waiter
            .start_waiting(DebtId::new("43"), MerchantId::new("7"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, WaiterError::AlreadyWaiting(DebtId::new("42")));

        // The original wait is untouched and still resolvable.
        settle().await;
        assert!(h.transport.push_consent("42", "accepted"));
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Accepted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_connection_per_merchant_under_churn() {
        let h = harness();

        // Direct manager churn: repeat connects for one merchant collapse
        // into one session; a different merchant swaps the session.
        h.manager.connect(&MerchantId::new("7")).await;
        h.manager.connect(&MerchantId::new("7")).await;
        h.manager.connect(&MerchantId::new("8")).await;
        settle().await;

        assert_eq!(h.transport.opens(), 2);
        assert_eq!(h.transport.live_sessions(), 1);
        assert_eq!(h.manager.connected_merchant(), Some(MerchantId::new("8")));

        h.manager.disconnect().await;
        settle().await;
        assert_eq!(h.transport.live_sessions(), 0);
    }
}
