//! # Consent Flow Integration
//!
//! End-to-end resolution paths: the waiter drives the connection manager
//! over the in-memory transport, wire frames are correlated against the
//! observed debt, and the outcome callback fires exactly once.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::{mpsc, oneshot};
    use tokio::time::{sleep, timeout};

    use dc_connection::adapters::InMemoryTransport;
    use dc_connection::{ConnectionManager, ConsentTransport};
    use dc_consent::{ConsentWaiter, WaiterConfig, WaiterStatus};
    use shared_types::{ConsentOutcome, DebtId, MerchantId, CONSENT_UPDATE_EVENT};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Harness {
        waiter: ConsentWaiter,
        transport: Arc<InMemoryTransport>,
        manager: Arc<ConnectionManager>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(InMemoryTransport::new());
        let manager = Arc::new(ConnectionManager::new(
            transport.clone() as Arc<dyn ConsentTransport>
        ));
        let waiter = ConsentWaiter::new(Arc::clone(&manager), WaiterConfig::default());
        Harness {
            waiter,
            transport,
            manager,
        }
    }

    /// Let spawned tasks make progress under the paused clock.
    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    async fn recv_outcome(rx: oneshot::Receiver<ConsentOutcome>) -> ConsentOutcome {
        timeout(Duration::from_secs(5), rx)
            .await
            .expect("timed out awaiting outcome")
            .expect("outcome channel closed")
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_accept_event_resolves_wait() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        assert!(h.manager.is_connected());
        assert!(h.transport.push_consent("42", "accepted"));

        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Accepted);
        // Full teardown: back to idle, connection released.
        assert_eq!(h.waiter.status(), WaiterStatus::Idle);
        assert!(!h.manager.is_connected());
        assert_eq!(h.transport.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_event_resolves_wait() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = done_tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        assert!(h.transport.push_consent("42", "rejected"));
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Rejected);
    }

    /// The dashboard flow end to end: the merchant's connection is opened
    /// once, unrelated traffic on the shared stream is ignored, and the
    /// decision for the observed debt resolves the wait.
    #[tokio::test(start_paused = true)]
    async fn test_shared_stream_scenario() {
        let h = harness();
        let (done_tx, done_rx) = oneshot::channel();

        h.waiter
            .start_waiting(
                DebtId::new("42"),
                MerchantId::new("merchant-7"),
                move |outcome| {
                    let _ = done_tx.send(outcome);
                },
            )
            .await
            .unwrap();
        settle().await;

        assert_eq!(h.transport.opened_for(), vec![MerchantId::new("merchant-7")]);

        // Another tab's debt, an unrelated event name, a malformed action:
        // all routine on a shared stream, none may resolve the wait.
        assert!(h.transport.push_consent("43", "accepted"));
        assert!(h.transport.push_event("debt.created", serde_json::json!({ "debtId": "42" })));
        assert!(h.transport.push_consent("42", "approved-maybe"));
        settle().await;
        assert!(h.waiter.is_waiting());

        // The decision arrives with a numeric identifier, as some backends
        // serialize ids. It still matches the observed "42".
        assert!(h.transport.push_event(
            CONSENT_UPDATE_EVENT,
            serde_json::json!({ "debtId": 42, "action": "accepted" })
        ));
        assert_eq!(recv_outcome(done_rx).await, ConsentOutcome::Accepted);
        assert_eq!(h.transport.opens(), 1, "one connection for the whole flow");
    }

    // =========================================================================
    // EXACTLY-ONCE DELIVERY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_events_deliver_one_outcome() {
        let h = harness();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let tx = done_tx.clone();
        h.waiter
            .start_waiting(DebtId::new("42"), MerchantId::new("7"), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await
            .unwrap();
        settle().await;

        // The backend re-delivers; only the first event may count.
        assert!(h.transport.push_consent("42", "accepted"));
        assert!(h.transport.push_consent("42", "accepted"));
        assert!(h.transport.push_consent("42", "rejected"));

        let first = timeout(Duration::from_secs(5), done_rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(first, ConsentOutcome::Accepted, "first outcome wins");

        settle().await;
        assert!(done_rx.try_recv().is_err(), "callback must fire exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_waits_reuse_the_manager() {
        let h = harness();

        for (debt, action, expected) in [
            ("42", "accepted", ConsentOutcome::Accepted),
            ("43", "rejected", ConsentOutcome::Rejected),
        ] {
            let (done_tx, done_rx) = oneshot::channel();
            h.waiter
                .start_waiting(DebtId::new(debt), MerchantId::new("7"), move |outcome| {
                    let _ = done_tx.send(outcome);
                })
                .await
                .unwrap();
            settle().await;

            assert!(h.transport.push_consent(debt, action));
            assert_eq!(recv_outcome(done_rx).await, expected);
            assert_eq!(h.waiter.status(), WaiterStatus::Idle);
        }

        // Each wait opened and released its own session.
        assert_eq!(h.transport.opens(), 2);
        assert_eq!(h.transport.live_sessions(), 0);
    }
}
