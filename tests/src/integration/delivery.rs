//! End to end delivery flows across the fabric's three tiers: local
//! fan-out, transport relay, and the fallbacks between them.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use tokio::time::timeout;

    use shared_bus::adapters::{LoopbackTransport, NoopReplay};
    use shared_bus::{EventFabric, FabricConfig, Transport, TransportState};
    use shared_types::{AiScoreUpdate, Channel, FabricEvent, MsrpChange};

    const SETTLE: Duration = Duration::from_millis(80);
    const GUARD: Duration = Duration::from_secs(5);

    fn ai_event(vin: &str) -> FabricEvent {
        FabricEvent::AiScoreUpdate(AiScoreUpdate {
            vin: vin.to_owned(),
            dealer_id: Some("d-100".to_owned()),
            reason: "scores recomputed".to_owned(),
            avi: 0.82,
            ati: 0.74,
            cis: 0.91,
            ts: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        })
    }

    fn msrp_event(vin: &str) -> FabricEvent {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        FabricEvent::MsrpChange(MsrpChange::from_prices(vin, Some(42_000.0), 39_900.0, ts))
    }

    fn vin_of(event: &FabricEvent) -> String {
        match event {
            FabricEvent::AiScoreUpdate(e) => e.vin.clone(),
            FabricEvent::MsrpChange(e) => e.vin.clone(),
        }
    }

    /// Handler that records the vin of every event it sees.
    fn recorder(seen: &Arc<Mutex<Vec<String>>>) -> impl Fn(&FabricEvent) + Send + Sync + 'static {
        let seen = Arc::clone(seen);
        move |event| seen.lock().push(vin_of(event))
    }

    async fn connected_fabric(transport: Arc<LoopbackTransport>) -> Arc<EventFabric> {
        let fabric = EventFabric::new(
            FabricConfig::default(),
            Some(transport as Arc<dyn Transport>),
            Arc::new(NoopReplay),
        );
        fabric.start();
        timeout(GUARD, fabric.wait_for_state(TransportState::Connected))
            .await
            .expect("transport should connect");
        fabric
    }

    #[tokio::test]
    async fn test_local_delivery_preserves_publish_order() {
        let fabric = EventFabric::local_only(FabricConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = fabric.subscribe(Channel::Ai, recorder(&seen));

        fabric.publish(ai_event("VIN-1")).await;
        fabric.publish(ai_event("VIN-2")).await;

        assert_eq!(*seen.lock(), vec!["VIN-1", "VIN-2"]);
    }

    #[tokio::test]
    async fn test_unsubscribed_handler_receives_nothing() {
        let fabric = EventFabric::local_only(FabricConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sub = fabric.subscribe(Channel::Ai, recorder(&seen));
        sub.unsubscribe();
        fabric.publish(ai_event("VIN-1")).await;

        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_block_later_handlers() {
        let fabric = EventFabric::local_only(FabricConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _first = fabric.subscribe(Channel::Ai, |_event: &FabricEvent| {
            panic!("handler failure");
        });
        let _second = fabric.subscribe(Channel::Ai, recorder(&seen));

        fabric.publish(ai_event("VIN-1")).await;
        assert_eq!(*seen.lock(), vec!["VIN-1"]);
    }

    #[tokio::test]
    async fn test_channels_are_independent() {
        let fabric = EventFabric::local_only(FabricConfig::default());
        let ai_seen = Arc::new(Mutex::new(Vec::new()));
        let msrp_seen = Arc::new(Mutex::new(Vec::new()));
        let _ai = fabric.subscribe(Channel::Ai, recorder(&ai_seen));
        let _msrp = fabric.subscribe(Channel::Msrp, recorder(&msrp_seen));

        fabric.publish(msrp_event("VIN-9")).await;

        assert!(ai_seen.lock().is_empty());
        assert_eq!(*msrp_seen.lock(), vec!["VIN-9"]);
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_lose_events() {
        let transport = Arc::new(LoopbackTransport::new());
        let fabric = connected_fabric(Arc::clone(&transport)).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = fabric.subscribe(Channel::Ai, recorder(&seen));

        transport.fail_publishes(true);
        fabric.publish(ai_event("VIN-1")).await;
        tokio::time::sleep(SETTLE).await;

        // Fallback tier delivered it, and only once.
        assert_eq!(*seen.lock(), vec!["VIN-1"]);
    }

    #[tokio::test]
    async fn test_publish_before_transport_ready_delivers_locally() {
        let transport = Arc::new(LoopbackTransport::new());
        let fabric = EventFabric::new(
            FabricConfig::default(),
            Some(transport as Arc<dyn Transport>),
            Arc::new(NoopReplay),
        );
        // start() deliberately not called: state stays Connecting.
        assert_eq!(fabric.transport_state(), TransportState::Connecting);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = fabric.subscribe(Channel::Ai, recorder(&seen));
        fabric.publish(ai_event("VIN-1")).await;

        assert_eq!(*seen.lock(), vec!["VIN-1"]);
    }

    #[tokio::test]
    async fn test_malformed_inbound_payload_is_dropped() {
        let transport = Arc::new(LoopbackTransport::new());
        let fabric = connected_fabric(Arc::clone(&transport)).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = fabric.subscribe(Channel::Ai, recorder(&seen));

        transport.inject_raw(Channel::Ai.topic(), "{not json");
        tokio::time::sleep(SETTLE).await;

        assert!(seen.lock().is_empty());
        assert_eq!(fabric.relay_counters().dropped_malformed(), 1);
        assert_eq!(fabric.relay_counters().relayed(), 0);
    }

    #[tokio::test]
    async fn test_cross_process_delivery_via_shared_broker() {
        // Two fabrics sharing one broker stand in for two processes.
        let broker = Arc::new(LoopbackTransport::new());
        let publisher = connected_fabric(Arc::clone(&broker)).await;
        let consumer = connected_fabric(Arc::clone(&broker)).await;

        let local_seen = Arc::new(Mutex::new(Vec::new()));
        let remote_seen = Arc::new(Mutex::new(Vec::new()));
        let _local = publisher.subscribe(Channel::Msrp, recorder(&local_seen));
        let _remote = consumer.subscribe(Channel::Msrp, recorder(&remote_seen));

        publisher.publish(msrp_event("VIN-7")).await;
        tokio::time::sleep(SETTLE).await;

        // Both processes hear it; the publisher's own subscriber exactly
        // once, via the relay rather than a second local emit.
        assert_eq!(*remote_seen.lock(), vec!["VIN-7"]);
        assert_eq!(*local_seen.lock(), vec!["VIN-7"]);
        assert_eq!(publisher.relay_counters().relayed(), 1);
        assert_eq!(consumer.relay_counters().relayed(), 1);
    }

    #[tokio::test]
    async fn test_relayed_envelope_round_trips_fields() {
        let broker = Arc::new(LoopbackTransport::new());
        let publisher = connected_fabric(Arc::clone(&broker)).await;
        let consumer = connected_fabric(Arc::clone(&broker)).await;

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _sub = consumer.subscribe(Channel::Msrp, move |event| {
            sink.lock().push(event.clone());
        });

        publisher.publish(msrp_event("VIN-7")).await;
        tokio::time::sleep(SETTLE).await;

        let events = received.lock();
        let FabricEvent::MsrpChange(change) = &events[0] else {
            panic!("expected an msrp envelope");
        };
        assert_eq!(change.vin, "VIN-7");
        assert_eq!(change.old, Some(42_000.0));
        assert_eq!(change.new, 39_900.0);
        let delta = change.delta_pct.expect("delta present when old is set");
        assert!((delta - (39_900.0 - 42_000.0) / 42_000.0 * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_shutdown_stops_relay_but_not_local_delivery() {
        let transport = Arc::new(LoopbackTransport::new());
        let fabric = connected_fabric(Arc::clone(&transport)).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = fabric.subscribe(Channel::Ai, recorder(&seen));

        fabric.shutdown();
        tokio::time::sleep(SETTLE).await;

        // Inbound relay is gone...
        transport.inject_raw(
            Channel::Ai.topic(),
            &serde_json::to_string(&ai_event("VIN-X")).unwrap(),
        );
        tokio::time::sleep(SETTLE).await;
        assert!(seen.lock().is_empty());

        // ...while local-only fan-out is unaffected by relay teardown.
        let local = EventFabric::local_only(FabricConfig::default());
        let _sub2 = local.subscribe(Channel::Ai, recorder(&seen));
        local.publish(ai_event("VIN-Y")).await;
        assert_eq!(*seen.lock(), vec!["VIN-Y"]);
    }
}
