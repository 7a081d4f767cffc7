//! Fan-out frame dispatch: the subscriber-side wiring.
//!
//! One dispatcher per instance. For every frame received on the shared
//! channel it (a) delivers the envelope to the local sessions joined to the
//! room and (b) hands the envelope to the durable log producer — in that
//! order, to completion, before the subscriber reads the next frame.

use std::future::Future;
use std::sync::Arc;

use parlor_bus::{BusFrame, FrameHandler};
use parlor_gateway::RoomRegistry;
use parlor_messages::Envelope;
use parlor_pipeline::{LogProducer, PipelineError};
use tracing::{debug, warn};

/// Enqueue seam so dispatch can be exercised without a broker.
pub trait LogSink: Send + Sync {
    fn enqueue(
        &self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;
}

impl LogSink for Arc<LogProducer> {
    async fn enqueue(&self, envelope: &Envelope) -> Result<(), PipelineError> {
        LogProducer::enqueue(self, envelope).await
    }
}

pub struct FanOutDispatcher<P> {
    registry: RoomRegistry,
    producer: P,
}

impl<P: LogSink> FanOutDispatcher<P> {
    pub fn new(registry: RoomRegistry, producer: P) -> Self {
        Self { registry, producer }
    }
}

impl<P: LogSink> FrameHandler for FanOutDispatcher<P> {
    async fn handle(&self, frame: BusFrame) {
        let delivered = self.registry.deliver(&frame.room_id, &frame.data).await;
        debug!(
            room = %frame.room_id,
            delivered,
            "delivered fan-out frame to local sessions"
        );

        // The durability hop is independent of delivery: a failed enqueue is
        // logged and dropped, never reported back through the bus.
        if let Err(error) = self.producer.enqueue(&frame.data).await {
            warn!(
                room = %frame.room_id,
                %error,
                "failed to enqueue envelope on the durable log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parlor_gateway::{ServerEvent, SessionId};
    use parlor_messages::Sender;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSink {
        enqueued: Mutex<Vec<Envelope>>,
    }

    impl LogSink for Arc<RecordingSink> {
        async fn enqueue(&self, envelope: &Envelope) -> Result<(), PipelineError> {
            self.enqueued.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    fn envelope(chat_id: &str, body: &str) -> Envelope {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
        Envelope {
            chat_id: chat_id.into(),
            body: Some(body.into()),
            image: None,
            created_at: at,
            updated_at: at,
            public_id: Some("m1".into()),
            is_edited: None,
            created_by: Sender {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                image: None,
            },
        }
    }

    async fn join_session(
        registry: &RoomRegistry,
        room: &str,
    ) -> (SessionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let session = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(session, tx).await;
        registry.join(session, room).await.unwrap();
        (session, rx)
    }

    fn received(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<Envelope> {
        let mut envelopes = Vec::new();
        while let Ok(ServerEvent::Message { message }) = rx.try_recv() {
            envelopes.push(message);
        }
        envelopes
    }

    #[tokio::test]
    async fn frame_reaches_sessions_on_every_instance() {
        // Two symmetric gateway instances, one session each, both joined to
        // the same room across the bus.
        let registry_one = RoomRegistry::new();
        let registry_two = RoomRegistry::new();
        let (_a, mut rx_a) = join_session(&registry_one, "c1").await;
        let (_b, mut rx_b) = join_session(&registry_two, "c1").await;

        let sink = Arc::new(RecordingSink::default());
        let dispatcher_one = FanOutDispatcher::new(registry_one, Arc::clone(&sink));
        let dispatcher_two = FanOutDispatcher::new(registry_two, Arc::clone(&sink));

        let sent = envelope("c1", "hi");
        let frame = BusFrame::new("c1", sent.clone());

        // The shared channel hands every subscriber the same frame.
        dispatcher_one.handle(frame.clone()).await;
        dispatcher_two.handle(frame).await;

        assert_eq!(received(&mut rx_a), vec![sent.clone()]);
        assert_eq!(received(&mut rx_b), vec![sent.clone()]);

        // Each instance's callback also feeds the durable log.
        let enqueued = sink.enqueued.lock().unwrap();
        assert_eq!(enqueued.len(), 2);
        assert!(enqueued.iter().all(|e| *e == sent));
    }

    #[tokio::test]
    async fn frames_for_unjoined_rooms_still_reach_the_log() {
        let registry = RoomRegistry::new();
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = FanOutDispatcher::new(registry, Arc::clone(&sink));

        dispatcher
            .handle(BusFrame::new("c9", envelope("c9", "hello")))
            .await;

        assert_eq!(sink.enqueued.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delivery_order_matches_frame_order() {
        let registry = RoomRegistry::new();
        let (_s, mut rx) = join_session(&registry, "c1").await;
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = FanOutDispatcher::new(registry, Arc::clone(&sink));

        for body in ["one", "two", "three"] {
            dispatcher
                .handle(BusFrame::new("c1", envelope("c1", body)))
                .await;
        }

        let bodies: Vec<_> = received(&mut rx)
            .into_iter()
            .map(|e| e.body.unwrap())
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }
}
