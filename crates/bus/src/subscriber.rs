//! Subscribing side of the fan-out bus.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::frame::BusFrame;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// What an instance does with each received frame: deliver the envelope to
/// the local sessions joined to the room, then enqueue it on the durable log.
///
/// `handle` is awaited to completion before the next frame is read, so the
/// per-instance total order of the channel is preserved.
pub trait FrameHandler: Send + Sync {
    fn handle(&self, frame: BusFrame) -> impl Future<Output = ()> + Send;
}

/// Run the process-wide subscriber loop until `shutdown` flips.
///
/// Subscribes to the shared channel once per connection; when the pub/sub
/// stream ends (connection loss) it reconnects after a fixed delay instead of
/// exiting. Frames that fail to decode are logged and skipped.
pub async fn run_subscriber<H>(
    client: redis::Client,
    channel: String,
    handler: H,
    mut shutdown: watch::Receiver<bool>,
) where
    H: FrameHandler,
{
    loop {
        if *shutdown.borrow() {
            return;
        }

        let mut pubsub = match client.get_async_pubsub().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = %err, "failed to open fan-out subscriber connection, retrying");
                if wait_or_shutdown(&mut shutdown, RECONNECT_DELAY).await {
                    return;
                }
                continue;
            }
        };

        if let Err(err) = pubsub.subscribe(&channel).await {
            error!(error = %err, channel = %channel, "failed to subscribe to fan-out channel, retrying");
            if wait_or_shutdown(&mut shutdown, RECONNECT_DELAY).await {
                return;
            }
            continue;
        }

        info!(channel = %channel, "subscribed to fan-out channel");

        let mut stream = pubsub.on_message();
        loop {
            let message = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("fan-out subscriber shutting down");
                        return;
                    }
                    continue;
                }
                message = stream.next() => message,
            };

            let Some(message) = message else {
                // Stream ended, the outer loop reconnects.
                break;
            };

            let payload: String = match message.get_payload() {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to read fan-out payload, skipping");
                    continue;
                }
            };

            match BusFrame::decode(&payload) {
                Ok(frame) => handler.handle(frame).await,
                Err(err) => {
                    warn!(error = %err, "undecodable fan-out frame, skipping");
                }
            }
        }

        warn!(channel = %channel, "fan-out subscription ended, reconnecting");
        if wait_or_shutdown(&mut shutdown, RECONNECT_DELAY).await {
            return;
        }
    }
}

/// Sleep for `delay`, returning `true` if shutdown was requested meanwhile.
/// A closed channel counts as shutdown.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        result = shutdown.wait_for(|stop| *stop) => {
            let _ = result;
            return true;
        }
    }
    *shutdown.borrow()
}
