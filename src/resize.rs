use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::backend::HostDocument;
use crate::channel::HostChannel;
use crate::protocol::OutboundMessage;

/// Reports the document height to the host whenever it changes.
pub struct ResizeMonitor {
    document: Arc<dyn HostDocument>,
    channel: Arc<dyn HostChannel>,
    last: Mutex<Option<u32>>,
}

impl ResizeMonitor {
    pub fn new(document: Arc<dyn HostDocument>, channel: Arc<dyn HostChannel>) -> Self {
        Self {
            document,
            channel,
            last: Mutex::new(None),
        }
    }

    /// Measure once. Sends `resize` and returns true only when the height
    /// differs from the last one reported.
    pub fn check(&self) -> bool {
        let Some(height) = self.document.measure_height() else {
            return false;
        };
        {
            let mut last = self.last.lock();
            if *last == Some(height) {
                return false;
            }
            *last = Some(height);
        }
        trace!(height, "document resized");
        self.channel.send(OutboundMessage::Resize { height });
        true
    }

    pub fn spawn_polling(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.check();
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::channel::RecordingChannel;
    use crate::testing::FakeDocument;

    fn monitor(document: Arc<FakeDocument>) -> (ResizeMonitor, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::new());
        (ResizeMonitor::new(document, channel.clone()), channel)
    }

    #[test]
    fn reports_only_changes() {
        let document = Arc::new(FakeDocument::new().with_height(100));
        let (monitor, channel) = monitor(document.clone());
        assert!(monitor.check());
        assert!(!monitor.check());
        document.set_height(140);
        assert!(monitor.check());
        assert_eq!(
            channel.messages(),
            vec![
                OutboundMessage::Resize { height: 100 },
                OutboundMessage::Resize { height: 140 },
            ]
        );
    }

    #[test]
    fn unmeasurable_document_sends_nothing() {
        let (monitor, channel) = monitor(Arc::new(FakeDocument::new()));
        assert!(!monitor.check());
        assert!(channel.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_later_changes() {
        let document = Arc::new(FakeDocument::new().with_height(10));
        let (monitor, channel) = monitor(document.clone());
        let handle = Arc::new(monitor).spawn_polling(Duration::from_millis(300));

        tokio::time::sleep(Duration::from_millis(10)).await;
        document.set_height(20);
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.abort();

        assert_eq!(channel.kinds(), vec!["resize", "resize"]);
    }
}
