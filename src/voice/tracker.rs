//! Occupancy tracking for managed voice channels.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::model::id::ChannelId;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{Result, VoiceError};
use crate::gateway::GatewayClient;

/// Result of a successful decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// The channel is still tracked with this many members.
    Remaining(i64),
    /// The count dropped below one; the channel was untracked and deleted.
    Deleted,
}

impl Decrement {
    #[allow(dead_code)]
    pub fn deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Member counts of the channels this bot created.
///
/// Every operation goes through one exclusive lock. Callers that need
/// several operations to happen as one step (a switch decrements one
/// channel and increments another) hold the lock via [`OccupancyTracker::lock`].
pub struct OccupancyTracker {
    channels: Mutex<HashMap<ChannelId, i64>>,
    gateway: Arc<dyn GatewayClient>,
}

impl OccupancyTracker {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            gateway,
        }
    }

    /// Acquire the tracker for a sequence of operations.
    pub async fn lock(&self) -> OccupancyGuard<'_> {
        OccupancyGuard {
            channels: self.channels.lock().await,
            gateway: self.gateway.as_ref(),
        }
    }

    /// Start tracking a newly created channel at count 0.
    #[allow(dead_code)]
    pub async fn register(&self, channel_id: ChannelId) {
        self.lock().await.register(channel_id);
    }

    /// See [`OccupancyGuard::increment`].
    #[allow(dead_code)]
    pub async fn increment(&self, channel_id: ChannelId) -> Result<i64> {
        self.lock().await.increment(channel_id)
    }

    /// See [`OccupancyGuard::decrement`].
    #[allow(dead_code)]
    pub async fn decrement(&self, channel_id: ChannelId) -> Result<Decrement> {
        self.lock().await.decrement(channel_id).await
    }

    /// Current count of a tracked channel.
    #[allow(dead_code)]
    pub async fn count(&self, channel_id: ChannelId) -> Option<i64> {
        self.lock().await.count(channel_id)
    }

    /// Number of tracked channels.
    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }
}

/// Exclusive access to the tracker, held for one decide-then-mutate sequence.
pub struct OccupancyGuard<'a> {
    channels: MutexGuard<'a, HashMap<ChannelId, i64>>,
    gateway: &'a dyn GatewayClient,
}

impl OccupancyGuard<'_> {
    /// Start tracking a newly created channel at count 0.
    pub fn register(&mut self, channel_id: ChannelId) {
        if self.channels.insert(channel_id, 0).is_some() {
            warn!(channel = %channel_id, "Channel registered twice, count reset");
        }
        debug!(channel = %channel_id, "Tracking channel");
    }

    /// Stop tracking a channel without deleting it.
    pub fn unregister(&mut self, channel_id: ChannelId) -> bool {
        self.channels.remove(&channel_id).is_some()
    }

    /// Add a member to a tracked channel, returning the new count.
    ///
    /// # Errors
    /// `NotFound` if the channel is not tracked.
    pub fn increment(&mut self, channel_id: ChannelId) -> Result<i64> {
        let count = self
            .channels
            .get_mut(&channel_id)
            .ok_or(VoiceError::NotFound(channel_id))?;
        *count += 1;
        debug!(channel = %channel_id, count = *count, "Member joined managed channel");
        Ok(*count)
    }

    /// Remove a member from a tracked channel.
    ///
    /// When the count drops below one the channel is untracked and deleted.
    /// The entry stays removed even when the delete request fails, since the
    /// channel may already be gone.
    ///
    /// # Errors
    /// `NotFound` if the channel is not tracked, `ExternalApi` if the delete
    /// request failed.
    pub async fn decrement(&mut self, channel_id: ChannelId) -> Result<Decrement> {
        let count = self
            .channels
            .get_mut(&channel_id)
            .ok_or(VoiceError::NotFound(channel_id))?;
        *count -= 1;

        if *count >= 1 {
            debug!(channel = %channel_id, count = *count, "Member left managed channel");
            return Ok(Decrement::Remaining(*count));
        }

        self.channels.remove(&channel_id);
        debug!(channel = %channel_id, "Managed channel is empty, deleting");
        self.gateway.delete_channel(channel_id).await?;

        Ok(Decrement::Deleted)
    }

    /// Current count of a tracked channel.
    #[allow(dead_code)]
    pub fn count(&self, channel_id: ChannelId) -> Option<i64> {
        self.channels.get(&channel_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ApiErrorKind;
    use crate::testing::RecordingGateway;

    fn tracker() -> (OccupancyTracker, RecordingGateway) {
        let gateway = RecordingGateway::new();
        (OccupancyTracker::new(Arc::new(gateway.clone())), gateway)
    }

    #[tokio::test]
    async fn test_untracked_channel_is_not_found() {
        let (tracker, gateway) = tracker();
        let channel = ChannelId::new(7);

        assert!(tracker.increment(channel).await.unwrap_err().is_not_found());
        assert!(tracker.decrement(channel).await.unwrap_err().is_not_found());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_starts_at_zero() {
        let (tracker, _) = tracker();
        let channel = ChannelId::new(7);

        tracker.register(channel).await;

        assert_eq!(tracker.count(channel).await, Some(0));
        assert_eq!(tracker.increment(channel).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_member_leaving_deletes_once() {
        let (tracker, gateway) = tracker();
        let channel = ChannelId::new(7);
        tracker.register(channel).await;
        tracker.increment(channel).await.unwrap();

        let result = tracker.decrement(channel).await.unwrap();

        assert!(result.deleted());
        assert_eq!(tracker.count(channel).await, None);
        assert_eq!(gateway.deleted(), vec![channel]);

        // Gone for good
        assert!(tracker.decrement(channel).await.unwrap_err().is_not_found());
        assert_eq!(gateway.deleted(), vec![channel]);
    }

    #[tokio::test]
    async fn test_decrement_keeps_occupied_channel() {
        let (tracker, gateway) = tracker();
        let channel = ChannelId::new(7);
        tracker.register(channel).await;
        tracker.increment(channel).await.unwrap();
        tracker.increment(channel).await.unwrap();

        assert_eq!(
            tracker.decrement(channel).await.unwrap(),
            Decrement::Remaining(1)
        );
        assert!(gateway.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_decrement_from_zero_deletes() {
        let (tracker, gateway) = tracker();
        let channel = ChannelId::new(7);
        tracker.register(channel).await;

        assert!(tracker.decrement(channel).await.unwrap().deleted());
        assert_eq!(gateway.deleted(), vec![channel]);
    }

    #[tokio::test]
    async fn test_failed_delete_still_untracks() {
        let (tracker, gateway) = tracker();
        let channel = ChannelId::new(7);
        tracker.register(channel).await;
        gateway.fail_next_deletes(ApiErrorKind::Permission, 1);

        let err = tracker.decrement(channel).await.unwrap_err();

        assert!(matches!(err, VoiceError::ExternalApi(_)));
        assert_eq!(tracker.count(channel).await, None);
        assert_eq!(tracker.len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_and_decrements_balance() {
        let (tracker, gateway) = tracker();
        let tracker = Arc::new(tracker);
        let channel = ChannelId::new(7);
        tracker.register(channel).await;
        // Keep one member so the channel never empties during the run
        tracker.increment(channel).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..200 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    tracker.increment(channel).await.map(|_| ())
                } else {
                    // Pair each leave with a join so the count stays >= 1
                    let mut guard = tracker.lock().await;
                    guard.increment(channel)?;
                    guard.decrement(channel).await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tracker.count(channel).await, Some(101));
        assert!(gateway.deleted().is_empty());
    }
}
