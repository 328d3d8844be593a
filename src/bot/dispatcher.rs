//! Voice event dispatch.
//!
//! Gateway callbacks push transitions into a bounded queue; a fixed pool of
//! workers drains it and hands each transition to the processor.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cache::SettingsCache;
use crate::gateway::GatewayClient;
use crate::voice::{Outcome, VoiceEventProcessor, VoiceTransition};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Guild settings, read by the voice pipeline and written by `/set`.
    pub settings: Arc<SettingsCache>,

    /// Voice transition processor.
    pub processor: Arc<VoiceEventProcessor>,

    /// Producer side of the voice event queue.
    pub voice_events: VoiceQueue,

    /// Platform client, used outside the voice pipeline for command cleanup.
    pub gateway: Arc<dyn GatewayClient>,
}

impl AppState {
    pub fn new(
        settings: Arc<SettingsCache>,
        processor: Arc<VoiceEventProcessor>,
        voice_events: VoiceQueue,
        gateway: Arc<dyn GatewayClient>,
    ) -> Self {
        Self {
            settings,
            processor,
            voice_events,
            gateway,
        }
    }
}

/// Bounded queue of voice transitions.
#[derive(Clone)]
pub struct VoiceQueue {
    sender: mpsc::Sender<VoiceTransition>,
}

impl VoiceQueue {
    /// Create the queue and spawn `workers` tasks draining it.
    ///
    /// Workers exit once every `VoiceQueue` clone is dropped and the queue
    /// is empty.
    pub fn start(
        processor: Arc<VoiceEventProcessor>,
        workers: usize,
        capacity: usize,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|id| {
                let processor = processor.clone();
                let receiver = receiver.clone();
                tokio::spawn(run_worker(id, processor, receiver))
            })
            .collect();

        debug!("Started {} voice workers (queue capacity {})", workers, capacity);
        (Self { sender }, handles)
    }

    /// Enqueue a transition, waiting while the queue is full.
    pub async fn push(&self, transition: VoiceTransition) {
        if self.sender.send(transition).await.is_err() {
            warn!(guild = %transition.guild_id, "Voice queue closed, dropping transition");
        }
    }
}

async fn run_worker(
    id: usize,
    processor: Arc<VoiceEventProcessor>,
    receiver: Arc<Mutex<mpsc::Receiver<VoiceTransition>>>,
) {
    loop {
        // Release the receiver before processing so other workers can pull
        let next = receiver.lock().await.recv().await;
        let Some(transition) = next else {
            break;
        };

        if let Outcome::Ignored(reason) = processor.handle(transition).await {
            trace!(worker = id, guild = %transition.guild_id, "Transition ignored: {:?}", reason);
        }
    }
    debug!(worker = id, "Voice worker stopped");
}
