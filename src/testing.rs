//! In-crate fakes shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, UserId};

use crate::database::{GuildSetting, SettingsStore};
use crate::gateway::{ApiErrorKind, GatewayClient, GatewayError};

/// Settings store kept in a `HashMap`, with switchable write failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreState>>,
}

#[derive(Default)]
struct MemoryStoreState {
    records: HashMap<GuildId, GuildSetting>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, setting: GuildSetting) {
        self.inner.lock().records.insert(setting.guild_id, setting);
    }

    pub fn stored(&self, guild_id: GuildId) -> Option<GuildSetting> {
        self.inner.lock().records.get(&guild_id).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn upsert(&self, setting: &GuildSetting) -> anyhow::Result<()> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            anyhow::bail!("store unavailable");
        }
        state.writes += 1;
        state.records.insert(setting.guild_id, setting.clone());
        Ok(())
    }

    async fn query_all(&self) -> anyhow::Result<Vec<GuildSetting>> {
        Ok(self.inner.lock().records.values().cloned().collect())
    }
}

/// One request seen by [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create {
        guild_id: GuildId,
        name: String,
        category_id: Option<ChannelId>,
    },
    Move {
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    },
    Delete {
        channel_id: ChannelId,
    },
    DeleteCommands {
        guild_id: GuildId,
    },
}

/// Gateway fake that records successful calls and can inject failures.
///
/// Created channels get IDs counting up from 1000.
#[derive(Clone)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    next_channel: Arc<AtomicU64>,
    create_failures: Arc<Mutex<VecDeque<ApiErrorKind>>>,
    move_failures: Arc<Mutex<VecDeque<ApiErrorKind>>>,
    delete_failures: Arc<Mutex<VecDeque<ApiErrorKind>>>,
    delete_attempts: Arc<AtomicU64>,
    commands: Arc<Mutex<HashMap<GuildId, usize>>>,
    command_failures: Arc<Mutex<VecDeque<ApiErrorKind>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            next_channel: Arc::new(AtomicU64::new(1000)),
            create_failures: Arc::default(),
            move_failures: Arc::default(),
            delete_failures: Arc::default(),
            delete_attempts: Arc::new(AtomicU64::new(0)),
            commands: Arc::default(),
            command_failures: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn deleted(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Delete { channel_id } => Some(channel_id),
                _ => None,
            })
            .collect()
    }

    pub fn delete_attempts(&self) -> u64 {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn fail_next_creates(&self, kind: ApiErrorKind, times: usize) {
        self.create_failures.lock().extend(std::iter::repeat_n(kind, times));
    }

    pub fn fail_next_moves(&self, kind: ApiErrorKind, times: usize) {
        self.move_failures.lock().extend(std::iter::repeat_n(kind, times));
    }

    pub fn fail_next_deletes(&self, kind: ApiErrorKind, times: usize) {
        self.delete_failures.lock().extend(std::iter::repeat_n(kind, times));
    }

    /// Pretend `count` commands are registered in `guild_id`.
    pub fn register_commands(&self, guild_id: GuildId, count: usize) {
        self.commands.lock().insert(guild_id, count);
    }

    pub fn commands_in(&self, guild_id: GuildId) -> usize {
        self.commands.lock().get(&guild_id).copied().unwrap_or(0)
    }

    pub fn fail_next_command_deletes(&self, kind: ApiErrorKind, times: usize) {
        self.command_failures.lock().extend(std::iter::repeat_n(kind, times));
    }

    fn injected(queue: &Mutex<VecDeque<ApiErrorKind>>) -> Result<(), GatewayError> {
        match queue.lock().pop_front() {
            Some(kind) => Err(GatewayError::new(kind, "injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GatewayClient for RecordingGateway {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        category_id: Option<ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        Self::injected(&self.create_failures)?;
        self.calls.lock().push(GatewayCall::Create {
            guild_id,
            name: name.to_string(),
            category_id,
        });
        Ok(ChannelId::new(self.next_channel.fetch_add(1, Ordering::SeqCst)))
    }

    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), GatewayError> {
        Self::injected(&self.move_failures)?;
        self.calls.lock().push(GatewayCall::Move {
            guild_id,
            user_id,
            channel_id,
        });
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.delete_failures)?;
        self.calls.lock().push(GatewayCall::Delete { channel_id });
        Ok(())
    }

    async fn delete_guild_commands(&self, guild_id: GuildId) -> Result<usize, GatewayError> {
        Self::injected(&self.command_failures)?;
        self.calls.lock().push(GatewayCall::DeleteCommands { guild_id });
        Ok(self.commands.lock().remove(&guild_id).unwrap_or(0))
    }
}
