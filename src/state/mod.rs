pub mod blocks;
pub mod game;
pub mod group;
pub mod session;
pub mod state_machine;
pub mod timer;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    dto::ws::ServerMessage,
    error::ServiceError,
    services::websocket_service::send_message_to_websocket,
};

use self::{group::GroupGame, session::SessionStore, timer::TimerSlot};

pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    pub id: Uuid,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// The group game together with the timers driving it.
///
/// Every group operation holds the surrounding mutex for its whole duration, so the game has a
/// single writer at any time.
pub struct GroupLobby {
    pub game: GroupGame,
    pub countdown: TimerSlot,
    pub turn_timer: TimerSlot,
}

impl GroupLobby {
    fn new(config: &AppConfig) -> Self {
        Self {
            game: GroupGame::new(config.timings()),
            countdown: TimerSlot::default(),
            turn_timer: TimerSlot::default(),
        }
    }
}

/// Central application state storing persistent connections and database handles.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    connections: DashMap<Uuid, PlayerConnection>,
    solo_sessions: SessionStore,
    lobby: Mutex<GroupLobby>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            lobby: Mutex::new(GroupLobby::new(&config)),
            config,
            game_store: RwLock::new(None),
            connections: DashMap::new(),
            solo_sessions: SessionStore::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Registry of open player sockets keyed by connection id.
    pub fn connections(&self) -> &DashMap<Uuid, PlayerConnection> {
        &self.connections
    }

    /// Solo sessions keyed by player name.
    pub fn solo_sessions(&self) -> &SessionStore {
        &self.solo_sessions
    }

    /// The group game gate.
    pub fn lobby(&self) -> &Mutex<GroupLobby> {
        &self.lobby
    }

    /// Best-effort delivery to a single connection.
    pub fn send_to(&self, connection_id: Uuid, message: &ServerMessage) {
        let Some(tx) = self
            .connections
            .get(&connection_id)
            .map(|connection| connection.tx.clone())
        else {
            debug!(connection = %connection_id, "dropping message for unknown connection");
            return;
        };

        if send_message_to_websocket(&tx, message).is_err() {
            debug!(connection = %connection_id, "dropping message for closed connection");
        }
    }

    /// Deliver addressed messages in order.
    pub fn dispatch(&self, messages: Vec<(Uuid, ServerMessage)>) {
        for (connection_id, message) in messages {
            self.send_to(connection_id, &message);
        }
    }
}
