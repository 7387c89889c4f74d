//! Game Service
//!
//! Single task that owns the [`GameSession`]. User commands, link events and
//! the one-second countdown all funnel through [`GameService::run`], so the
//! session never needs a lock.

use crate::domain::models::{
    AppEvent, ConnectionStatus, GameCommand, MessageSeverity, PlayerId, StatusMessage,
};
use crate::domain::player::PointsChange;
use crate::domain::session::{GameSession, RoundResult, TickOutcome};
use crate::domain::settings::{GameSettings, Settings};
use crate::infrastructure::peripheral::protocol::ToneCommand;
use crate::infrastructure::peripheral::{
    spawn_link, LinkEvent, LinkHandle, Peripheral, SimulatedPeripheral,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct GameService<P: Peripheral> {
    session: GameSession,
    settings: GameSettings,
    peripheral: Arc<P>,
    tick_period: Duration,
    app_tx: mpsc::UnboundedSender<AppEvent>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    links: HashMap<PlayerId, LinkHandle>,
    reset_tx: mpsc::UnboundedSender<(PlayerId, u64)>,
    reset_rx: mpsc::UnboundedReceiver<(PlayerId, u64)>,
}

impl<P: Peripheral> GameService<P> {
    pub fn new(peripheral: P, settings: GameSettings, app_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        let mut session = GameSession::new(settings.session_config());
        for i in 0..settings.initial_players {
            session.add_player(format!("Player {}", i + 1));
        }

        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (reset_tx, reset_rx) = mpsc::unbounded_channel();

        Self {
            session,
            settings,
            peripheral: Arc::new(peripheral),
            tick_period: TICK_PERIOD,
            app_tx,
            link_tx,
            link_rx,
            links: HashMap::new(),
            reset_tx,
            reset_rx,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Process commands until [`GameCommand::Shutdown`] or the sender is dropped
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<GameCommand>) {
        let mut ticker = time::interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.publish();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(GameCommand::Shutdown) | None => break,
                    Some(GameCommand::StartRound) => {
                        self.session.start();
                        ticker.reset();
                    }
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.link_rx.recv() => self.handle_link_event(event),
                Some((player, token)) = self.reset_rx.recv() => {
                    if let Some(p) = self.session.player_mut(player) {
                        p.reset_status(token);
                    }
                }
                _ = ticker.tick() => self.on_tick(),
            }
            self.publish();
        }

        info!("Game service stopped");
    }

    fn handle_command(&mut self, command: GameCommand) {
        match command {
            GameCommand::Connect(id) => self.connect(id),
            GameCommand::AddPlayer(name) => {
                let id = self.session.add_player(name);
                info!("Registered player {}", id);
            }
            GameCommand::StartRound | GameCommand::Shutdown => {}
        }
    }

    fn connect(&mut self, id: PlayerId) {
        let Some(player) = self.session.player_mut(id) else {
            warn!("Connect requested for unknown player {}", id);
            return;
        };
        if player.connection() != ConnectionStatus::Disconnected {
            info!("Player {} is already {:?}", id, player.connection());
            return;
        }
        player.set_connection(ConnectionStatus::Connecting);

        let handle = spawn_link(self.peripheral.clone(), id, self.link_tx.clone());
        self.links.insert(id, handle);
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Sample { player, sample } => {
                if let Some(p) = self.session.player_mut(player) {
                    p.apply_sample(&sample);
                }
            }
            LinkEvent::Status { player, status } => {
                let Some(p) = self.session.player_mut(player) else {
                    return;
                };
                p.set_connection(status);
                let name = p.name().to_string();
                match status {
                    ConnectionStatus::Connected => {
                        self.log(format!("{} connected", name), MessageSeverity::Success)
                    }
                    ConnectionStatus::Disconnected => {
                        self.links.remove(&player);
                        self.log(format!("{} disconnected", name), MessageSeverity::Warning);
                    }
                    ConnectionStatus::Connecting => {}
                }
            }
            LinkEvent::Failed { player, error } => {
                self.links.remove(&player);
                if let Some(p) = self.session.player_mut(player) {
                    p.set_connection(ConnectionStatus::Disconnected);
                    let message = format!("{}: connection failed: {}", p.name(), error);
                    self.log(message, MessageSeverity::Error);
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if let TickOutcome::Finished(result) = self.session.tick() {
            self.settle(result);
        }
    }

    fn settle(&mut self, result: RoundResult) {
        let message = match result.winner.and_then(|id| self.session.player(id)) {
            Some(winner) => format!("{} matched {}!", winner.name(), result.round.target),
            None => format!("Nobody matched {}", result.round.target),
        };
        self.log(message, MessageSeverity::Info);

        for (id, change) in result.point_changes {
            self.notify_points_changed(id, change);
        }
    }

    /// Feedback for a player's points change: a tone on the peripheral when
    /// the player gained points, and a temporary status message either way.
    pub fn notify_points_changed(&mut self, id: PlayerId, change: PointsChange) {
        let Some(player) = self.session.player_mut(id) else {
            return;
        };

        if change.is_increase() && player.is_eligible() {
            if let Some(link) = self.links.get(&id) {
                if !link.send(win_tone(&self.settings).to_bytes().to_vec()) {
                    warn!("Player {}: link closed before the tone was sent", id);
                }
            }
        }

        let token = player.show_points_status(change);
        let reset_tx = self.reset_tx.clone();
        let delay = self.settings.status_reset();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = reset_tx.send((id, token));
        });
    }

    fn publish(&self) {
        let _ = self
            .app_tx
            .send(AppEvent::Session(self.session.snapshot()));
    }

    fn log(&self, message: String, severity: MessageSeverity) {
        info!("{}", message);
        let _ = self
            .app_tx
            .send(AppEvent::LogMessage(StatusMessage { message, severity }));
    }
}

fn win_tone(settings: &GameSettings) -> ToneCommand {
    ToneCommand {
        frequency_hz: settings.tone_frequency_hz,
        duration_ms: settings.tone_duration_ms,
        volume: settings.tone_volume,
    }
}

/// Run the game with the peripheral backend selected by `settings`
pub async fn run_with_settings(
    settings: Settings,
    app_tx: mpsc::UnboundedSender<AppEvent>,
    commands: mpsc::UnboundedReceiver<GameCommand>,
) {
    #[cfg(windows)]
    {
        use crate::infrastructure::peripheral::WinRtPeripheral;

        if !settings.ble.use_simulated_devices {
            match settings.ble.profile() {
                Ok(profile) => {
                    let peripheral =
                        WinRtPeripheral::new(profile, settings.ble.discovery_timeout());
                    GameService::new(peripheral, settings.game, app_tx)
                        .run(commands)
                        .await;
                    return;
                }
                Err(e) => {
                    tracing::error!("Bluetooth profile rejected, using simulated devices: {}", e);
                }
            }
        }
    }

    info!("Using simulated devices");
    let peripheral = SimulatedPeripheral::new(settings.simulation);
    GameService::new(peripheral, settings.game, app_tx)
        .run(commands)
        .await;
}
