use crate::domain::models::{
    AppEvent, GameCommand, MessageSeverity, PlayerId, RoundPhase, SessionSnapshot, StatusMessage,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::game_service;
use crate::infrastructure::logging::{init_logger, LoggingGuard};
use crate::presentation::components::Components;
use eframe::egui;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct ColorMatchApp {
    commands: mpsc::UnboundedSender<GameCommand>,
    events: mpsc::UnboundedReceiver<AppEvent>,

    snapshot: Option<SessionSnapshot>,
    status_message: Option<StatusMessage>,

    _logging_guard: Option<LoggingGuard>,
}

impl ColorMatchApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        crate::presentation::theme::configure_party_style(&cc.egui_ctx);

        let settings_service = SettingsService::new()?;
        let settings = settings_service.get().clone();

        let logging_guard = init_logger(&settings.log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

        tracing::info!("Starting Color Match Party");

        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        std::thread::Builder::new()
            .name("game-service".to_string())
            .spawn(move || {
                runtime.block_on(game_service::run_with_settings(settings, app_tx, cmd_rx));
            })?;

        Ok(Self {
            commands: cmd_tx,
            events: app_rx,
            snapshot: None,
            status_message: None,
            _logging_guard: logging_guard,
        })
    }

    fn send(&self, command: GameCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("Game service is not running");
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                AppEvent::Session(snapshot) => self.snapshot = Some(snapshot),
                AppEvent::LogMessage(msg) => self.status_message = Some(msg),
            }
        }
    }

    fn ui_round_panel(&self, ui: &mut egui::Ui, snapshot: &SessionSnapshot) {
        ui.horizontal(|ui| {
            ui.heading("Color Match Party");
            ui.add_space(20.0);

            if snapshot.phase == RoundPhase::Idle {
                if ui.button("Start game!").clicked() {
                    self.send(GameCommand::StartRound);
                }
                return;
            }

            if let Some(target) = &snapshot.target {
                ui.label("Target:");
                Components::swatch(ui, target, egui::vec2(64.0, 32.0));
            }
            ui.heading(format!("Time left: {}", snapshot.seconds_remaining));
        });
    }

    fn ui_players(&self, ui: &mut egui::Ui, snapshot: &SessionSnapshot) {
        let mut connect: Option<PlayerId> = None;

        ui.horizontal_wrapped(|ui| {
            for player in &snapshot.players {
                if Components::player_card(ui, player) {
                    connect = Some(player.id);
                }
            }
        });

        if let Some(id) = connect {
            self.send(GameCommand::Connect(id));
        }

        ui.add_space(10.0);
        if ui.button("+ Add player").clicked() {
            self.send(GameCommand::AddPlayer(format!(
                "Player {}",
                snapshot.players.len() + 1
            )));
        }
    }
}

impl eframe::App for ColorMatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        ctx.request_repaint_after(Duration::from_millis(50));

        let Some(snapshot) = self.snapshot.clone() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.spinner();
            });
            return;
        };

        egui::TopBottomPanel::top("round_panel").show(ctx, |ui| {
            ui.add_space(8.0);
            self.ui_round_panel(ui, &snapshot);
            ui.add_space(8.0);
        });

        if let Some(msg) = &self.status_message {
            let color = match msg.severity {
                MessageSeverity::Info => egui::Color32::GRAY,
                MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                MessageSeverity::Error => egui::Color32::RED,
            };
            egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
                ui.label(egui::RichText::new(&msg.message).color(color).strong());
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.ui_players(ui, &snapshot);
            });
        });
    }
}

impl Drop for ColorMatchApp {
    fn drop(&mut self) {
        let _ = self.commands.send(GameCommand::Shutdown);
    }
}
