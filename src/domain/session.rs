//! Game session controller
//!
//! Owns the target color, the countdown and the player roster. Everything here
//! is synchronous; the game service drives [`GameSession::tick`] once per second.

use crate::domain::color::{colors_match, random_color, Rgb, DEFAULT_MATCH_THRESHOLD};
use crate::domain::models::{PlayerId, RoundPhase, SessionSnapshot};
use crate::domain::player::{Player, PointsChange};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub target: Rgb,
    pub duration_secs: u32,
    pub seconds_remaining: u32,
    pub status: RoundStatus,
}

impl Round {
    fn new(target: Rgb, duration_secs: u32) -> Self {
        Self {
            target,
            duration_secs,
            seconds_remaining: duration_secs,
            status: RoundStatus::Running,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub round: Round,
    pub winner: Option<PlayerId>,
    pub point_changes: Vec<(PlayerId, PointsChange)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No round has been started yet.
    Idle,
    Running { seconds_remaining: u32 },
    /// The round ended and the next one is already running.
    Finished(RoundResult),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub round_duration_secs: u32,
    pub match_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 30,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

pub struct GameSession {
    config: SessionConfig,
    round: Option<Round>,
    players: Vec<Player>,
    last_winner: Option<Option<PlayerId>>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            round: None,
            players: Vec::new(),
            last_winner: None,
        }
    }

    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = self.players.len();
        self.players.push(Player::new(id, name));
        id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn phase(&self) -> RoundPhase {
        match self.round.as_ref().map(|r| r.status) {
            None => RoundPhase::Idle,
            Some(RoundStatus::Running) => RoundPhase::Running,
            Some(RoundStatus::Finished) => RoundPhase::Finished,
        }
    }

    /// Start a new round with a random target, replacing any running round.
    pub fn start(&mut self) -> &Round {
        self.start_with_target(random_color())
    }

    pub fn start_with_target(&mut self, target: Rgb) -> &Round {
        info!(
            "New round: target {} for {}s",
            target, self.config.round_duration_secs
        );
        self.round.insert(Round::new(target, self.config.round_duration_secs))
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(round) = self.round.as_mut() else {
            return TickOutcome::Idle;
        };
        if round.status != RoundStatus::Running {
            return TickOutcome::Idle;
        }

        round.seconds_remaining = round.seconds_remaining.saturating_sub(1);
        let remaining = round.seconds_remaining;
        let target = round.target;

        if remaining == 0 {
            info!("Time is up, nobody matched {}", target);
            return TickOutcome::Finished(self.finish(None));
        }

        if let Some(winner) = self.find_winner(&target) {
            info!("Player {} matched {}", winner, target);
            return TickOutcome::Finished(self.finish(Some(winner)));
        }

        TickOutcome::Running {
            seconds_remaining: remaining,
        }
    }

    fn find_winner(&self, target: &Rgb) -> Option<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_eligible())
            .find(|p| {
                let matched = colors_match(target, &p.current_color(), self.config.match_threshold);
                debug!(
                    "Player {} color {} matches: {}",
                    p.id(),
                    p.current_color(),
                    matched
                );
                matched
            })
            .map(|p| p.id())
    }

    /// Close the running round, settle points and start the next one.
    fn finish(&mut self, winner: Option<PlayerId>) -> RoundResult {
        let mut round = match self.round.take() {
            Some(round) => round,
            None => Round::new(Rgb::BLACK, self.config.round_duration_secs),
        };
        round.status = RoundStatus::Finished;

        let point_changes = self
            .players
            .iter_mut()
            .map(|p| {
                let delta = if Some(p.id()) == winner { 1 } else { -1 };
                (p.id(), p.add_points(delta))
            })
            .collect();

        self.last_winner = Some(winner);
        self.start();

        RoundResult {
            round,
            winner,
            point_changes,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            target: self.round.as_ref().map(|r| r.target),
            seconds_remaining: self.round.as_ref().map_or(0, |r| r.seconds_remaining),
            players: self.players.iter().map(Player::view).collect(),
            last_winner: self.last_winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ConnectionStatus;

    const TARGET: Rgb = Rgb::new(100.0, 150.0, 200.0);

    fn session_with_players(duration: u32) -> (GameSession, PlayerId, PlayerId) {
        let mut session = GameSession::new(SessionConfig {
            round_duration_secs: duration,
            match_threshold: 20.0,
        });
        let p1 = session.add_player("P1");
        let p2 = session.add_player("P2");
        for id in [p1, p2] {
            session
                .player_mut(id)
                .unwrap()
                .set_connection(ConnectionStatus::Connected);
        }
        (session, p1, p2)
    }

    #[test]
    fn idle_until_started() {
        let (mut session, _, _) = session_with_players(10);
        assert_eq!(session.phase(), RoundPhase::Idle);
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert!(session.players().iter().all(|p| p.points() == 0));
    }

    #[test]
    fn matching_player_wins_on_first_tick() {
        let (mut session, p1, p2) = session_with_players(10);
        session.start_with_target(TARGET);
        session.player_mut(p1).unwrap().set_color(Rgb::new(0.0, 0.0, 0.0));
        session.player_mut(p2).unwrap().set_color(Rgb::new(110.0, 140.0, 205.0));

        let TickOutcome::Finished(result) = session.tick() else {
            panic!("round should have finished");
        };
        assert_eq!(result.winner, Some(p2));
        assert_eq!(result.round.status, RoundStatus::Finished);
        assert_eq!(result.round.seconds_remaining, 9);
        assert_eq!(session.player(p1).unwrap().points(), -1);
        assert_eq!(session.player(p2).unwrap().points(), 1);
        assert_eq!(
            result.point_changes,
            vec![
                (p1, PointsChange { old: 0, new: -1 }),
                (p2, PointsChange { old: 0, new: 1 }),
            ]
        );
    }

    #[test]
    fn timeout_penalises_everyone() {
        let (mut session, p1, p2) = session_with_players(3);
        session.start_with_target(TARGET);

        assert_eq!(
            session.tick(),
            TickOutcome::Running {
                seconds_remaining: 2
            }
        );
        assert_eq!(
            session.tick(),
            TickOutcome::Running {
                seconds_remaining: 1
            }
        );
        let TickOutcome::Finished(result) = session.tick() else {
            panic!("round should have timed out");
        };
        assert_eq!(result.winner, None);
        assert_eq!(session.player(p1).unwrap().points(), -1);
        assert_eq!(session.player(p2).unwrap().points(), -1);
        assert_eq!(session.snapshot().last_winner, Some(None));
    }

    #[test]
    fn first_registered_player_wins_ties() {
        let (mut session, p1, p2) = session_with_players(10);
        session.start_with_target(TARGET);
        session.player_mut(p1).unwrap().set_color(TARGET);
        session.player_mut(p2).unwrap().set_color(TARGET);

        let TickOutcome::Finished(result) = session.tick() else {
            panic!("round should have finished");
        };
        assert_eq!(result.winner, Some(p1));
        assert_eq!(session.player(p2).unwrap().points(), -1);
    }

    #[test]
    fn disconnected_player_cannot_win() {
        let (mut session, p1, _) = session_with_players(10);
        session.start_with_target(TARGET);
        let player = session.player_mut(p1).unwrap();
        player.set_color(TARGET);
        player.set_connection(ConnectionStatus::Disconnected);

        assert_eq!(
            session.tick(),
            TickOutcome::Running {
                seconds_remaining: 9
            }
        );
    }

    #[test]
    fn next_round_starts_immediately() {
        let (mut session, _, p2) = session_with_players(10);
        session.start_with_target(TARGET);
        session.player_mut(p2).unwrap().set_color(TARGET);
        assert!(matches!(session.tick(), TickOutcome::Finished(_)));

        let round = session.round().unwrap();
        assert_eq!(session.phase(), RoundPhase::Running);
        assert_eq!(round.status, RoundStatus::Running);
        assert_eq!(round.seconds_remaining, 10);
        assert_eq!(round.duration_secs, 10);
    }

    #[test]
    fn restart_replaces_round_without_scoring() {
        let (mut session, p1, _) = session_with_players(10);
        session.start_with_target(TARGET);
        session.tick();
        session.start();
        assert_eq!(session.round().unwrap().seconds_remaining, 10);
        assert_eq!(session.player(p1).unwrap().points(), 0);
    }
}
