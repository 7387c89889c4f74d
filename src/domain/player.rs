use crate::domain::color::{color_from_motion, Rgb};
use crate::domain::models::{ConnectionStatus, MotionSample, PlayerId, PlayerStatus, PlayerView};

/// Result of an explicit points update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsChange {
    pub old: i64,
    pub new: i64,
}

impl PointsChange {
    pub fn is_increase(&self) -> bool {
        self.new > self.old
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    name: String,
    points: i64,
    current_color: Rgb,
    connection: ConnectionStatus,
    status: PlayerStatus,
    // Bumped on every temporary status so stale resets can be ignored
    status_seq: u64,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            points: 0,
            current_color: Rgb::BLACK,
            connection: ConnectionStatus::Disconnected,
            status: PlayerStatus::RegisterDevice,
            status_seq: 0,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn current_color(&self) -> Rgb {
        self.current_color
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// Only connected players can win a round.
    pub fn is_eligible(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    /// Overwrite the current color from a motion sample. Last write wins.
    pub fn apply_sample(&mut self, sample: &MotionSample) {
        self.current_color = color_from_motion(sample);
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.current_color = color;
    }

    pub fn set_connection(&mut self, connection: ConnectionStatus) {
        self.connection = connection;
        self.status = PlayerStatus::for_connection(connection);
        self.status_seq += 1;
    }

    /// Set the point total. The returned change must be passed on to the
    /// points notification hook by whoever owns the feedback channel.
    pub fn set_points(&mut self, points: i64) -> PointsChange {
        let change = PointsChange {
            old: self.points,
            new: points,
        };
        self.points = points;
        change
    }

    pub fn add_points(&mut self, delta: i64) -> PointsChange {
        self.set_points(self.points + delta)
    }

    /// Show the win/lose message for a points change and return the token
    /// that [`Player::reset_status`] expects.
    pub fn show_points_status(&mut self, change: PointsChange) -> u64 {
        self.status = if change.is_increase() {
            PlayerStatus::Congrats
        } else {
            PlayerStatus::Boo
        };
        self.status_seq += 1;
        self.status_seq
    }

    /// Revert a temporary status. Returns false when the token is stale.
    pub fn reset_status(&mut self, token: u64) -> bool {
        if token != self.status_seq {
            return false;
        }
        self.status = PlayerStatus::for_connection(self.connection);
        true
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            points: self.points,
            color: self.current_color,
            connection: self.connection,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_is_black_and_disconnected() {
        let p = Player::new(0, "Player 1");
        assert_eq!(p.current_color(), Rgb::BLACK);
        assert_eq!(p.points(), 0);
        assert_eq!(p.status(), PlayerStatus::RegisterDevice);
        assert!(!p.is_eligible());
    }

    #[test]
    fn points_have_no_floor() {
        let mut p = Player::new(0, "p");
        p.add_points(-1);
        let change = p.add_points(-1);
        assert_eq!(change, PointsChange { old: -1, new: -2 });
        assert!(!change.is_increase());
    }

    #[test]
    fn status_reset_ignores_stale_tokens() {
        let mut p = Player::new(0, "p");
        p.set_connection(ConnectionStatus::Connected);

        let first = p.show_points_status(PointsChange { old: 0, new: 1 });
        assert_eq!(p.status(), PlayerStatus::Congrats);
        let second = p.show_points_status(PointsChange { old: 1, new: 0 });
        assert_eq!(p.status(), PlayerStatus::Boo);

        assert!(!p.reset_status(first));
        assert_eq!(p.status(), PlayerStatus::Boo);
        assert!(p.reset_status(second));
        assert_eq!(p.status(), PlayerStatus::Connected);
    }

    #[test]
    fn sample_overwrites_color() {
        let mut p = Player::new(0, "p");
        p.apply_sample(&MotionSample::new(10.0, 10.0, -10.0));
        assert_eq!(p.current_color(), Rgb::new(255.0, 255.0, 0.0));
    }
}
