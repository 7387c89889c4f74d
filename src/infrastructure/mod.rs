pub mod game_service;
pub mod logging;
pub mod peripheral;
