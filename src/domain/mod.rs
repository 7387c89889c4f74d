pub mod color;
pub mod models;
pub mod player;
pub mod session;
pub mod settings;
