pub mod app_state;
pub mod cache;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod round;
pub mod session;
