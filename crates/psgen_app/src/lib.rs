//! PSGen app: wires the core state machine to the engine and drives a session.
pub mod config;
mod effects;
pub mod render;
mod session;

pub use config::{AppConfig, ConfigError, BASE_URL_ENV};
pub use effects::EffectRunner;
pub use render::Renderer;
pub use session::{Session, SessionError};
