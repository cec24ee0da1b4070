#![forbid(unsafe_code)]

pub mod app_services;
pub mod builder_service;
pub mod demo;
pub mod error;
pub mod player_service;
pub mod progress_service;

pub use sdg_core::Clock;

pub use app_services::AppServices;
pub use builder_service::BuilderService;
pub use demo::{DEMO_DISPLAY_ID, seed_demo};
pub use error::{AppServicesError, BuilderServiceError, PlayerServiceError, ProgressServiceError};
pub use player_service::{PlaySession, PlayerService};
pub use progress_service::{GoalOverview, ModuleOverview, ProgressService};
