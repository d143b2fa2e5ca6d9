// Public API - what other modules can use
pub use handlers::{get_room, health_check, ice_servers, list_rooms};
pub use service::RoomService;

// Internal modules
pub mod generators;
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
