pub mod avatar;
pub mod config;
pub mod emotes;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod twitch;
