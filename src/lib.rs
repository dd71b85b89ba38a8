pub mod config;
pub mod device_camera;
pub mod device_display;
pub mod error;
pub mod library;
pub mod media;
pub mod pipeline;
pub mod render;
pub mod result_channel;
pub mod transfer;
