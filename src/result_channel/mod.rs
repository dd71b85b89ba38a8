pub mod channel;
pub mod core;
