pub mod backoff;
pub mod classify;
pub mod client;
pub mod impl_fake;
pub mod impl_http;
pub mod interface;
pub mod outcome;
pub mod request;
