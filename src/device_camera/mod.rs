pub mod capture_session;
pub mod impl_fake;
pub mod interface;
