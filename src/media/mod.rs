pub mod media_buffer;
pub mod media_source;
pub mod raster;
pub mod validator;
