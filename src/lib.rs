pub mod banner;
pub mod config;
pub mod download;
pub mod mime;
pub mod params;
pub mod server;
pub mod validate;
