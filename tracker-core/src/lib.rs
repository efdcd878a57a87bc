pub mod config;
pub mod core;
pub mod decode;
pub mod sensor;
pub mod session;
pub mod sink;
