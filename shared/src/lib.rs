pub mod schemas;
pub mod services;
pub mod utilities;
