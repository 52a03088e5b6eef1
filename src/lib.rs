pub mod features;
pub mod services;
