pub mod listings;
pub mod search;
