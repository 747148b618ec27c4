pub mod health;
pub mod search;
pub mod selection;
pub mod usage;
pub mod video;
