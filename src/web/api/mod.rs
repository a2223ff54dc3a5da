pub mod duty;
pub mod error;
pub mod events;
