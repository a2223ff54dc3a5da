mod error;
mod state;
mod store;

pub use state::DutyState;
#[cfg(test)]
pub use store::MemoryDutyStore;
pub use store::{DutyStore, FileDutyStore};
