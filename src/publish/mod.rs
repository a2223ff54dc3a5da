mod error;
mod publisher;
mod record;
mod remote;
mod telemetry;

#[cfg(test)]
pub use error::RemoteStoreError;
pub use publisher::{DrainHandle, SamplePublisher, WorkerBinding};
#[cfg(test)]
pub use record::RemoteLocationRecord;
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
pub use telemetry::PublishSnapshot;
