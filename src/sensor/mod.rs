mod error;
mod simulated;
mod types;

use tokio::sync::mpsc;

pub use error::SensorError;
pub use simulated::{parse_origin, SimulatedSensor, TrackSettings};
pub use types::{LocationSample, SamplingPriority, SamplingRequest, SubscriptionRef};

/// Where a subscription delivers its fixes.
pub type SampleSink = mpsc::UnboundedSender<LocationSample>;

/// Positioning subsystem the controller samples from.
pub trait PositionSensor: Send + Sync {
    fn permission_granted(&self) -> bool;

    fn subscribe(
        &self,
        request: SamplingRequest,
        sink: SampleSink,
    ) -> Result<SubscriptionRef, SensorError>;

    /// Once this returns, no further fixes are sent for `subscription`.
    fn unsubscribe(&self, subscription: &SubscriptionRef);
}
