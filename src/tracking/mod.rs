pub mod controller;
pub mod detector;
pub mod domain;
pub mod loop_worker;
pub mod reporter;
pub mod session;

pub use controller::TrackerController;
pub use detector::{ActiveSample, MediaId, MediaProbe, MediaSource, PlaybackDetector, ReadyState};
pub use domain::{normalize_domain, TrackedDomains};
pub use loop_worker::PageEvent;
pub use reporter::{FlushOutcome, FlushTrigger, ReportTransport, ReportingChannel, TransportError};
pub use session::Session;
