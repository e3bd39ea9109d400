pub mod alerts;
pub mod calculator;
pub mod estimator;
pub mod health;
pub mod recovery;

pub use alerts::OverlayAlert;
pub use calculator::ManualUsage;
pub use estimator::{grams, grams_for_label, rate_grams_per_hour};
pub use health::{health_percent, EcosystemStatus, HealthView, RECOVERY_BONUS};
pub use recovery::{RecoverySession, RecoveryStatus};
