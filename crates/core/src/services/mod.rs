//! Moderation services.

pub mod moderation;
pub mod platform;
pub mod recovery;
pub mod retry;
pub mod reversal;

pub use moderation::{IssueInput, ModerationService};
pub use platform::PlatformActions;
pub use recovery::{RecoveryLoader, RecoveryReport};
pub use retry::RetryPolicy;
pub use reversal::{ReversalEngine, ReversalState};
