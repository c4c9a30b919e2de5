//! Core moderation logic for warden.
//!
//! - **Platform**: the [`PlatformActions`] seam used to undo restrictions
//! - **Retry**: jittered exponential backoff via [`RetryPolicy`]
//! - **Reversal**: per-incident timers via [`ReversalEngine`]
//! - **Recovery**: startup re-arming via [`RecoveryLoader`]
//! - **Moderation**: the [`ModerationService`] facade

pub mod services;

pub use services::*;
