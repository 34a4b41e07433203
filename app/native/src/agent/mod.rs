//! The running agent.
//!
//! - [`state`] - shared runtime configuration and change detection
//! - [`dispatch`] - side effects of a change
//! - [`poller`] - the fetch-detect-dispatch loop
//! - [`control`] / [`console`] - live operator control
//! - [`lifecycle`] - single instance, startup and restore on exit

pub mod console;
pub mod control;
pub mod dispatch;
pub mod lifecycle;
pub mod poller;
pub mod state;

pub use console::ConsoleSource;
pub use control::{ControlAction, ControlSource, Controller};
pub use dispatch::{DispatchReport, Dispatcher, Step, StepOutcome};
pub use lifecycle::{Agent, Exit, InstanceLock, LifecycleError, LockAttempt, RestoreGuard};
pub use poller::{AppliedWallpaper, Phase, PollOutcome, Poller};
pub use state::{Detection, PollingState, RuntimeConfig, Settings, detect};
