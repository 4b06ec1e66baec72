//! Core library for the billing showcase.
//!
//! The pricing card on the billing page rotates through a fixed table of
//! tier selections. This crate holds that rotation as an explicit state
//! machine ([`TierRotator`]) driven by a single-threaded timeline, plus the
//! pointer feedback that runs against whichever cards are on display.
//! Rendering and animation are injected through [`AnimationDriver`] and
//! [`RotationObserver`]; [`SharedStage`] is a headless implementation of
//! both.

pub mod catalog;
pub mod config;
pub mod error;
pub mod motion;
pub mod pointer;
pub mod rotation;
pub mod stage;
pub mod table;
pub mod tier;
pub mod timeline;
pub mod viewport;

pub use catalog::Catalog;
pub use config::{AppConfig, PointerConfig, RotationTiming, ViewportConfig};
pub use error::{Result, ShowcaseError};
pub use motion::{
    AnimationDriver, CardBounds, CardHandle, Completion, Easing, ImmediateDriver, Property,
    PropertySet, PropertyValue, Tween,
};
pub use pointer::PointerHandler;
pub use rotation::{
    RotationObserver, RotationPhase, RotationSignal, RotatorBuilder, SignalOutcome, TierRotator,
};
pub use stage::{MountedCard, SharedStage, Stage};
pub use table::{Configuration, ConfigurationTable, Layout};
pub use tier::{Tier, TierList};
pub use timeline::{PlaybackClock, ScheduledEvent, Scheduler, SchedulerHandle, TimerGuard};
pub use viewport::{FixedViewport, Viewport, ViewportClassifier};
