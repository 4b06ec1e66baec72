//! Timed rotation through the configuration table.
//!
//! A [`TierRotator`] owns a recurring timer on the shared timeline and moves
//! through `Idle -> Exiting -> Committing -> Entering -> Idle` on every tick.
//! The three triggers (tick, exit completion, entry completion) all arrive as
//! [`RotationSignal`]s on the same queue, so transitions never interleave.
//! The configuration index changes only between exit completion and entry
//! start.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, trace};

use crate::{
    config::{PointerConfig, RotationTiming},
    motion::{AnimationDriver, CardHandle, Completion, Easing, Property, PropertySet, Repeat, Tween},
    pointer::PointerHandler,
    table::{Configuration, ConfigurationTable, Layout},
    timeline::{SchedulerHandle, TimerGuard},
    viewport::ViewportClassifier,
    Result, ShowcaseError, Tier, TierList,
};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identifies one mount of a rotator. Signals addressed to an older mount
/// are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Tick,
    ExitComplete { generation: u64 },
    EntryComplete { generation: u64 },
}

/// Event delivered to a rotator through the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSignal {
    pub instance: InstanceId,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Idle,
    Exiting,
    Committing,
    Entering,
    Unmounted,
}

/// What a rotator did with a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Handled,
    /// A tick arrived while a rotation was still in flight. Ticks are not
    /// queued.
    DroppedTick,
    /// Wrong instance, wrong generation, wrong phase, or already unmounted.
    Stale,
}

/// Receives the outcome of each committed rotation.
pub trait RotationObserver {
    /// Called with the new mode name on every commit.
    fn configuration_changed(&mut self, name: &str);

    /// Called with the tiers to render, on mount and on every commit, before
    /// the entry animation starts.
    fn tiers_committed(&mut self, _tiers: &[&Tier], _layout: &Layout) {}
}

impl<F> RotationObserver for F
where
    F: FnMut(&str),
{
    fn configuration_changed(&mut self, name: &str) {
        self(name)
    }
}

pub struct RotatorBuilder<D, O> {
    scheduler: SchedulerHandle<RotationSignal>,
    driver: D,
    observer: O,
    table: ConfigurationTable,
    timing: RotationTiming,
    pointer: PointerConfig,
}

impl<D: AnimationDriver, O: RotationObserver> RotatorBuilder<D, O> {
    pub fn table(mut self, table: ConfigurationTable) -> Self {
        self.table = table;
        self
    }

    pub fn timing(mut self, timing: RotationTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn pointer(mut self, pointer: PointerConfig) -> Self {
        self.pointer = pointer;
        self
    }

    /// Mounts the rotator and schedules the recurring tick.
    ///
    /// Timing and table are checked before the timer is acquired, so a
    /// rejected configuration leaves nothing behind on the timeline.
    pub fn start(self, tiers: TierList, viewport_is_narrow: bool) -> Result<TierRotator<D, O>> {
        if tiers.is_empty() {
            return Err(ShowcaseError::EmptyTiers);
        }
        self.timing.validate()?;
        self.table.validate_against(&tiers)?;

        let instance = InstanceId::next();
        let interval_ms = self.timing.interval_ms(viewport_is_narrow);
        let timer = self.scheduler.every(
            interval_ms,
            RotationSignal {
                instance,
                kind: SignalKind::Tick,
            },
        );

        let mut rotator = TierRotator {
            instance,
            tiers,
            table: self.table,
            timing: self.timing,
            config_index: 0,
            phase: RotationPhase::Idle,
            generation: 0,
            commits: 0,
            scheduler: self.scheduler,
            timer: Some(timer),
            driver: self.driver,
            observer: self.observer,
            pointer: PointerHandler::new(self.pointer),
        };
        rotator.mount();

        debug!(
            instance = rotator.instance.0,
            interval_ms,
            viewport_is_narrow,
            mode = %rotator.current_configuration().name,
            "tier rotation started"
        );
        Ok(rotator)
    }

    pub fn start_with(
        self,
        tiers: TierList,
        viewport: impl ViewportClassifier,
    ) -> Result<TierRotator<D, O>> {
        self.start(tiers, viewport.is_narrow())
    }
}

/// Cycles the displayed tier subset on a fixed interval.
///
/// Dropping the rotator releases its timer, so teardown is guaranteed even if
/// [`TierRotator::stop`] is never reached.
pub struct TierRotator<D, O> {
    instance: InstanceId,
    tiers: TierList,
    table: ConfigurationTable,
    timing: RotationTiming,
    config_index: usize,
    phase: RotationPhase,
    generation: u64,
    commits: u64,
    scheduler: SchedulerHandle<RotationSignal>,
    timer: Option<TimerGuard<RotationSignal>>,
    driver: D,
    observer: O,
    pointer: PointerHandler,
}

impl<D: AnimationDriver, O: RotationObserver> TierRotator<D, O> {
    pub fn builder(
        scheduler: SchedulerHandle<RotationSignal>,
        driver: D,
        observer: O,
    ) -> RotatorBuilder<D, O> {
        RotatorBuilder {
            scheduler,
            driver,
            observer,
            table: ConfigurationTable::billing_demo(),
            timing: RotationTiming::default(),
            pointer: PointerConfig::default(),
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn config_index(&self) -> usize {
        self.config_index
    }

    /// Number of rotations committed since mount.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Interval of the recurring tick, or `None` once unmounted.
    pub fn interval_ms(&self) -> Option<u64> {
        self.timer.as_ref().map(TimerGuard::interval_ms)
    }

    pub fn current_configuration(&self) -> &Configuration {
        self.table.cyclic(self.config_index)
    }

    pub fn current_name(&self) -> &str {
        &self.current_configuration().name
    }

    /// Tiers currently on display, in configured order.
    pub fn display_tiers(&self) -> Vec<&Tier> {
        self.current_configuration().project(&self.tiers)
    }

    pub fn hovered(&self) -> Option<CardHandle> {
        self.pointer.hovered()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Routes a timeline signal to the matching transition.
    pub fn dispatch(&mut self, signal: RotationSignal) -> SignalOutcome {
        if signal.instance != self.instance || self.phase == RotationPhase::Unmounted {
            trace!(?signal, "ignoring signal for another or unmounted rotator");
            return SignalOutcome::Stale;
        }
        match signal.kind {
            SignalKind::Tick => self.on_tick(),
            SignalKind::ExitComplete { generation } => self.on_exit_complete(generation),
            SignalKind::EntryComplete { generation } => self.on_entry_complete(generation),
        }
    }

    /// Starts the exit animation for every card on display.
    pub fn on_tick(&mut self) -> SignalOutcome {
        match self.phase {
            RotationPhase::Idle => {}
            RotationPhase::Unmounted => return SignalOutcome::Stale,
            phase => {
                trace!(?phase, "rotation in flight, dropping tick");
                return SignalOutcome::DroppedTick;
            }
        }

        self.generation += 1;
        self.phase = RotationPhase::Exiting;
        debug!(generation = self.generation, "exiting current configuration");

        let handles = CardHandle::range(self.current_configuration().indices.len());
        let completion = self.completion(SignalKind::ExitComplete {
            generation: self.generation,
        });
        self.driver
            .animate(&handles, &exit_tween(&self.timing), Some(completion));
        SignalOutcome::Handled
    }

    /// Advances to the next configuration and starts the entry animation.
    pub fn on_exit_complete(&mut self, generation: u64) -> SignalOutcome {
        if self.phase != RotationPhase::Exiting || generation != self.generation {
            trace!(generation, phase = ?self.phase, "stale exit completion");
            return SignalOutcome::Stale;
        }

        self.phase = RotationPhase::Committing;
        self.config_index = self.table.next_index(self.config_index);
        self.commits += 1;
        self.pointer.reset();

        let configuration = self.table.cyclic(self.config_index);
        let shown = configuration.project(&self.tiers);
        self.observer.tiers_committed(&shown, &configuration.layout);
        self.observer.configuration_changed(&configuration.name);
        info!(
            mode = %configuration.name,
            index = self.config_index,
            cards = shown.len(),
            "rotation committed"
        );

        self.phase = RotationPhase::Entering;
        let handles = CardHandle::range(shown.len());
        let completion = self.completion(SignalKind::EntryComplete { generation });
        self.driver.set_immediate(&handles, &entry_from());
        self.driver
            .animate(&handles, &entry_tween(&self.timing), Some(completion));
        SignalOutcome::Handled
    }

    pub fn on_entry_complete(&mut self, generation: u64) -> SignalOutcome {
        if self.phase != RotationPhase::Entering || generation != self.generation {
            trace!(generation, phase = ?self.phase, "stale entry completion");
            return SignalOutcome::Stale;
        }
        self.phase = RotationPhase::Idle;
        self.float_popular();
        SignalOutcome::Handled
    }

    /// Cancels the timer. Anything still in flight is ignored from here on.
    pub fn stop(&mut self) -> Result<()> {
        if self.phase == RotationPhase::Unmounted {
            return Err(ShowcaseError::AlreadyUnmounted);
        }
        self.timer = None;
        self.phase = RotationPhase::Unmounted;
        debug!(instance = self.instance.0, commits = self.commits, "tier rotation stopped");
        Ok(())
    }

    pub fn on_hover_start(&mut self, card: usize) -> bool {
        if self.phase == RotationPhase::Unmounted {
            return false;
        }
        let shown = self.table.cyclic(self.config_index).project(&self.tiers);
        self.pointer.on_hover_start(&mut self.driver, &shown, card)
    }

    pub fn on_hover_end(&mut self, card: usize) -> bool {
        if self.phase == RotationPhase::Unmounted {
            return false;
        }
        let shown = self.table.cyclic(self.config_index).project(&self.tiers);
        self.pointer.on_hover_end(&mut self.driver, &shown, card)
    }

    pub fn on_pointer_move(&mut self, card: usize, local_x: f32, local_y: f32) -> bool {
        if self.phase == RotationPhase::Unmounted {
            return false;
        }
        let shown = self.table.cyclic(self.config_index).project(&self.tiers);
        self.pointer
            .on_pointer_move(&mut self.driver, &shown, card, local_x, local_y)
    }

    pub fn on_pointer_leave(&mut self, card: usize) -> bool {
        if self.phase == RotationPhase::Unmounted {
            return false;
        }
        let shown = self.table.cyclic(self.config_index).project(&self.tiers);
        self.pointer.on_pointer_leave(&mut self.driver, &shown, card)
    }

    /// Plays the card entrance again, e.g. when the host scrolls the section
    /// back into view. Only acts while idle; a rotation in flight already
    /// brings the cards in.
    pub fn reveal(&mut self) -> bool {
        if self.phase != RotationPhase::Idle {
            return false;
        }
        let handles = CardHandle::range(self.current_configuration().indices.len());
        self.driver.set_immediate(&handles, &entry_from());
        self.driver
            .animate(&handles, &entry_tween(&self.timing), None);
        self.float_popular();
        true
    }

    /// Reverses the entrance, e.g. when the host scrolls the section out of
    /// view. The rotation keeps running underneath.
    pub fn conceal(&mut self) -> bool {
        if self.phase != RotationPhase::Idle {
            return false;
        }
        let handles = CardHandle::range(self.current_configuration().indices.len());
        let tween = Tween::new(entry_from(), self.timing.entry_duration_ms, Easing::Power3Out);
        self.driver.animate(&handles, &tween, None);
        true
    }

    fn mount(&mut self) {
        let configuration = self.table.cyclic(self.config_index);
        let shown = configuration.project(&self.tiers);
        self.observer.tiers_committed(&shown, &configuration.layout);
        self.reveal();
    }

    fn float_popular(&mut self) {
        let shown = self.table.cyclic(self.config_index).project(&self.tiers);
        let popular: Vec<CardHandle> = shown
            .iter()
            .enumerate()
            .filter(|(_, tier)| tier.popular)
            .map(|(slot, _)| CardHandle(slot))
            .collect();
        if !popular.is_empty() {
            self.driver.animate(&popular, &float_tween(), None);
        }
    }

    fn completion(&self, kind: SignalKind) -> Completion {
        Completion::new(
            self.scheduler.downgrade(),
            RotationSignal {
                instance: self.instance,
                kind,
            },
        )
    }
}

impl<D, O> std::fmt::Debug for TierRotator<D, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierRotator")
            .field("instance", &self.instance)
            .field("phase", &self.phase)
            .field("config_index", &self.config_index)
            .field("commits", &self.commits)
            .finish()
    }
}

/// Pose cards start from before they enter.
pub fn entry_from() -> PropertySet {
    PropertySet::new()
        .with(Property::Opacity, 0.0)
        .with(Property::Y, 60.0)
        .with(Property::RotateX, -15.0)
        .with(Property::Scale, 0.9)
}

pub fn entry_tween(timing: &RotationTiming) -> Tween {
    let to = PropertySet::new()
        .with(Property::Opacity, 1.0)
        .with(Property::Y, 0.0)
        .with(Property::RotateX, 0.0)
        .with(Property::Scale, 1.0);
    Tween::new(to, timing.entry_duration_ms, Easing::Power3Out).stagger(timing.entry_stagger_ms)
}

pub fn exit_tween(timing: &RotationTiming) -> Tween {
    let to = PropertySet::new()
        .with(Property::Opacity, 0.0)
        .with(Property::Y, -30.0)
        .with(Property::Scale, 0.95);
    Tween::new(to, timing.exit_duration_ms, Easing::Power2In)
}

/// Gentle bob for popular cards while they are on display.
pub fn float_tween() -> Tween {
    Tween::new(PropertySet::new().with(Property::Y, -10.0), 2_000, Easing::SineInOut)
        .repeat(Repeat::ForeverYoyo)
}
