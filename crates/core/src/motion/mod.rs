//! Animation driver seam.
//!
//! The core never touches visual properties itself. It describes a target
//! state as a [`Tween`] and hands it to an [`AnimationDriver`], optionally
//! with a [`Completion`] that the driver fires once the transition is over.

use serde::{Deserialize, Serialize};

use crate::{rotation::RotationSignal, timeline::WeakScheduler};

/// Animatable card properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Opacity,
    X,
    Y,
    Scale,
    RotateX,
    RotateY,
    /// Drop shadow strength in `[0, 1]`.
    Shadow,
    /// Opacity of the glow layer behind the card.
    GlowOpacity,
}

/// Concrete value routed to a card property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub property: Property,
    pub value: f32,
}

/// Ordered set of property targets. Later entries win on duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    values: Vec<PropertyValue>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: Property, value: f32) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: Property, value: f32) {
        match self.values.iter_mut().find(|v| v.property == property) {
            Some(existing) => existing.value = value,
            None => self.values.push(PropertyValue { property, value }),
        }
    }

    pub fn get(&self, property: Property) -> Option<f32> {
        self.values
            .iter()
            .find(|v| v.property == property)
            .map(|v| v.value)
    }

    pub fn values(&self) -> &[PropertyValue] {
        &self.values
    }

    /// Overlays `other` on top of `self`.
    pub fn merge(&mut self, other: &PropertySet) {
        for value in &other.values {
            self.set(value.property, value.value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    #[serde(rename = "none")]
    Linear,
    #[serde(rename = "power2.in")]
    Power2In,
    #[serde(rename = "power2.out")]
    Power2Out,
    #[serde(rename = "power3.out")]
    Power3Out,
    #[serde(rename = "sine.inOut")]
    SineInOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Repeat {
    #[default]
    Once,
    /// Plays back and forth until overwritten. Never completes.
    ForeverYoyo,
}

/// "Animate these properties over this duration".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub to: PropertySet,
    pub duration_ms: u64,
    #[serde(default)]
    pub delay_ms: u64,
    /// Additional delay applied per target, in target order.
    #[serde(default)]
    pub stagger_ms: u64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub repeat: Repeat,
}

impl Tween {
    pub fn new(to: PropertySet, duration_ms: u64, easing: Easing) -> Self {
        Self {
            to,
            duration_ms,
            delay_ms: 0,
            stagger_ms: 0,
            easing,
            repeat: Repeat::Once,
        }
    }

    pub fn stagger(mut self, stagger_ms: u64) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Time until the last of `targets` settles. `None` for repeating tweens.
    pub fn total_duration_ms(&self, targets: usize) -> Option<u64> {
        match self.repeat {
            Repeat::Once => {
                let stagger = self
                    .stagger_ms
                    .saturating_mul(targets.saturating_sub(1) as u64);
                Some(
                    self.delay_ms
                        .saturating_add(self.duration_ms)
                        .saturating_add(stagger),
                )
            }
            Repeat::ForeverYoyo => None,
        }
    }
}

/// Position of a mounted card within the currently displayed subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardHandle(pub usize);

impl CardHandle {
    /// Handles for the first `count` card slots.
    pub fn range(count: usize) -> Vec<CardHandle> {
        (0..count).map(CardHandle).collect()
    }
}

/// Size of a mounted card, used for pointer tilt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardBounds {
    pub width: f32,
    pub height: f32,
}

/// One-shot completion callback handed to the driver.
///
/// Firing posts the wrapped signal onto the timeline rather than calling back
/// into the rotator directly, so a driver may fire from inside `animate`.
/// Firing after the timeline is gone does nothing.
#[derive(Debug, Clone)]
pub struct Completion {
    scheduler: WeakScheduler<RotationSignal>,
    signal: RotationSignal,
}

impl Completion {
    pub(crate) fn new(scheduler: WeakScheduler<RotationSignal>, signal: RotationSignal) -> Self {
        Self { scheduler, signal }
    }

    pub fn signal(&self) -> &RotationSignal {
        &self.signal
    }

    pub fn fire(self) {
        self.fire_after(0);
    }

    pub fn fire_after(self, delay_ms: u64) {
        self.scheduler.post_after(delay_ms, self.signal);
    }
}

/// Performs visual transitions on mounted cards.
///
/// Implementations must treat handles without a mounted card as a no-op, and
/// must still fire `on_complete` for such calls.
pub trait AnimationDriver {
    fn animate(&mut self, targets: &[CardHandle], tween: &Tween, on_complete: Option<Completion>);

    fn set_immediate(&mut self, targets: &[CardHandle], properties: &PropertySet);

    /// Geometry of a mounted card, or `None` if nothing is mounted there.
    fn bounds(&self, target: CardHandle) -> Option<CardBounds>;
}

/// A single call recorded by [`ImmediateDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Animate {
        targets: Vec<CardHandle>,
        tween: Tween,
        with_completion: bool,
    },
    SetImmediate {
        targets: Vec<CardHandle>,
        properties: PropertySet,
    },
}

/// Deterministic driver that completes every animation at once and keeps a
/// log of what it was asked to do.
#[derive(Debug, Clone)]
pub struct ImmediateDriver {
    pub mounted: usize,
    pub card_bounds: CardBounds,
    pub calls: Vec<DriverCall>,
    /// When false, completions are held in `held` instead of being fired.
    pub auto_complete: bool,
    pub held: Vec<Completion>,
}

impl ImmediateDriver {
    pub fn new(mounted: usize) -> Self {
        Self {
            mounted,
            card_bounds: CardBounds {
                width: 300.0,
                height: 400.0,
            },
            calls: Vec::new(),
            auto_complete: true,
            held: Vec::new(),
        }
    }

    /// Driver whose animations never finish on their own.
    pub fn holding(mounted: usize) -> Self {
        Self {
            auto_complete: false,
            ..Self::new(mounted)
        }
    }

    pub fn release_held(&mut self) {
        for completion in self.held.drain(..) {
            completion.fire();
        }
    }

    pub fn last_properties_for(&self, target: CardHandle) -> Option<&PropertySet> {
        self.calls.iter().rev().find_map(|call| match call {
            DriverCall::Animate { targets, tween, .. } if targets.contains(&target) => {
                Some(&tween.to)
            }
            DriverCall::SetImmediate {
                targets,
                properties,
            } if targets.contains(&target) => Some(properties),
            _ => None,
        })
    }
}

impl AnimationDriver for ImmediateDriver {
    fn animate(&mut self, targets: &[CardHandle], tween: &Tween, on_complete: Option<Completion>) {
        self.calls.push(DriverCall::Animate {
            targets: targets.to_vec(),
            tween: tween.clone(),
            with_completion: on_complete.is_some(),
        });
        if let Some(completion) = on_complete {
            if self.auto_complete {
                completion.fire();
            } else {
                self.held.push(completion);
            }
        }
    }

    fn set_immediate(&mut self, targets: &[CardHandle], properties: &PropertySet) {
        self.calls.push(DriverCall::SetImmediate {
            targets: targets.to_vec(),
            properties: properties.clone(),
        });
    }

    fn bounds(&self, target: CardHandle) -> Option<CardBounds> {
        (target.0 < self.mounted).then_some(self.card_bounds)
    }
}
