use std::{cell::RefCell, rc::Rc};

use crate::{
    motion::{AnimationDriver, CardBounds, CardHandle, Completion, PropertySet, Tween},
    rotation::RotationObserver,
    table::Layout,
    Tier,
};

/// A card currently in the render tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MountedCard {
    pub tier: String,
    pub price: String,
    pub currency: String,
    pub period: String,
    pub popular: bool,
    pub bounds: CardBounds,
    /// Last target values applied by the animation driver.
    pub properties: PropertySet,
}

/// Presentation layer stand-in. Keeps track of mounted cards, the layout
/// token and the mode name echoed in the page title.
#[derive(Debug)]
pub struct Stage {
    card_bounds: CardBounds,
    cards: Vec<MountedCard>,
    layout: Option<Layout>,
    mode_name: Option<String>,
    mode_history: Vec<String>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(CardBounds {
            width: 320.0,
            height: 520.0,
        })
    }
}

impl Stage {
    pub fn new(card_bounds: CardBounds) -> Self {
        Self {
            card_bounds,
            cards: Vec::new(),
            layout: None,
            mode_name: None,
            mode_history: Vec::new(),
        }
    }

    /// Replaces the mounted cards with `tiers`.
    pub fn mount(&mut self, tiers: &[&Tier], layout: &Layout) {
        self.cards = tiers
            .iter()
            .map(|tier| MountedCard {
                tier: tier.name.clone(),
                price: tier.price.clone(),
                currency: tier.currency.clone(),
                period: tier.period.clone(),
                popular: tier.popular,
                bounds: self.card_bounds,
                properties: PropertySet::new(),
            })
            .collect();
        self.layout = Some(layout.clone());
    }

    pub fn cards(&self) -> &[MountedCard] {
        &self.cards
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn mode_name(&self) -> Option<&str> {
        self.mode_name.as_deref()
    }

    pub fn mode_history(&self) -> &[String] {
        &self.mode_history
    }

    /// One-line summary of what is on screen.
    pub fn describe(&self) -> String {
        let layout = self.layout.as_ref().map(Layout::as_str).unwrap_or("-");
        let mode = self.mode_name.as_deref().unwrap_or("-");
        let cards: Vec<String> = self
            .cards
            .iter()
            .map(|card| {
                let star = if card.popular { "*" } else { "" };
                format!(
                    "{}{star} {} {}{}",
                    card.tier, card.price, card.currency, card.period
                )
            })
            .collect();
        format!("[{mode} | {layout}] {}", cards.join(", "))
    }

    fn apply(&mut self, targets: &[CardHandle], properties: &PropertySet) {
        for target in targets {
            if let Some(card) = self.cards.get_mut(target.0) {
                card.properties.merge(properties);
            }
        }
    }
}

/// Shared [`Stage`] that can serve as both the animation driver and the
/// rotation observer of one rotator.
///
/// Animations snap to their target values at once and report completion on
/// the timeline after the tween's full duration. Repeating tweens never
/// complete.
#[derive(Debug, Clone, Default)]
pub struct SharedStage {
    inner: Rc<RefCell<Stage>>,
}

impl SharedStage {
    pub fn new(stage: Stage) -> Self {
        Self {
            inner: Rc::new(RefCell::new(stage)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&Stage) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn describe(&self) -> String {
        self.inner.borrow().describe()
    }
}

impl AnimationDriver for SharedStage {
    fn animate(&mut self, targets: &[CardHandle], tween: &Tween, on_complete: Option<Completion>) {
        self.inner.borrow_mut().apply(targets, &tween.to);
        if let (Some(completion), Some(total_ms)) = (on_complete, tween.total_duration_ms(targets.len())) {
            completion.fire_after(total_ms);
        }
    }

    fn set_immediate(&mut self, targets: &[CardHandle], properties: &PropertySet) {
        self.inner.borrow_mut().apply(targets, properties);
    }

    fn bounds(&self, target: CardHandle) -> Option<CardBounds> {
        self.inner.borrow().cards.get(target.0).map(|card| card.bounds)
    }
}

impl RotationObserver for SharedStage {
    fn configuration_changed(&mut self, name: &str) {
        let mut stage = self.inner.borrow_mut();
        stage.mode_name = Some(name.to_string());
        stage.mode_history.push(name.to_string());
    }

    fn tiers_committed(&mut self, tiers: &[&Tier], layout: &Layout) {
        self.inner.borrow_mut().mount(tiers, layout);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{AppConfig, RotationTiming},
        motion::Property,
        rotation::{RotationPhase, RotationSignal, TierRotator},
        timeline::SchedulerHandle,
        TierList,
    };

    fn tiers() -> TierList {
        Arc::from(Tier::billing_demo())
    }

    #[test]
    fn mounts_cards_on_start_and_commit() {
        let scheduler: SchedulerHandle<RotationSignal> = SchedulerHandle::new();
        let stage = SharedStage::default();
        let mut rotator = TierRotator::builder(scheduler.clone(), stage.clone(), stage.clone())
            .start(tiers(), false)
            .unwrap();

        assert_eq!(stage.with(|s| s.cards().len()), 3);
        assert_eq!(stage.with(|s| s.mode_name().map(str::to_string)), None);
        assert_eq!(
            stage.with(|s| s.cards()[1].properties.get(Property::Opacity)),
            Some(1.0)
        );

        // Exit 400 + entry 800 + 150 stagger for the second card.
        scheduler.run_until(6_350, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.phase(), RotationPhase::Idle);
        assert_eq!(stage.with(|s| s.mode_name().map(str::to_string)), Some("Abstraction".to_string()));
        assert_eq!(stage.with(|s| s.layout().cloned()), Some(Layout::new("grid-cols-2")));
        assert_eq!(
            stage.describe(),
            "[Abstraction | grid-cols-2] Professional* 149 kr/month, Enterprise 299 kr/month"
        );
    }

    #[test]
    fn entry_completes_after_the_full_stagger() {
        let scheduler: SchedulerHandle<RotationSignal> = SchedulerHandle::new();
        let stage = SharedStage::default();
        let mut rotator = TierRotator::builder(scheduler.clone(), stage.clone(), stage.clone())
            .start(tiers(), false)
            .unwrap();

        scheduler.run_until(6_349, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.phase(), RotationPhase::Entering);
        scheduler.run_until(6_350, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.phase(), RotationPhase::Idle);
    }

    #[test]
    fn long_animations_drop_overlapping_ticks() {
        let scheduler: SchedulerHandle<RotationSignal> = SchedulerHandle::new();
        let stage = SharedStage::default();
        let timing = RotationTiming {
            wide_interval_ms: 5_000,
            exit_duration_ms: 4_000,
            entry_duration_ms: 3_000,
            entry_stagger_ms: 0,
            ..RotationTiming::default()
        };
        let mut rotator = TierRotator::builder(scheduler.clone(), stage.clone(), stage.clone())
            .timing(timing)
            .start(tiers(), false)
            .unwrap();

        // Tick at 5s commits at 9s and enters until 12s, so the 10s tick is
        // dropped and the 15s tick commits at 19s.
        scheduler.run_until(20_000, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.commits(), 2);
        assert_eq!(
            stage.with(|s| s.mode_history().to_vec()),
            ["Abstraction", "Web"]
        );
        assert_eq!(stage.with(|s| s.cards().len()), 1);
    }

    #[test]
    fn huge_configured_durations_do_not_overflow() {
        let config =
            AppConfig::from_json_str(r#"{"rotation": {"exit_duration_ms": 18446744073709551615}}"#)
                .unwrap();
        let scheduler: SchedulerHandle<RotationSignal> = SchedulerHandle::new();
        let stage = SharedStage::default();
        let mut rotator = TierRotator::builder(scheduler.clone(), stage.clone(), stage.clone())
            .timing(config.rotation)
            .start(tiers(), false)
            .unwrap();

        scheduler.run_until(6_000, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.phase(), RotationPhase::Exiting);
        assert_eq!(rotator.commits(), 0);

        // Later ticks are dropped while the exit never finishes.
        scheduler.run_until(60_000, |e| {
            rotator.dispatch(e.event);
        });
        assert_eq!(rotator.commits(), 0);
    }

    #[test]
    fn animating_unmounted_slots_is_a_no_op() {
        let mut stage = SharedStage::default();
        let all = Tier::billing_demo();
        let shown: Vec<&Tier> = all.iter().take(1).collect();
        stage.tiers_committed(&shown, &Layout::new("grid-cols-1"));

        let set = PropertySet::new().with(Property::Y, -8.0);
        stage.set_immediate(&[CardHandle(0), CardHandle(4)], &set);

        assert!(stage.bounds(CardHandle(4)).is_none());
        assert_eq!(stage.with(|s| s.cards()[0].properties.get(Property::Y)), Some(-8.0));
    }
}
