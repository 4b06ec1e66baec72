use crate::{
    config::PointerConfig,
    motion::{AnimationDriver, CardBounds, CardHandle, Easing, Property, PropertySet, Tween},
    Tier,
};

const POPULAR_REST_SHADOW: f32 = 0.6;
const HOVER_SCALE_BOOST: f32 = 1.02;

/// Hover, tilt and glow feedback for the cards currently on display.
///
/// Hover emphasis (lift, shadow, glow) and tilt (rotateX/rotateY) are two
/// separate channels on the same card and never reset each other. Every
/// operation is a silent no-op if `card` has nothing mounted; pointer input
/// routinely races a rotation.
#[derive(Debug, Clone, Default)]
pub struct PointerHandler {
    config: PointerConfig,
    hovered: Option<CardHandle>,
}

impl PointerHandler {
    pub fn new(config: PointerConfig) -> Self {
        Self {
            config,
            hovered: None,
        }
    }

    /// Slot currently under the pointer, by position in the displayed subset.
    pub fn hovered(&self) -> Option<CardHandle> {
        self.hovered
    }

    /// Forgets hover state. Called whenever the displayed subset changes.
    pub fn reset(&mut self) {
        self.hovered = None;
    }

    pub fn on_hover_start<D: AnimationDriver>(
        &mut self,
        driver: &mut D,
        tiers: &[&Tier],
        card: usize,
    ) -> bool {
        let Some((handle, tier, _)) = mounted(driver, tiers, card) else {
            return false;
        };
        let tween = Tween::new(
            self.hover_pose(tier.popular),
            self.config.hover_duration_ms,
            Easing::Power2Out,
        );
        driver.animate(&[handle], &tween, None);
        self.hovered = Some(handle);
        true
    }

    /// Returns the card to its resting pose, which is lifted for popular
    /// tiers.
    pub fn on_hover_end<D: AnimationDriver>(
        &mut self,
        driver: &mut D,
        tiers: &[&Tier],
        card: usize,
    ) -> bool {
        let Some((handle, tier, _)) = mounted(driver, tiers, card) else {
            return false;
        };
        let tween = Tween::new(
            self.resting_pose(tier.popular),
            self.config.hover_duration_ms,
            Easing::Power2Out,
        );
        driver.animate(&[handle], &tween, None);
        if self.hovered == Some(handle) {
            self.hovered = None;
        }
        true
    }

    /// Tilts the card towards the pointer. `local_x`/`local_y` are relative
    /// to the card's top-left corner.
    pub fn on_pointer_move<D: AnimationDriver>(
        &self,
        driver: &mut D,
        tiers: &[&Tier],
        card: usize,
        local_x: f32,
        local_y: f32,
    ) -> bool {
        let Some((handle, _, bounds)) = mounted(driver, tiers, card) else {
            return false;
        };
        let tween = Tween::new(
            self.tilt(bounds, local_x, local_y),
            self.config.tilt_duration_ms,
            Easing::Power2Out,
        );
        driver.animate(&[handle], &tween, None);
        true
    }

    pub fn on_pointer_leave<D: AnimationDriver>(
        &self,
        driver: &mut D,
        tiers: &[&Tier],
        card: usize,
    ) -> bool {
        let Some((handle, _, _)) = mounted(driver, tiers, card) else {
            return false;
        };
        let tween = Tween::new(
            neutral_tilt(),
            self.config.tilt_duration_ms,
            Easing::Power2Out,
        );
        driver.animate(&[handle], &tween, None);
        true
    }

    pub fn resting_pose(&self, popular: bool) -> PropertySet {
        let pose = PropertySet::new().with(Property::GlowOpacity, 0.0);
        if popular {
            pose.with(Property::Y, self.config.popular_lift)
                .with(Property::Scale, self.config.popular_scale)
                .with(Property::Shadow, POPULAR_REST_SHADOW)
        } else {
            pose.with(Property::Y, 0.0)
                .with(Property::Scale, 1.0)
                .with(Property::Shadow, 0.0)
        }
    }

    pub fn hover_pose(&self, popular: bool) -> PropertySet {
        let rest = self.resting_pose(popular);
        let y = rest.get(Property::Y).unwrap_or(0.0) + self.config.hover_lift;
        let scale = rest.get(Property::Scale).unwrap_or(1.0) * HOVER_SCALE_BOOST;
        PropertySet::new()
            .with(Property::Y, y)
            .with(Property::Scale, scale)
            .with(Property::Shadow, 1.0)
            .with(Property::GlowOpacity, 1.0)
    }

    /// Rotation proportional to the pointer's offset from the card centre.
    pub fn tilt(&self, bounds: CardBounds, local_x: f32, local_y: f32) -> PropertySet {
        let divisor = if self.config.tilt_divisor > 0.0 {
            self.config.tilt_divisor
        } else {
            PointerConfig::default().tilt_divisor
        };
        let dx = local_x - bounds.width / 2.0;
        let dy = local_y - bounds.height / 2.0;
        PropertySet::new()
            .with(Property::RotateX, -dy / divisor)
            .with(Property::RotateY, dx / divisor)
    }
}

pub fn neutral_tilt() -> PropertySet {
    PropertySet::new()
        .with(Property::RotateX, 0.0)
        .with(Property::RotateY, 0.0)
}

fn mounted<'t, D: AnimationDriver>(
    driver: &D,
    tiers: &[&'t Tier],
    card: usize,
) -> Option<(CardHandle, &'t Tier, CardBounds)> {
    let tier = *tiers.get(card)?;
    let handle = CardHandle(card);
    let bounds = driver.bounds(handle)?;
    Some((handle, tier, bounds))
}
