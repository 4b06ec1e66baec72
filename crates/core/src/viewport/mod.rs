use crate::config::ViewportConfig;

/// Reports whether the display is narrow. Read once when the rotator mounts.
pub trait ViewportClassifier {
    fn is_narrow(&self) -> bool;
}

/// Classifier with a fixed answer, handy for hosts that already evaluated
/// their media query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedViewport(pub bool);

impl ViewportClassifier for FixedViewport {
    fn is_narrow(&self) -> bool {
        self.0
    }
}

/// Width-based classifier: anything below the breakpoint is narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width_px: u32,
    pub breakpoint_px: u32,
}

impl Viewport {
    pub fn new(width_px: u32, config: &ViewportConfig) -> Self {
        Self {
            width_px,
            breakpoint_px: config.narrow_breakpoint_px,
        }
    }
}

impl ViewportClassifier for Viewport {
    fn is_narrow(&self) -> bool {
        self.width_px < self.breakpoint_px
    }
}

impl<T: ViewportClassifier + ?Sized> ViewportClassifier for &T {
    fn is_narrow(&self) -> bool {
        (**self).is_narrow()
    }
}
