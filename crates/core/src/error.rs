/// Result alias that carries the custom [`ShowcaseError`] type.
pub type Result<T> = std::result::Result<T, ShowcaseError>;

/// Common error type for the core crate.
///
/// Only construction-time problems end up here. Races between rotation and
/// pointer input, or callbacks arriving after teardown, are silently dropped
/// by the components that observe them.
#[derive(Debug, thiserror::Error)]
pub enum ShowcaseError {
    /// Free-form message for conditions that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Catalog or configuration file could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the tier list must contain at least one tier")]
    EmptyTiers,
    #[error("the configuration table must contain at least one configuration")]
    EmptyTable,
    /// A configuration references a tier position that does not exist.
    #[error(
        "configuration `{configuration}` references tier index {index}, but only {tier_count} tiers exist"
    )]
    TierIndexOutOfRange {
        configuration: String,
        index: usize,
        tier_count: usize,
    },
    /// Tier names are identity keys and must be unique.
    #[error("tier `{0}` appears more than once")]
    DuplicateTier(String),
    /// A rotation interval of zero would tick continuously.
    #[error("`{0}` must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("the rotator has already been unmounted")]
    AlreadyUnmounted,
}

impl ShowcaseError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ShowcaseError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShowcaseError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
