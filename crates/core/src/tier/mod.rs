use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Immutable, shared tier list. Rotation only ever selects from it.
pub type TierList = Arc<[Tier]>;

/// One pricing plan as shown on a card. All fields are display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Display label and identity key.
    pub name: String,
    pub users: String,
    pub price: String,
    pub currency: String,
    pub period: String,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Tier {
    pub fn new(name: impl Into<String>, users: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: users.into(),
            price: price.into(),
            currency: "kr".to_string(),
            period: "/month".to_string(),
            popular: false,
            features: Vec::new(),
        }
    }

    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// The three plans shown on the billing landing page.
    pub fn billing_demo() -> Vec<Tier> {
        vec![
            Tier::new("Standard", "Up to 5 users", "49").with_features([
                "12 months historical data",
                "4 hr data refresh",
                "500+ third party integrations",
            ]),
            Tier::new("Professional", "Up to 25 users", "149")
                .popular()
                .with_features([
                    "24 months historical data",
                    "1 hr data refresh",
                    "1,000+ third party integrations",
                    "Simple reporting",
                ]),
            Tier::new("Enterprise", "Unlimited users", "299").with_features([
                "Unlimited historical data",
                "15 min data refresh",
                "2,000+ third party integrations",
                "Advanced reporting",
                "Priority support",
            ]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_tiers_mark_only_professional_as_popular() {
        let tiers = Tier::billing_demo();
        let popular: Vec<_> = tiers.iter().filter(|t| t.popular).map(|t| t.name.as_str()).collect();
        assert_eq!(popular, ["Professional"]);
        assert_eq!(tiers[2].features.len(), 5);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let json = r#"{"name":"Solo","users":"1 user","price":"9","currency":"kr","period":"/month"}"#;
        let tier: Tier = serde_json::from_str(json).unwrap();
        assert!(!tier.popular);
        assert!(tier.features.is_empty());
    }
}
