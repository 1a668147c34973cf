use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Who the user wants to see in discovery. Serialized as a plain string,
/// with "everyone" as the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GenderPreference {
    Everyone,
    Only(String),
}

impl From<String> for GenderPreference {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("everyone") {
            Self::Everyone
        } else {
            Self::Only(value)
        }
    }
}

impl From<GenderPreference> for String {
    fn from(value: GenderPreference) -> Self {
        match value {
            GenderPreference::Everyone => "everyone".to_string(),
            GenderPreference::Only(g) => g,
        }
    }
}

impl Default for GenderPreference {
    fn default() -> Self {
        Self::Everyone
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySettings {
    pub show_me: GenderPreference,
    pub age_range: [i32; 2],
    pub state_filter: Option<String>,
    pub city_filter: Option<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            show_me: GenderPreference::Everyone,
            age_range: [18, 99],
            state_filter: None,
            city_filter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub show_age: bool,
    pub show_location: bool,
    pub show_online: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_age: true,
            show_location: true,
            show_online: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub new_matches: bool,
    pub messages: bool,
    pub likes: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            new_matches: true,
            messages: true,
            likes: true,
        }
    }
}

/// Persisted per-user settings row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub discovery: DiscoverySettings,
    pub privacy: PrivacySettings,
    pub notifications: NotificationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn defaults_for(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            discovery: DiscoverySettings::default(),
            privacy: PrivacySettings::default(),
            notifications: NotificationSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Ephemeral per-session location override. Cleared on leaving discovery;
/// takes precedence over the persisted discovery settings while active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationOverride {
    pub state: Option<String>,
    pub city: Option<String>,
}

/// The active discovery filter, resolved from settings and any override.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilterCriteria {
    pub gender_preference: GenderPreference,
    #[validate(custom = "validate_age_range")]
    pub age_range: [i32; 2],
    pub state_filter: Option<String>,
    pub city_filter: Option<String>,
    pub interests: Vec<String>,
}

fn validate_age_range(range: &[i32; 2]) -> Result<(), ValidationError> {
    if range[0] < 18 {
        return Err(ValidationError::new("age_min_below_18"));
    }
    if range[0] > range[1] {
        return Err(ValidationError::new("age_range_inverted"));
    }
    Ok(())
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            gender_preference: GenderPreference::Everyone,
            age_range: [18, 99],
            state_filter: None,
            city_filter: None,
            interests: Vec::new(),
        }
    }
}

impl FilterCriteria {
    /// Resolve the active filter: persisted discovery settings first, then
    /// the session location override on top (override wins).
    pub fn resolve(
        settings: Option<&UserSettings>,
        location: Option<&LocationOverride>,
    ) -> Self {
        let mut criteria = match settings {
            Some(s) => Self {
                gender_preference: s.discovery.show_me.clone(),
                age_range: s.discovery.age_range,
                state_filter: s.discovery.state_filter.clone(),
                city_filter: s.discovery.city_filter.clone(),
                interests: Vec::new(),
            },
            None => Self::default(),
        };
        if let Some(loc) = location {
            if loc.state.is_some() {
                criteria.state_filter = loc.state.clone();
            }
            if loc.city.is_some() {
                criteria.city_filter = loc.city.clone();
            }
        }
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_preference_roundtrips_through_strings() {
        assert_eq!(
            GenderPreference::from("Everyone".to_string()),
            GenderPreference::Everyone
        );
        assert_eq!(
            GenderPreference::from("woman".to_string()),
            GenderPreference::Only("woman".to_string())
        );
        assert_eq!(String::from(GenderPreference::Everyone), "everyone");
    }

    #[test]
    fn location_override_beats_settings() {
        let mut settings = UserSettings::defaults_for(Uuid::new_v4());
        settings.discovery.state_filter = Some("Georgia".to_string());
        settings.discovery.city_filter = Some("Atlanta".to_string());

        let over = LocationOverride {
            state: Some("Florida".to_string()),
            city: None,
        };

        let criteria = FilterCriteria::resolve(Some(&settings), Some(&over));
        assert_eq!(criteria.state_filter.as_deref(), Some("Florida"));
        // Only the overridden dimension changes
        assert_eq!(criteria.city_filter.as_deref(), Some("Atlanta"));
    }

    #[test]
    fn resolve_without_settings_uses_defaults() {
        let criteria = FilterCriteria::resolve(None, None);
        assert_eq!(criteria.age_range, [18, 99]);
        assert_eq!(criteria.gender_preference, GenderPreference::Everyone);
        assert!(criteria.state_filter.is_none());
    }

    #[test]
    fn age_range_validation() {
        let mut criteria = FilterCriteria::default();
        assert!(criteria.validate().is_ok());

        criteria.age_range = [17, 30];
        assert!(criteria.validate().is_err());

        criteria.age_range = [40, 30];
        assert!(criteria.validate().is_err());
    }
}
