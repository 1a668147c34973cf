pub mod event;
pub mod models;
pub mod settings;

pub use event::{ChangeEvent, ChangeKind, Row, Table};
pub use models::{Candidate, Like, Match, Message, Notification, Profile};
pub use settings::{
    DiscoverySettings, FilterCriteria, GenderPreference, LocationOverride, NotificationSettings,
    PrivacySettings, UserSettings,
};
