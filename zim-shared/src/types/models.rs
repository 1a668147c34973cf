use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// --- Profile ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Profile {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(range(min = 18))]
    pub age: i32,
    #[validate(length(min = 1))]
    pub gender: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub bio: String,
    pub interests: Vec<String>,
    /// Ordered photo URIs, first is the primary photo.
    #[validate(length(min = 1))]
    pub photos: Vec<String>,
    pub show_age: bool,
    pub show_location: bool,
    pub show_online: bool,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// True only when every required field is filled in and at least one
    /// photo exists. Gates access to the discovery surface.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn primary_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }
}

// --- Candidate (privacy-decorated profile for discovery) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub profile: Profile,
    pub display_name: String,
    pub display_location: String,
    pub show_age: bool,
    pub show_location: bool,
    pub show_online: bool,
}

impl Candidate {
    /// Decorate a profile for discovery, honoring its privacy flags.
    /// Hidden fields never appear in the display strings, regardless of
    /// what the underlying row carries.
    pub fn masked(profile: Profile) -> Self {
        let display_name = if profile.show_age {
            format!("{} {}, {}", profile.first_name, profile.last_name, profile.age)
        } else {
            format!("{} {}", profile.first_name, profile.last_name)
        };
        let display_location = if profile.show_location {
            format!("{}, {}", profile.city, profile.state)
        } else {
            "Location hidden".to_string()
        };
        let (show_age, show_location, show_online) =
            (profile.show_age, profile.show_location, profile.show_online);
        Self {
            profile,
            display_name,
            display_location,
            show_age,
            show_location,
            show_online,
        }
    }

    /// Decorate a profile the viewer has already liked: full info is shown.
    pub fn unmasked(profile: Profile) -> Self {
        let display_name =
            format!("{} {}, {}", profile.first_name, profile.last_name, profile.age);
        let display_location = format!("{}, {}", profile.city, profile.state);
        Self {
            profile,
            display_name,
            display_location,
            show_age: true,
            show_location: true,
            show_online: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.profile.id
    }
}

// --- Like ---

/// A directed edge liker -> liked, at most one per ordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- Match ---

/// The symmetric relationship formed when both directed likes exist.
/// One record per pair, id-stable for the lifetime of the relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The counterpart of `viewer_id`, or None if the viewer is not a party.
    pub fn other_user(&self, viewer_id: Uuid) -> Option<Uuid> {
        if self.user1_id == viewer_id {
            Some(self.user2_id)
        } else if self.user2_id == viewer_id {
            Some(self.user1_id)
        } else {
            None
        }
    }

    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.user1_id == a && self.user2_id == b) || (self.user1_id == b && self.user2_id == a)
    }
}

// --- Message ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_unread_for(&self, reader_id: Uuid) -> bool {
        self.sender_id != reader_id && self.read_at.is_none()
    }
}

// --- Notification ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
