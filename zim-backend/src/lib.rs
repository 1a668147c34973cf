pub mod feed;
pub mod memory;
pub mod session;
pub mod store;

pub use feed::{ChangeFeed, FeedScope, FeedSubscription};
pub use memory::InMemoryBackend;
pub use session::{IdentitySession, SessionUser, StaticSession};
pub use store::{Backend, DiscoverQuery};
