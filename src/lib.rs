//! Browse a GitHub organisation's repositories and merge live star-count
//! updates over the fetched list.

pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod github;
pub mod live;
pub mod logging;
pub mod state;
pub mod types;

pub use controller::{BrowserChange, BrowserController, BrowserEvent, LoadOutcome, Rejection};
pub use error::{FetchError, SubscriptionError};
pub use state::{BrowserState, RepositoryBrowserState};
pub use types::{Query, RepositoryDetail, RepositoryRef};
