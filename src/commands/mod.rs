pub mod browse;
pub mod misc;
pub mod show;
pub mod token;

pub use browse::{browse, BrowseOptions};
pub use misc::generate_completions;
pub use show::show_repository;
pub use token::{set_token, token_status};
