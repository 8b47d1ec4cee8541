//! Aggregation queries
//!
//! Each operation takes the content store and asset builder explicitly,
//! issues one parameterized CMS read (or two concurrent ones) and
//! normalizes the result. CMS errors propagate unchanged; nothing retries.

pub mod episodes;
pub mod normalize;
pub mod pages;
pub mod shows;

pub use episodes::{all_episodes, episode_by_slug, episodes_by_show, list_episodes, recent_episodes};
pub use pages::{about_page, home_content, partners_page};
pub use shows::{all_shows, list_shows, show_by_id, show_by_slug};
