pub mod chutes;
pub mod profile;

pub use chutes::{CLEARANCE_COOKIE, ChutesClient};
pub use profile::BrowserProfile;
