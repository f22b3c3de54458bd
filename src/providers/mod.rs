mod instagram;
mod traits;

pub use instagram::InstagramRefresher;
pub use traits::{RefreshedToken, TokenRefresher};
