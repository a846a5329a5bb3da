use axum::Router;
use tracing::debug;

use crate::state::AppState;

/// A named group of routes mounted under a common URL prefix.
pub trait Controller {
    const NAME: &'static str;
    /// Empty to mount at the root.
    const PREFIX: &'static str;

    /// Routes relative to [`Self::PREFIX`].
    fn routes() -> Router<AppState>;

    fn router() -> Router<AppState> {
        debug!(controller = Self::NAME, prefix = Self::PREFIX, "registering routes");
        if Self::PREFIX.is_empty() {
            Self::routes()
        } else {
            Router::new().nest(Self::PREFIX, Self::routes())
        }
    }
}
