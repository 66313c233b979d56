mod extractors;
mod routes;
mod state;
#[cfg(test)]
pub(crate) mod test_support;
pub mod v1;

pub use extractors::{AppJson, AuthUser};
pub use routes::create_router;
pub use state::AppState;
