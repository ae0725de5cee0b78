//! Client contexts and their registry

mod connector;
mod context;
mod registry;

pub use connector::{Connector, RestConnector};
pub use context::App;
pub use registry::{AppError, AppRegistry, Result, DEFAULT_APP_NAME, SECONDARY_APP_NAME};
