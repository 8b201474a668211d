pub mod client;
pub mod connector;
pub mod manager;
pub mod namespace;

pub use client::Client;
pub use connector::{Connector, PgConnector, PgSession, Session, DEFAULT_APPLICATION_NAME};
pub use manager::{Connection, ConnectionManager};
pub use namespace::{parse_namespace, read_namespace, NAMESPACE_QUERY};
