pub mod connection;
pub mod migrations;
pub mod stores;

pub use connection::{connect, connect_with_settings, DbPool};
pub use stores::{
    open_session_store, InMemorySessionStore, SessionStore, SessionStoreError, SlotSummary,
    SqlSessionStore,
};
