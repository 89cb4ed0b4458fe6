//! Screen-level state: which stage shows, the inbox, and the order screen.

pub mod inbox;
pub mod order;
pub mod stage;

pub use inbox::{InboxFilter, InboxView};
pub use order::{OrderChange, OrderScreen, DEFAULT_LOAD_IN_TIME};
pub use stage::{DemoStage, StageRouter, UnknownStage};
