pub mod analysis;
pub mod content;
pub mod customer;
pub mod email;
pub mod message;
pub mod money;
pub mod operations;
pub mod order;
pub mod suggestion;
pub mod supply;
pub mod task;
pub mod upgrade;
