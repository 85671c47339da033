pub mod order;
pub mod party;
pub mod ports;
pub mod stock;
pub mod transaction;
