pub mod ask;
pub mod health;
pub mod index;
pub mod utils;
