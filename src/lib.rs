pub mod core;
pub mod llm;
pub mod matching;
pub mod ratelimit;
pub mod server;
pub mod state;
pub mod store;
