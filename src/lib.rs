pub mod error;
pub mod field;
pub mod reducer;
pub mod rules;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;
