pub mod auth;
pub mod expense;
pub mod lead;
pub mod schedule;
pub mod washer;
