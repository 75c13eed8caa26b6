pub mod auth;
pub mod expense_service;
pub mod lead_service;
pub mod schedule_service;
pub mod washer_service;
