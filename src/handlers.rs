pub mod auth;
pub mod expenses;
pub mod leads;
pub mod schedule;
pub mod washers;
