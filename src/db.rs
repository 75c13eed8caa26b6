pub mod counter_repo;
pub use counter_repo::CounterRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod lead_repo;
pub use lead_repo::{LeadFilter, LeadRepository};
pub mod user_repo;
pub use user_repo::UserRepository;
