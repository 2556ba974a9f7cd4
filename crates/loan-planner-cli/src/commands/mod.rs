pub mod payment;
pub mod planning;
pub mod schedule;
