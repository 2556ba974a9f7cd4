pub mod prepayment;
pub mod schedule;
