pub mod avalanche;
