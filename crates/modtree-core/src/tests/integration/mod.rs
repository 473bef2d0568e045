#![cfg(test)]

pub mod common;
pub mod ordering_tests;
pub mod rundown_tests;
pub mod scenario_tests;
pub mod symmetry_tests;
