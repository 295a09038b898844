pub mod discretizer;
pub mod learn;
pub mod prelude;
pub mod q_table;
pub mod schedule;
