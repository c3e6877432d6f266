//! iconslim CLI library.

pub mod cli;
