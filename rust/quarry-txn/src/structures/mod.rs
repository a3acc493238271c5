//! Transactional implementations of the basic index structures.

pub mod bitmap;
pub mod flag;
pub mod sorted_array;
