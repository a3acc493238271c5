pub mod int_set;
#[cfg(test)]
mod tests;

pub use int_set::IntSet;
