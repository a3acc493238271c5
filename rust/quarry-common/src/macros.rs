/// Fatal assertion for programming errors that cannot be reported through a `Result`
/// (e.g. a mutation that is already half-applied).
///
/// - If `cond` holds, the macro does nothing.
/// - Otherwise it panics with an `invariant violation: ...` message built from the
///   remaining arguments, stopping the offending operation immediately.
///
/// Recoverable preconditions should use [`verify_invariant!`](crate::verify_invariant)
/// instead.
#[macro_export]
macro_rules! assert_invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            panic!("invariant violation: {}", format_args!($($arg)+));
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_invariant_passes() {
        crate::assert_invariant!(1 + 1 == 2, "arithmetic is broken");
    }

    #[test]
    #[should_panic(expected = "invariant violation: transaction 7 belongs to another manager")]
    fn test_assert_invariant_panics() {
        let id = 7;
        crate::assert_invariant!(id == 0, "transaction {id} belongs to another manager");
    }
}
