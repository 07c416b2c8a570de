macro_rules! impl_into_value {
    ($($t:ty), *) => {
        $(
            impl $crate::IntoValue for $t {
                fn into_value(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

/// Evaluates multiple measurements into a [CheckResult](crate::CheckResult). It's a bit like the
/// vec! macro.
/// ```rust
/// # #[macro_use]
/// # extern crate checkkit;
/// #
/// # use checkkit::{Measurement, ServiceState};
/// #
/// # fn main() {
/// let m1 = Measurement::new("test", 12);
/// let m2 = Measurement::new("other", 3.5);
/// let result = check_result![m1, m2];
/// assert_eq!(result.state(), ServiceState::Ok);
/// # }
/// ```
#[macro_export]
macro_rules! check_result {
    ($( $m:expr ), * $(,)?) => {
        $crate::CheckResult::evaluate(vec![$( $m ), *])
    };
}

#[cfg(test)]
mod tests {
    use crate::{Measurement, Range, ServiceState};

    #[test]
    fn test_check_result_macro() {
        let critical = Range::parse("10").unwrap();
        let m1 = Measurement::new("test", 12).with_critical(critical);
        let m2 = Measurement::new("other", 1);

        let result = check_result![m1.clone()];
        assert_eq!(result.state(), ServiceState::Critical);

        let result = check_result![m1, m2,];
        assert_eq!(result.measurements().len(), 2);

        let result = check_result![];
        assert_eq!(result.state(), ServiceState::Ok);
    }
}
