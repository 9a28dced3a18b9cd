/// Checks that a numerical value is in the provided interval `[a,b]`, returning early with an
/// [`Error::Configuration`](crate::Error::Configuration) naming the offending expression if not
///
/// ### Example
/// ```ignore
/// let alpha = 2.0;
/// ensure_interval!(alpha, 0.0, 1.0);
/// ```
/// This returns the error "Invalid configuration: `alpha` must be in the interval \[0, 1\], got 2"
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::Error::Configuration(format!(
                "`{}` must be in the interval [{}, {}], got {}",
                stringify!($var),
                $a,
                $b,
                $var,
            )));
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Error, Result};

    fn check(alpha: f32) -> Result<f32> {
        ensure_interval!(alpha, 0.0, 1.0);
        Ok(alpha)
    }

    #[test]
    fn ensure_interval_functional() {
        assert!(check(0.0).is_ok(), "lower bound is inclusive");
        assert!(check(1.0).is_ok(), "upper bound is inclusive");
        assert!(
            matches!(check(1.5), Err(Error::Configuration(msg)) if msg.contains("`alpha`")),
            "out of range value is rejected with the variable name"
        );
        assert!(check(f32::NAN).is_err(), "NaN is rejected");
    }
}
