use num_traits::{AsPrimitive, Float};

/// Returns `n` evenly spaced values from `start` to `end`, inclusive.
///
/// The last value is exactly `end`.
pub fn linspace<T>(start: T, end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + 'static,
    usize: AsPrimitive<T>,
{
    let step = (end - start) / n.saturating_sub(1).max(1).as_();
    (0..n).map(move |i| {
        if i > 0 && i + 1 == n {
            end
        } else {
            start + i.as_() * step
        }
    })
}

#[cfg(test)]
mod tests {
    use super::linspace;

    #[test]
    fn test_linspace_endpoints() {
        let values: Vec<f64> = linspace(38.0, 38.1, 3).collect();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 38.0);
        assert_eq!(values[2], 38.1);
        approx::assert_relative_eq!(values[1], 38.05, epsilon = 1e-12);
    }

    #[test]
    fn test_linspace_single() {
        let values: Vec<f64> = linspace(1.0, 2.0, 1).collect();
        assert_eq!(values, vec![1.0]);
    }
}
