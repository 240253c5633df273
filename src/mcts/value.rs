//! Node value strategies used during selection.

/// Scores a node from its own statistics and, for non-root nodes, the
/// parent's visit count. Higher is better.
pub trait ValueFunction: Send + Sync {
    fn value(&self, visits: u32, value_sum: f64, parent_visits: Option<u32>) -> f64;
}

impl<F> ValueFunction for F
where
    F: Fn(u32, f64, Option<u32>) -> f64 + Send + Sync,
{
    fn value(&self, visits: u32, value_sum: f64, parent_visits: Option<u32>) -> f64 {
        self(visits, value_sum, parent_visits)
    }
}

/// UCB1 applied to trees:
/// `mean + c * sqrt(ln(N_parent) / n)`. Unvisited nodes score `+inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uct {
    pub exploration: f64,
}

impl Uct {
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

impl Default for Uct {
    fn default() -> Self {
        Self::new(std::f64::consts::SQRT_2)
    }
}

impl ValueFunction for Uct {
    fn value(&self, visits: u32, value_sum: f64, parent_visits: Option<u32>) -> f64 {
        if visits == 0 {
            return f64::INFINITY;
        }
        let n = visits as f64;
        let mean = value_sum / n;
        match parent_visits {
            Some(parent) if parent > 0 => {
                mean + self.exploration * ((parent as f64).ln() / n).sqrt()
            }
            _ => mean,
        }
    }
}

/// Pure exploitation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanValue;

impl ValueFunction for MeanValue {
    fn value(&self, visits: u32, value_sum: f64, _parent_visits: Option<u32>) -> f64 {
        if visits == 0 {
            f64::INFINITY
        } else {
            value_sum / visits as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unvisited_node_is_tried_first() {
        assert_eq!(Uct::default().value(0, 0.0, Some(10)), f64::INFINITY);
        assert_eq!(MeanValue.value(0, 0.0, Some(10)), f64::INFINITY);
    }

    #[test]
    fn test_uct_monotonic_in_mean() {
        let uct = Uct::default();
        assert!(uct.value(4, 8.0, Some(20)) > uct.value(4, 4.0, Some(20)));
    }

    #[test]
    fn test_uct_exploration_decays_with_visits() {
        let uct = Uct::new(2.0);
        // same mean, more visits => smaller bonus
        let few = uct.value(2, 2.0, Some(50));
        let many = uct.value(20, 20.0, Some(50));
        assert!(few > many);
    }

    #[test]
    fn test_uct_root_has_no_bonus() {
        let uct = Uct::new(5.0);
        assert_eq!(uct.value(4, 2.0, None), 0.5);
    }

    #[test]
    fn test_closure_value_function() {
        let greedy_visits = |visits: u32, _: f64, _: Option<u32>| visits as f64;
        assert_eq!(greedy_visits.value(7, 0.0, None), 7.0);
    }
}
