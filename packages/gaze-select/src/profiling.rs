use std::time::{Duration, Instant};

/// Times a scope and warns when it overruns its budget
pub struct ProfileScope {
    label: &'static str,
    budget: Duration,
    start: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str, budget_secs: f64) -> Self {
        Self {
            label,
            budget: Duration::try_from_secs_f64(budget_secs.max(0.0)).unwrap_or(Duration::MAX),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if elapsed > self.budget {
            log::warn!(
                "[PROFILE] {} took {:.3}ms, budget {:.3}ms",
                self.label,
                elapsed.as_secs_f64() * 1000.0,
                self.budget.as_secs_f64() * 1000.0
            );
        } else {
            log::trace!("[PROFILE] {} - {:.3}ms", self.label, elapsed.as_secs_f64() * 1000.0);
        }
    }
}

/// Time the rest of the enclosing scope against a budget in seconds
#[macro_export]
macro_rules! profile_scope {
    ($label:expr, $budget:expr) => {
        let _profile_scope = $crate::profiling::ProfileScope::new($label, $budget);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_budget_is_clamped() {
        let scope = ProfileScope::new("tick", -1.0);
        assert_eq!(scope.budget, Duration::ZERO);
    }

    #[test]
    fn test_unrepresentable_budget_saturates() {
        let scope = ProfileScope::new("tick", 1e30);
        assert_eq!(scope.budget, Duration::MAX);
        let scope = ProfileScope::new("tick", f64::INFINITY);
        assert_eq!(scope.budget, Duration::MAX);
    }

    #[test]
    fn test_scope_measures_elapsed_time() {
        let scope = ProfileScope::new("test", 1.0);
        std::thread::sleep(Duration::from_millis(2));
        assert!(scope.elapsed() >= Duration::from_millis(2));
    }
}
