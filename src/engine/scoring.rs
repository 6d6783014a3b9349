pub const GRADE_FAIR_PERCENT: f64 = 60.0;
pub const GRADE_GOOD_PERCENT: f64 = 85.0;

/// Accuracy in percent; 0 when the category was never exercised.
pub fn percent(correct: u32, incorrect: u32) -> f64 {
    let total = correct + incorrect;
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Poor,
    Fair,
    Good,
}

impl Grade {
    pub fn from_percent(percent: f64) -> Self {
        if percent < GRADE_FAIR_PERCENT {
            Grade::Poor
        } else if percent < GRADE_GOOD_PERCENT {
            Grade::Fair
        } else {
            Grade::Good
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Poor => "needs work",
            Grade::Fair => "okay",
            Grade::Good => "good",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_unexercised_category_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
    }

    #[test]
    fn test_percent_ratio() {
        assert_eq!(percent(3, 1), 75.0);
        assert_eq!(percent(5, 0), 100.0);
        assert_eq!(percent(0, 4), 0.0);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_percent(59.9), Grade::Poor);
        assert_eq!(Grade::from_percent(60.0), Grade::Fair);
        assert_eq!(Grade::from_percent(84.9), Grade::Fair);
        assert_eq!(Grade::from_percent(85.0), Grade::Good);
    }
}
