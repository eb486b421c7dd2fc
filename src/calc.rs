use crate::model::Assessment;
use std::collections::HashMap;
use std::fmt;

pub const NOT_APPLICABLE: &str = "N/A";

/// Half-up 1-decimal rounding used for displayed percentages:
/// `floor(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Value(f64),
    NotApplicable,
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::Value(v) => write!(f, "{:.1}%", v),
            Percentage::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// `student / max * 100`, rounded to one decimal. A zero, negative or missing
/// maximum (or a missing score) has no meaningful percentage.
pub fn percentage(student_points: Option<f64>, max_points: Option<f64>) -> Percentage {
    let (Some(student), Some(max)) = (student_points, max_points) else {
        return Percentage::NotApplicable;
    };
    if !(max > 0.0) || !student.is_finite() {
        return Percentage::NotApplicable;
    }
    Percentage::Value(round_off_1_decimal(100.0 * student / max))
}

/// Formats a point value without a trailing `.0` for whole numbers.
pub fn format_points(v: Option<f64>) -> String {
    match v {
        None => NOT_APPLICABLE.to_string(),
        Some(v) if !v.is_finite() => NOT_APPLICABLE.to_string(),
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) => {
            let s = format!("{:.2}", v);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub assessments: Vec<&'a Assessment>,
}

/// Groups assessments by their free-text category. Categories keep the order
/// in which they were first seen and each group keeps the input order.
pub fn group_by_category(assessments: Option<&[Assessment]>) -> Vec<CategoryGroup<'_>> {
    let Some(assessments) = assessments else {
        return Vec::new();
    };

    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for a in assessments {
        let key = a.category.as_str();
        match index.get(key) {
            Some(&i) => groups[i].assessments.push(a),
            None => {
                index.insert(key, groups.len());
                groups.push(CategoryGroup {
                    category: key,
                    assessments: vec![a],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(id: &str, category: &str) -> Assessment {
        Assessment {
            id: id.to_string(),
            title: format!("Task {}", id),
            category: category.to_string(),
            student_points: Some(1.0),
            max_points: Some(1.0),
        }
    }

    #[test]
    fn round_off_is_half_up() {
        assert_eq!(round_off_1_decimal(0.0), 0.0);
        assert_eq!(round_off_1_decimal(3.54), 3.5);
        assert_eq!(round_off_1_decimal(3.55), 3.6);
        assert_eq!(round_off_1_decimal(66.6666), 66.7);
    }

    #[test]
    fn percentage_formats_one_decimal() {
        assert_eq!(percentage(Some(8.0), Some(10.0)).to_string(), "80.0%");
        assert_eq!(percentage(Some(5.0), Some(5.0)).to_string(), "100.0%");
        assert_eq!(percentage(Some(18.0), Some(20.0)).to_string(), "90.0%");
        assert_eq!(percentage(Some(2.0), Some(3.0)).to_string(), "66.7%");
    }

    #[test]
    fn percentage_with_zero_max_is_not_applicable() {
        let p = percentage(Some(8.0), Some(0.0));
        assert_eq!(p, Percentage::NotApplicable);
        assert_eq!(p.to_string(), "N/A");
        assert_eq!(percentage(None, Some(10.0)), Percentage::NotApplicable);
        assert_eq!(percentage(Some(3.0), None), Percentage::NotApplicable);
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let input = vec![
            assessment("1", "A"),
            assessment("2", "B"),
            assessment("3", "A"),
            assessment("4", "C"),
            assessment("5", "B"),
        ];
        let groups = group_by_category(Some(input.as_slice()));
        let keys: Vec<&str> = groups.iter().map(|g| g.category).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);

        let a_ids: Vec<&str> = groups[0].assessments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(a_ids, vec!["1", "3"]);
        let b_ids: Vec<&str> = groups[1].assessments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(b_ids, vec!["2", "5"]);
    }

    #[test]
    fn grouping_empty_or_absent_input() {
        assert!(group_by_category(Some(&[][..])).is_empty());
        assert!(group_by_category(None).is_empty());
    }

    #[test]
    fn format_points_drops_trailing_zeroes() {
        assert_eq!(format_points(Some(5.0)), "5");
        assert_eq!(format_points(Some(18.5)), "18.5");
        assert_eq!(format_points(Some(2.25)), "2.25");
        assert_eq!(format_points(None), "N/A");
    }

    #[test]
    fn format_points_keeps_large_whole_values() {
        assert_eq!(format_points(Some(1e20)), "100000000000000000000");
        assert_eq!(format_points(Some(-3.0)), "-3");
    }
}
