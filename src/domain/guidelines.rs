//! Exercise guidelines per age group. Static reference table shown on the overview tab.

use crate::domain::AgeGroup;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseGuidelines {
    pub age_range: &'static str,
    pub aerobic: &'static str,
    pub strength_frequency: &'static str,
    pub balance_frequency: Option<&'static str>,
    pub activities: &'static [&'static str],
}

pub fn for_age_group(age_group: AgeGroup) -> ExerciseGuidelines {
    match age_group {
        AgeGroup::Kids => ExerciseGuidelines {
            age_range: "5-12 years",
            aerobic: "60 minutes of moderate-to-vigorous activity daily",
            strength_frequency: "3 days per week, through play",
            balance_frequency: None,
            activities: &["Dance parties", "Active games", "Sports basics", "Playground fun"],
        },
        AgeGroup::Youth => ExerciseGuidelines {
            age_range: "13-17 years",
            aerobic: "60 minutes of moderate-to-vigorous activity daily",
            strength_frequency: "3 days per week",
            balance_frequency: None,
            activities: &["Team sports", "Running", "Cycling", "Bodyweight training"],
        },
        AgeGroup::Adults => ExerciseGuidelines {
            age_range: "18-64 years",
            aerobic: "150-300 minutes of moderate activity per week",
            strength_frequency: "2 or more days per week",
            balance_frequency: None,
            activities: &["HIIT workouts", "Running clubs", "Strength training", "Yoga sessions"],
        },
        AgeGroup::Seniors => ExerciseGuidelines {
            age_range: "65+ years",
            aerobic: "150 minutes of moderate activity per week",
            strength_frequency: "2 or more days per week",
            balance_frequency: Some("3 or more days per week"),
            activities: &["Chair yoga", "Water aerobics", "Balance training", "Walking groups"],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_seniors_get_balance_guidance() {
        for group in AgeGroup::ALL {
            let g = for_age_group(group);
            assert_eq!(g.balance_frequency.is_some(), group == AgeGroup::Seniors);
            assert_eq!(g.activities.len(), 4);
        }
    }
}
