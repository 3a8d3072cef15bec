//! Promotional carousel shown on the landing view. Fixed slides, circular navigation.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slide {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub audience: &'static str,
    pub activities: [&'static str; 4],
}

pub const SLIDES: [Slide; 4] = [
    Slide {
        title: "Kids' Fun Challenges",
        subtitle: "Playful fitness for growing minds and bodies",
        audience: "Ages 5-12",
        activities: ["Dance Parties", "Active Games", "Sports Basics", "Playground Fun"],
    },
    Slide {
        title: "Young Adult Power",
        subtitle: "High-energy challenges for busy lifestyles",
        audience: "Ages 18-35",
        activities: ["HIIT Workouts", "Running Clubs", "Strength Training", "Yoga Sessions"],
    },
    Slide {
        title: "Family Wellness Together",
        subtitle: "Bonding through shared fitness goals",
        audience: "All Family",
        activities: ["Family Walks", "Bike Rides", "Home Workouts", "Weekend Adventures"],
    },
    Slide {
        title: "Active Aging Excellence",
        subtitle: "Gentle, effective fitness for golden years",
        audience: "Ages 55+",
        activities: ["Chair Yoga", "Water Aerobics", "Balance Training", "Walking Groups"],
    },
];

/// Next slide index (wrapping around)
pub fn next(index: usize) -> usize {
    (select(index) + 1) % SLIDES.len()
}

/// Previous slide index (wrapping around)
pub fn prev(index: usize) -> usize {
    (select(index) + SLIDES.len() - 1) % SLIDES.len()
}

/// Direct selection; out-of-range indices wrap.
pub fn select(index: usize) -> usize {
    index % SLIDES.len()
}

pub fn slide(index: usize) -> &'static Slide {
    &SLIDES[select(index)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_both_directions() {
        assert_eq!(next(0), 1);
        assert_eq!(next(3), 0);
        assert_eq!(prev(0), 3);
        assert_eq!(prev(2), 1);
        assert_eq!(select(5), 1);
        assert_eq!(slide(4).title, "Kids' Fun Challenges");
    }

    #[test]
    fn out_of_range_index_is_normalized() {
        assert_eq!(next(usize::MAX), 0);
        assert_eq!(prev(usize::MAX), 2);
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let mut i = 2;
        for _ in 0..SLIDES.len() {
            i = next(i);
        }
        assert_eq!(i, 2);
        for _ in 0..SLIDES.len() {
            i = prev(i);
        }
        assert_eq!(i, 2);
    }
}
