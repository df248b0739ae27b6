//! Built-in topic catalog and demo account

use crate::{NewTopic, NewUser};

/// Name of the topic that is playable from the start
pub const FIRST_TOPIC: &str = "Counting Numbers 1-10";

fn topic(name: &str, description: &str, category: &str, order: u32, is_locked: bool) -> NewTopic {
    NewTopic {
        name: name.to_string(),
        description: description.to_string(),
        grade: 1,
        category: category.to_string(),
        order,
        island: category.to_string(),
        is_locked,
    }
}

/// Grade 1 catalog: five topics over four categories, only the first unlocked
pub fn default_topics() -> Vec<NewTopic> {
    vec![
        topic(
            FIRST_TOPIC,
            "Learn to count from 1 to 10 with fun animations and activities!",
            "Numbers",
            1,
            false,
        ),
        topic(
            "Numbers 11-20",
            "Discover numbers from 11 to 20 and how to count them.",
            "Numbers",
            2,
            true,
        ),
        topic(
            "Addition Within 10",
            "Learn how to add numbers together up to a sum of 10.",
            "Addition",
            1,
            true,
        ),
        topic(
            "Basic 2D Shapes",
            "Explore circles, triangles, squares, and rectangles.",
            "Shapes",
            1,
            true,
        ),
        topic(
            "Reading Clock Hours",
            "Learn to tell time to the hour on an analog clock.",
            "Time",
            1,
            true,
        ),
    ]
}

/// The demo learner created on an empty user table
pub fn demo_user() -> NewUser {
    NewUser::new(
        "sammy",
        "47e08e336559243f6d4c77f7c88a42887acdb53a6654e80f0e4fc50cc937e6d28f9121abb60540cc861bb3e711c0e3a3502e19ffb69266c9d13a73ebd41564b0.36e16e0bac780eefa985c82cd67176e2",
    )
    .with_display_name("Sammy Student")
    .with_grade(1)
}
