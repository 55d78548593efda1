use crate::models::{Issue, Urgency};

/// Sentinel filter value meaning "every issue".
pub const ALL_ISSUES: &str = "all";

pub const ISSUES: [Issue; 6] = [
    Issue {
        id: "1",
        title: "Rising housing prices & affordable housing crisis in Indian cities",
        description: "With home prices going up, many are pushed into expensive rentals affecting quality of life.",
        category: "Economics",
        urgency: Urgency::High,
        response_count: 1247,
        trending: true,
    },
    Issue {
        id: "2",
        title: "Should AI tools be allowed in college assignments?",
        description: "Universities are debating whether AI assistance should be permitted for academic work.",
        category: "Education",
        urgency: Urgency::Medium,
        response_count: 892,
        trending: true,
    },
    Issue {
        id: "3",
        title: "Public health: Dengue, malaria outbreaks after monsoons",
        description: "Vector-borne diseases are seeing increased cases after heavy rains and floods.",
        category: "Health",
        urgency: Urgency::High,
        response_count: 564,
        trending: true,
    },
    Issue {
        id: "4",
        title: "Campus security and mental health support systems",
        description: "Students are raising concerns about safety and mental health resources in universities.",
        category: "Education",
        urgency: Urgency::Medium,
        response_count: 423,
        trending: false,
    },
    Issue {
        id: "5",
        title: "Data privacy & regulation of AI technologies",
        description: "Questions about privacy, bias, and oversight in AI development and deployment.",
        category: "Technology",
        urgency: Urgency::Medium,
        response_count: 756,
        trending: true,
    },
    Issue {
        id: "6",
        title: "Environmental risks: heat waves and air pollution",
        description: "Extreme weather and environmental degradation affecting daily life and health.",
        category: "Environment",
        urgency: Urgency::High,
        response_count: 689,
        trending: false,
    },
];

pub fn all() -> &'static [Issue] {
    &ISSUES
}

pub fn find(issue_id: &str) -> Option<&'static Issue> {
    ISSUES.iter().find(|issue| issue.id == issue_id)
}

/// Human label for an issue filter: the issue title, or "All Issues".
pub fn scope_label(filter: Option<&str>) -> String {
    match filter {
        None | Some(ALL_ISSUES) => "All Issues".to_string(),
        Some(id) => find(id)
            .map(|issue| issue.title.to_string())
            .unwrap_or_else(|| format!("Issue {id}")),
    }
}
