//! Keyword classifier mapping an `(application, title)` pair to a [`Category`].

mod category;
mod rules;

pub use category::Category;
pub use rules::{Matcher, Rule, BROWSERS, RULES};

/// Classify against the built-in rule table.
pub fn classify(app: &str, title: &str) -> Category {
    classify_with(RULES, app, title)
}

/// Classify against an explicit rule table. Matching is case-insensitive on
/// both inputs; [`Category::Other`] when nothing matches.
pub fn classify_with(rules: &[Rule], app: &str, title: &str) -> Category {
    let app = app.to_lowercase();
    let title = title.to_lowercase();

    rules
        .iter()
        .find(|rule| rule.matcher.matches(&app, &title))
        .map(|rule| rule.category)
        .unwrap_or_default()
}
