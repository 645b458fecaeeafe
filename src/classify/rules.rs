use super::category::Category;

/// Predicate over the lower-cased application name and window title.
#[derive(Debug)]
pub enum Matcher {
    /// Application name equals one of the entries.
    AppIs(&'static [&'static str]),
    /// Application name contains one of the entries.
    AppContains(&'static [&'static str]),
    /// Window title contains one of the entries.
    TitleContains(&'static [&'static str]),
    /// Application name contains one of `app` and the title one of `title`.
    AppAndTitle {
        app: &'static [&'static str],
        title: &'static [&'static str],
    },
    /// Any of the nested matchers.
    Any(&'static [Matcher]),
}

impl Matcher {
    pub fn matches(&self, app: &str, title: &str) -> bool {
        match self {
            Matcher::AppIs(names) => names.iter().any(|name| app == *name),
            Matcher::AppContains(needles) => contains_any(app, needles),
            Matcher::TitleContains(needles) => contains_any(title, needles),
            Matcher::AppAndTitle {
                app: app_needles,
                title: title_needles,
            } => contains_any(app, app_needles) && contains_any(title, title_needles),
            Matcher::Any(matchers) => matchers.iter().any(|m| m.matches(app, title)),
        }
    }
}

#[derive(Debug)]
pub struct Rule {
    pub matcher: Matcher,
    pub category: Category,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub const BROWSERS: &[&str] = &[
    "safari", "chrome", "arc", "firefox", "edge", "brave", "opera", "vivaldi",
];

const SOURCE_EXTENSIONS: &[&str] = &[
    ".go", ".py", ".js", ".ts", ".rs", ".cpp", ".c", ".java", ".rb", ".kt", ".swift", ".cs",
];

const RESEARCH_KEYWORDS: &[&str] = &[
    "arxiv",
    "qiita",
    "stackoverflow",
    "docs",
    "doc:",
    "documentation",
    "mdn",
];

const MEDIA_KEYWORDS: &[&str] = &[
    "youtube",
    "netflix",
    "twitch",
    "spotify",
    "music",
    "soundcloud",
];

/// Category rules in evaluation order. The first matching rule decides, so
/// editors come before the extension check, and both come before browsers.
pub const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::Any(&[
            Matcher::AppIs(&["mail"]),
            Matcher::AppContains(&["outlook"]),
            Matcher::TitleContains(&["gmail", "outlook", "yahoo mail"]),
        ]),
        category: Category::Email,
    },
    Rule {
        matcher: Matcher::Any(&[
            Matcher::AppContains(&["visual studio code", "intellij", "goland"]),
            Matcher::AppIs(&["xcode"]),
        ]),
        category: Category::Programming,
    },
    Rule {
        matcher: Matcher::TitleContains(SOURCE_EXTENSIONS),
        category: Category::Programming,
    },
    Rule {
        matcher: Matcher::AppContains(&["slack", "teams", "discord", "zoom", "meet"]),
        category: Category::Communication,
    },
    Rule {
        matcher: Matcher::AppAndTitle {
            app: BROWSERS,
            title: RESEARCH_KEYWORDS,
        },
        category: Category::Research,
    },
    Rule {
        matcher: Matcher::AppContains(BROWSERS),
        category: Category::Browsing,
    },
    Rule {
        matcher: Matcher::AppContains(&["word", "pages", "notion", "obsidian"]),
        category: Category::Documents,
    },
    Rule {
        matcher: Matcher::AppContains(&["excel", "numbers", "sheets"]),
        category: Category::Spreadsheets,
    },
    Rule {
        matcher: Matcher::AppContains(&["powerpoint", "keynote"]),
        category: Category::Presentations,
    },
    Rule {
        matcher: Matcher::AppContains(&["finder"]),
        category: Category::Files,
    },
    Rule {
        matcher: Matcher::TitleContains(MEDIA_KEYWORDS),
        category: Category::Media,
    },
];
