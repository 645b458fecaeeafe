/// Kind of activity a foreground window represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Email,
    Programming,
    Communication,
    Research,
    Browsing,
    Documents,
    Spreadsheets,
    Presentations,
    Files,
    Media,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Email => "Email",
            Category::Programming => "Programming",
            Category::Communication => "Communication",
            Category::Research => "Research & documentation",
            Category::Browsing => "Web browsing",
            Category::Documents => "Document editing",
            Category::Spreadsheets => "Spreadsheets & data",
            Category::Presentations => "Presentations",
            Category::Files => "File management",
            Category::Media => "Media",
            Category::Other => "Other",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
