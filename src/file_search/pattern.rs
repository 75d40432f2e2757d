use serde::{Deserialize, Serialize};

/// Matching options, read from preferences before every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub fuzzy_matching: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            fuzzy_matching: true,
        }
    }
}

/// A name-match pattern plus the matching mode it must be used with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    pub pattern: String,
    pub case_sensitive: bool,
}

impl NamePattern {
    /// `find` predicate selecting the matching mode.
    pub fn flag(&self) -> &'static str {
        if self.case_sensitive {
            "-name"
        } else {
            "-iname"
        }
    }
}

/// Build the name pattern for `query`.
///
/// Case-insensitive queries are lower-cased; fuzzy queries are wrapped in `*`
/// so they match anywhere in the file name.
pub fn build_pattern(query: &str, options: SearchOptions) -> NamePattern {
    let folded = if options.case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };

    let pattern = if options.fuzzy_matching {
        format!("*{}*", folded)
    } else {
        folded
    };

    NamePattern {
        pattern,
        case_sensitive: options.case_sensitive,
    }
}
