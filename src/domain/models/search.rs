use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    PullRequest,
    Issue,
}

impl ItemKind {
    fn as_qualifier(self) -> &'static str {
        match self {
            Self::PullRequest => "pr",
            Self::Issue => "issue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    fn as_qualifier(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Search over issues and pull requests authored by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub author: String,
    pub kind: ItemKind,
    pub state: ItemState,
}

impl SearchQuery {
    pub fn new(author: &str, kind: ItemKind, state: ItemState) -> Self {
        Self {
            author: author.to_string(),
            kind,
            state,
        }
    }

    /// Query string understood by the search endpoint, e.g.
    /// `author:alice type:pr state:open`.
    pub fn predicate(&self) -> String {
        format!(
            "author:{} type:{} state:{}",
            self.author,
            self.kind.as_qualifier(),
            self.state.as_qualifier()
        )
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.predicate())
    }
}
