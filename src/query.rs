//! Drive search predicates.
//!
//! A [`Query`] is kept structured until it reaches the wire so that in-memory stores can
//! evaluate it with [`Query::matches`] while [`DriveClient`](crate::DriveClient) renders the
//! `q` parameter with [`Query::render`].

use std::fmt;

use crate::store::RemoteEntry;

/// Largest page the files endpoint returns. Continuation tokens are not followed.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub name: Option<String>,
    pub parent: Option<String>,
    pub trashed: Option<bool>,
    pub mime_type: Option<String>,
}

impl Query {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Direct, untrashed children of `folder_id`.
    pub fn children_of(folder_id: impl Into<String>) -> Self {
        Self {
            parent: Some(folder_id.into()),
            trashed: Some(false),
            ..Self::default()
        }
    }

    pub fn in_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_parent(mut self, parent: Option<&str>) -> Self {
        self.parent = parent.map(str::to_string);
        self
    }

    pub fn with_trashed(mut self, trashed: bool) -> Self {
        self.trashed = Some(trashed);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn render(&self) -> String {
        let mut clauses = Vec::<String>::new();
        if let Some(name) = &self.name {
            clauses.push(format!("name = '{}'", escape_literal(name)));
        }
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", escape_literal(parent)));
        }
        if let Some(mime_type) = &self.mime_type {
            clauses.push(format!("mimeType = '{}'", escape_literal(mime_type)));
        }
        if let Some(trashed) = self.trashed {
            clauses.push(format!("trashed = {trashed}"));
        }
        clauses.join(" and ")
    }

    pub fn matches(&self, entry: &RemoteEntry) -> bool {
        if self.name.as_deref().is_some_and(|name| entry.name != name) {
            return false;
        }
        if let Some(parent) = &self.parent {
            if !entry.parents.iter().any(|p| p == parent) {
                return false;
            }
        }
        if self
            .mime_type
            .as_deref()
            .is_some_and(|mime| entry.mime_type.as_deref() != Some(mime))
        {
            return false;
        }
        self.trashed.is_none_or(|trashed| entry.trashed == trashed)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escapes a string literal for the Drive query grammar.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
