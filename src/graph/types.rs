//! Core types for the entity/reference graph.
//!
//! Defines entity identifiers, kinds, the raw reference edges a database
//! stores, and the lexical tokens attached to file entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an entity. Identity is by id, never by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hierarchical, word-based classification used for entity kinds and
/// relation kinds alike.
///
/// `"Public Method"` is a more specific kind than `"Method"`: anything that
/// matches the word `method` matches both. Words are compared lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Kind {
    name: String,
    words: Vec<String>,
}

impl Kind {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let words = name
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        Self { name, words }
    }

    /// The display name as stored in the database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased words of the name.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True if `word` (already lowercased) is one of this kind's words.
    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// The least specific word: `"Abstract Class"` has category `class`.
    pub fn category(&self) -> &str {
        self.words.last().map(String::as_str).unwrap_or("")
    }

    /// Name of the relation seen from the other end of an edge.
    ///
    /// The suffix goes on the relation's verb word, so qualifiers keep their
    /// place: `Define` -> `Definein`, `Call Virtual` -> `Callby Virtual`,
    /// `Java Define` -> `Java Definein`. Containment verbs take `in`, every
    /// other verb takes `by`. A name with no known verb suffixes its last
    /// word.
    pub fn inverse(&self) -> Kind {
        let parts: Vec<&str> = self.name.split_whitespace().collect();
        let Some(last) = parts.len().checked_sub(1) else {
            return self.clone();
        };
        let verb = self
            .words
            .iter()
            .position(|w| RELATION_VERBS.contains(&w.as_str()))
            .unwrap_or(last);
        let suffix = match self.words[verb].as_str() {
            "define" | "declare" | "contain" => "in",
            _ => "by",
        };
        let name = parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i == verb {
                    format!("{part}{suffix}")
                } else {
                    (*part).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Kind::new(name)
    }
}

/// Relation verbs recognised when naming inverse relations. Other words of a
/// relation kind are qualifiers (`Java`, `Virtual`, `Implicit`, ...).
const RELATION_VERBS: &[&str] = &[
    "define", "declare", "contain", "call", "use", "set", "modify", "create", "extend",
    "implement", "include", "import", "typed", "throw", "catch", "override", "cast", "couple",
    "inherit", "init", "deref", "alias", "friend",
];

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Kind::new(name)
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Kind::new(name)
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.name
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named code construct stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Short name (e.g. "login", "UserService", "Main.java").
    pub name: String,
    /// Fully qualified name (e.g. "app.auth.UserService.login").
    pub longname: String,
    pub kind: Kind,
    /// Declared type annotations (return type, variable type), possibly empty.
    #[serde(default)]
    pub types: Vec<String>,
}

impl Entity {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        longname: impl Into<String>,
        kind: impl Into<Kind>,
    ) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
            longname: longname.into(),
            kind: kind.into(),
            types: Vec::new(),
        }
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Type annotations joined for display; empty when there are none.
    pub fn type_annotation(&self) -> String {
        self.types.join(" ")
    }
}

/// A directed, typed edge as stored by the database.
///
/// Databases store forward edges only; the reference index derives the
/// inverse view (`callby`, `definein`, ...) from the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub source: EntityId,
    pub target: EntityId,
    pub kind: Kind,
    /// File entity in which the relation occurs.
    pub file: EntityId,
    pub line: u32,
    pub column: u32,
}

impl Reference {
    pub fn new(
        source: EntityId,
        target: EntityId,
        kind: impl Into<Kind>,
        file: EntityId,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            source,
            target,
            kind: kind.into(),
            file,
            line,
            column,
        }
    }
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    Comment,
    Identifier,
    Keyword,
    Literal,
    Newline,
    Operator,
    Preprocessor,
    Punctuation,
    String,
    Whitespace,
    Other,
}

impl TokenCategory {
    /// Whitespace and line breaks; callers wanting "meaningful" tokens skip these.
    pub fn is_blank(&self) -> bool {
        matches!(self, TokenCategory::Whitespace | TokenCategory::Newline)
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenCategory::Comment => "Comment",
            TokenCategory::Identifier => "Identifier",
            TokenCategory::Keyword => "Keyword",
            TokenCategory::Literal => "Literal",
            TokenCategory::Newline => "Newline",
            TokenCategory::Operator => "Operator",
            TokenCategory::Preprocessor => "Preprocessor",
            TokenCategory::Punctuation => "Punctuation",
            TokenCategory::String => "String",
            TokenCategory::Whitespace => "Whitespace",
            TokenCategory::Other => "Other",
        };
        f.write_str(name)
    }
}

/// One lexical token of a file. Lines and columns are 1-based; the end
/// position points at the last character of the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub category: TokenCategory,
    pub text: String,
    pub line_begin: u32,
    pub column_begin: u32,
    pub line_end: u32,
    pub column_end: u32,
    /// Entity this token resolves to, if any.
    #[serde(default)]
    pub entity: Option<EntityId>,
}

impl Token {
    /// Build a token starting at `line:column`; the end position is derived
    /// from the text.
    pub fn new(category: TokenCategory, text: impl Into<String>, line: u32, column: u32) -> Self {
        let text = text.into();
        let mut end = (line, column);
        let mut pos = (line, column);
        for ch in text.chars() {
            end = pos;
            if ch == '\n' {
                pos = (pos.0 + 1, 1);
            } else {
                pos.1 += 1;
            }
        }
        Self {
            category,
            text,
            line_begin: line,
            column_begin: column,
            line_end: end.0,
            column_end: end.1,
            entity: None,
        }
    }

    pub fn with_entity(mut self, id: EntityId) -> Self {
        self.entity = Some(id);
        self
    }
}
