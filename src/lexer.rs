//! Lexical walker over the token stream the database recorded for a file.
//!
//! A [`Lexer`] is a cheap view; walking it never touches the tokens. Each
//! [`Lexeme`] knows its position and finds the next admitted token on
//! demand, so starting again from [`Lexer::first`] replays the same sequence.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{Entity, EntityId, EntityStore, Session, Token, TokenCategory};

/// Which token categories a walk includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerOptions {
    pub comments: bool,
    /// Whitespace and newline tokens.
    pub whitespace: bool,
    pub preprocessor: bool,
    /// Resolve token back-references to entities.
    pub entities: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            comments: true,
            whitespace: true,
            preprocessor: true,
            entities: true,
        }
    }
}

impl LexerOptions {
    pub fn admits(&self, category: TokenCategory) -> bool {
        match category {
            TokenCategory::Comment => self.comments,
            TokenCategory::Whitespace | TokenCategory::Newline => self.whitespace,
            TokenCategory::Preprocessor => self.preprocessor,
            _ => true,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Lexer<'s> {
    file: &'s Entity,
    tokens: &'s [Token],
    store: &'s EntityStore<'s>,
    options: LexerOptions,
}

impl<'s> Lexer<'s> {
    pub fn file(&self) -> &'s Entity {
        self.file
    }

    pub fn options(&self) -> LexerOptions {
        self.options
    }

    /// First admitted token, or `None` for an empty walk.
    pub fn first(&self) -> Option<Lexeme<'s>> {
        self.seek(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Lexeme<'s>> + 's {
        std::iter::successors(self.first(), Lexeme::next)
    }

    fn seek(&self, from: usize) -> Option<Lexeme<'s>> {
        let offset = self
            .tokens
            .get(from..)?
            .iter()
            .position(|t| self.options.admits(t.category))?;
        Some(Lexeme {
            lexer: *self,
            position: from + offset,
        })
    }
}

/// One token of a walk.
#[derive(Clone, Copy)]
pub struct Lexeme<'s> {
    lexer: Lexer<'s>,
    position: usize,
}

impl<'s> Lexeme<'s> {
    /// The following admitted token.
    pub fn next(&self) -> Option<Lexeme<'s>> {
        self.lexer.seek(self.position + 1)
    }

    pub fn token(&self) -> &'s Token {
        &self.lexer.tokens[self.position]
    }

    pub fn category(&self) -> TokenCategory {
        self.token().category
    }

    pub fn text(&self) -> &'s str {
        &self.token().text
    }

    pub fn line_begin(&self) -> u32 {
        self.token().line_begin
    }

    pub fn column_begin(&self) -> u32 {
        self.token().column_begin
    }

    pub fn line_end(&self) -> u32 {
        self.token().line_end
    }

    pub fn column_end(&self) -> u32 {
        self.token().column_end
    }

    /// Entity the token resolves to. Always `None` when entity resolution
    /// is switched off.
    pub fn entity(&self) -> Option<&'s Entity> {
        if !self.lexer.options.entities {
            return None;
        }
        self.token().entity.and_then(|id| self.lexer.store.get(id))
    }
}

impl std::fmt::Debug for Lexeme<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexeme")
            .field("position", &self.position)
            .field("token", self.token())
            .finish()
    }
}

impl<'db> Session<'db> {
    /// Walk the tokens of a file entity.
    pub fn lexer(&self, file: EntityId, options: LexerOptions) -> Result<Lexer<'_>> {
        self.ensure_open()?;
        let slot = self.slot_of(file)?;
        let entity = self.store.at(slot);
        if !entity.kind.has_word("file") {
            return Err(GraphError::invalid(format!(
                "{} ({}) is not a file",
                entity.longname, entity.kind
            )));
        }
        let tokens = self.database().lexemes(file).unwrap_or(&[]);
        debug!(file = %entity.longname, tokens = tokens.len(), "lexer opened");
        Ok(Lexer {
            file: entity,
            tokens,
            store: &self.store,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DatabaseBuilder, MemoryDatabase};

    fn foo_db() -> MemoryDatabase {
        let mut b = DatabaseBuilder::new("lex");
        let file = b.add(1, "Foo.java", "src/Foo.java", "File");
        let class = b.add(2, "Foo", "Foo", "Class");
        b.add(3, "Empty.java", "src/Empty.java", "File");
        b.link(file, "define", class, file, 1, 7);
        b.tokens(
            file,
            vec![
                Token::new(TokenCategory::Keyword, "class", 1, 1),
                Token::new(TokenCategory::Whitespace, " ", 1, 6),
                Token::new(TokenCategory::Identifier, "Foo", 1, 7).with_entity(class),
            ],
        );
        b.build().unwrap()
    }

    fn texts<'s>(lexer: &Lexer<'s>) -> Vec<&'s str> {
        lexer.iter().map(|l| l.text()).collect()
    }

    #[test]
    fn test_whitespace_excluded() {
        let db = foo_db();
        let session = Session::open(&db).unwrap();
        let options = LexerOptions {
            whitespace: false,
            ..LexerOptions::default()
        };
        let lexer = session.lexer(EntityId(1), options).unwrap();

        let first_walk: Vec<Token> = lexer.iter().map(|l| l.token().clone()).collect();
        let second_walk: Vec<Token> = lexer.iter().map(|l| l.token().clone()).collect();
        assert_eq!(first_walk.len(), 2);
        assert_eq!(first_walk, second_walk);
        assert_eq!(texts(&lexer), vec!["class", "Foo"]);
        assert_eq!(db.snapshot().lexemes[0].tokens.len(), 3);
    }

    #[test]
    fn test_linked_walk_and_entities() {
        let db = foo_db();
        let session = Session::open(&db).unwrap();
        let lexer = session.lexer(EntityId(1), LexerOptions::default()).unwrap();

        let first = lexer.first().unwrap();
        assert_eq!(first.category(), TokenCategory::Keyword);
        assert!(first.entity().is_none());
        let space = first.next().unwrap();
        assert_eq!(space.category(), TokenCategory::Whitespace);
        let name = space.next().unwrap();
        assert_eq!(name.entity().unwrap().name, "Foo");
        assert_eq!((name.line_begin(), name.column_begin()), (1, 7));
        assert_eq!((name.line_end(), name.column_end()), (1, 9));
        assert!(name.next().is_none());
        assert_eq!(texts(&lexer), vec!["class", " ", "Foo"]);

        let plain = session
            .lexer(
                EntityId(1),
                LexerOptions {
                    entities: false,
                    ..LexerOptions::default()
                },
            )
            .unwrap();
        assert!(plain.iter().all(|l| l.entity().is_none()));
    }

    #[test]
    fn test_empty_and_invalid_files() {
        let db = foo_db();
        let session = Session::open(&db).unwrap();
        let empty = session.lexer(EntityId(3), LexerOptions::default()).unwrap();
        assert!(empty.first().is_none());
        assert_eq!(empty.iter().count(), 0);

        assert!(matches!(
            session.lexer(EntityId(2), LexerOptions::default()),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(session.lexer(EntityId(9), LexerOptions::default()).is_err());
    }

    #[test]
    fn test_options_admit() {
        let options = LexerOptions {
            comments: false,
            whitespace: false,
            preprocessor: false,
            entities: true,
        };
        assert!(!options.admits(TokenCategory::Comment));
        assert!(!options.admits(TokenCategory::Newline));
        assert!(!options.admits(TokenCategory::Preprocessor));
        assert!(options.admits(TokenCategory::Identifier));
        assert!(LexerOptions::default().admits(TokenCategory::Comment));
    }
}
