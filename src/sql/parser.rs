//! SQL Parser
//!
//! This module parses SQL tokens into an AST.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// SQL Parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance();
        }

        // Trailing tokens are a parse error, not silently dropped
        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: format!("{}", self.current()),
            });
        }

        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Create => self.parse_create_table().map(Statement::CreateTable),
            Token::Drop => self.parse_drop_table().map(Statement::DropTable),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Select => self.parse_select().map(Statement::Select),
            Token::Update => self.parse_update().map(Statement::Update),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            _ => Err(Error::UnexpectedToken {
                expected: "CREATE, DROP, INSERT, SELECT, UPDATE, or DELETE".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    // ========== CREATE TABLE / DROP TABLE ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Create)?;
        self.expect(&Token::Table)?;

        let table = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement { table, columns })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;

        let mut def = ColumnDef {
            name,
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
        };

        loop {
            match self.current() {
                Token::Primary => {
                    self.advance();
                    self.expect(&Token::Key)?;
                    def.primary_key = true;
                }
                Token::Unique => {
                    self.advance();
                    def.unique = true;
                }
                Token::Not => {
                    self.advance();
                    self.expect(&Token::Null)?;
                    def.not_null = true;
                }
                _ => break,
            }
        }

        Ok(def)
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let data_type = match self.current() {
            Token::Integer => DataType::Integer,
            Token::Text => DataType::Text,
            Token::Real => DataType::Real,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "INTEGER, TEXT, or REAL".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(data_type)
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect(&Token::Drop)?;
        self.expect(&Token::Table)?;
        let table = self.expect_identifier()?;
        Ok(DropTableStatement { table })
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table = self.expect_identifier()?;

        // Optional column list
        let columns = if self.check(&Token::LParen) {
            self.advance();
            let mut cols = Vec::new();
            loop {
                cols.push(self.expect_identifier()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance();
            }
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        Ok(InsertStatement {
            table,
            columns,
            values,
        })
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let projection = self.parse_projection()?;

        self.expect(&Token::From)?;
        let table = self.expect_identifier()?;

        let join = if self.check(&Token::Join) {
            Some(self.parse_join()?)
        } else {
            None
        };

        let predicate = self.parse_optional_where()?;

        Ok(SelectStatement {
            projection,
            table,
            join,
            predicate,
        })
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        if self.check(&Token::Asterisk) {
            self.advance();
            return Ok(Projection::All);
        }

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_ref()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(Projection::Columns(columns))
    }

    fn parse_join(&mut self) -> Result<JoinClause> {
        self.expect(&Token::Join)?;
        let table = self.expect_identifier()?;
        self.expect(&Token::On)?;

        let left = self.parse_column_ref()?;
        self.expect(&Token::Eq)?;
        let right = self.parse_column_ref()?;

        Ok(JoinClause { table, left, right })
    }

    // ========== UPDATE ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(&Token::Update)?;

        let table = self.expect_identifier()?;

        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let predicate = self.parse_optional_where()?;

        Ok(UpdateStatement {
            table,
            assignments,
            predicate,
        })
    }

    // ========== DELETE ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table = self.expect_identifier()?;
        let predicate = self.parse_optional_where()?;

        Ok(DeleteStatement { table, predicate })
    }

    // ========== Shared pieces ==========

    fn parse_optional_where(&mut self) -> Result<Option<Predicate>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();

        let column = self.parse_column_ref()?;
        let op = self.parse_compare_op()?;
        let value = self.parse_literal()?;

        Ok(Some(Predicate { column, op, value }))
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp> {
        let op = match self.current() {
            Token::Eq => CompareOp::Eq,
            Token::Neq => CompareOp::Neq,
            Token::Lt => CompareOp::Lt,
            Token::Gt => CompareOp::Gt,
            Token::Lte => CompareOp::Lte,
            Token::Gte => CompareOp::Gte,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "comparison operator".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;

        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            Ok(ColumnRef {
                table: Some(first),
                column,
            })
        } else {
            Ok(ColumnRef {
                table: None,
                column: first,
            })
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current().clone() {
            Token::IntegerLiteral(n) => Literal::Integer(n),
            Token::FloatLiteral(n) => Literal::Float(n),
            Token::StringLiteral(s) => Literal::String(s),
            Token::Null => Literal::Null,
            Token::Eof => return Err(Error::UnexpectedEof("literal value".to_string())),
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "literal value".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(literal)
    }

    // ========== Token helpers ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(Error::UnexpectedEof(format!("{}", token)))
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{}", token),
                found: format!("{}", self.current()),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            Token::Eof => Err(Error::UnexpectedEof("identifier".to_string())),
            other => Err(Error::UnexpectedToken {
                expected: "identifier".to_string(),
                found: format!("{}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<Statement> {
        Parser::new(sql)?.parse()
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE)",
        )
        .unwrap();

        let Statement::CreateTable(create) = stmt else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(create.table, "users");
        assert_eq!(create.columns.len(), 3);

        assert!(create.columns[0].primary_key);
        assert_eq!(create.columns[0].data_type, DataType::Integer);
        assert!(create.columns[1].not_null);
        assert!(create.columns[2].unique);
    }

    #[test]
    fn test_parse_drop_table() {
        let stmt = parse("DROP TABLE users;").unwrap();
        assert_eq!(
            stmt,
            Statement::DropTable(DropTableStatement {
                table: "users".to_string()
            })
        );
    }

    #[test]
    fn test_parse_insert_with_columns() {
        let stmt =
            parse("INSERT INTO users (name, email) VALUES ('Alice', 'alice@x.com')").unwrap();

        let Statement::Insert(insert) = stmt else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.table, "users");
        assert_eq!(
            insert.columns,
            Some(vec!["name".to_string(), "email".to_string()])
        );
        assert_eq!(
            insert.values,
            vec![
                Literal::String("Alice".to_string()),
                Literal::String("alice@x.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_insert_positional() {
        let stmt = parse("INSERT INTO tasks VALUES (1, 'title', NULL, 2.5)").unwrap();

        let Statement::Insert(insert) = stmt else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.columns, None);
        assert_eq!(insert.values.len(), 4);
        assert_eq!(insert.values[2], Literal::Null);
        assert_eq!(insert.values[3], Literal::Float(2.5));
    }

    #[test]
    fn test_parse_select_star() {
        let stmt = parse("SELECT * FROM users").unwrap();

        let Statement::Select(select) = stmt else {
            panic!("expected SELECT");
        };
        assert_eq!(select.projection, Projection::All);
        assert_eq!(select.table, "users");
        assert!(select.join.is_none());
        assert!(select.predicate.is_none());
    }

    #[test]
    fn test_parse_select_with_where() {
        let stmt = parse("SELECT id, name FROM users WHERE email = 'a@x.com'").unwrap();

        let Statement::Select(select) = stmt else {
            panic!("expected SELECT");
        };
        let Projection::Columns(cols) = &select.projection else {
            panic!("expected explicit projection");
        };
        assert_eq!(cols.len(), 2);

        let pred = select.predicate.unwrap();
        assert_eq!(pred.column.column, "email");
        assert_eq!(pred.op, CompareOp::Eq);
        assert_eq!(pred.value, Literal::String("a@x.com".to_string()));
    }

    #[test]
    fn test_parse_select_join() {
        let stmt =
            parse("SELECT * FROM tasks JOIN users ON tasks.user_id = users.id WHERE status = 'open'")
                .unwrap();

        let Statement::Select(select) = stmt else {
            panic!("expected SELECT");
        };
        assert_eq!(select.table, "tasks");

        let join = select.join.unwrap();
        assert_eq!(join.table, "users");
        assert_eq!(join.left.table.as_deref(), Some("tasks"));
        assert_eq!(join.left.column, "user_id");
        assert_eq!(join.right.table.as_deref(), Some("users"));
        assert_eq!(join.right.column, "id");
        assert!(select.predicate.is_some());
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE tasks SET status = 'completed', priority = 1 WHERE id = 3").unwrap();

        let Statement::Update(update) = stmt else {
            panic!("expected UPDATE");
        };
        assert_eq!(update.table, "tasks");
        assert_eq!(update.assignments.len(), 2);
        assert_eq!(update.assignments[0].column, "status");
        assert_eq!(
            update.assignments[1].value,
            Literal::Integer(1)
        );
        assert!(update.predicate.is_some());
    }

    #[test]
    fn test_parse_update_without_where_matches_all() {
        let stmt = parse("UPDATE tasks SET status = 'archived'").unwrap();

        let Statement::Update(update) = stmt else {
            panic!("expected UPDATE");
        };
        assert!(update.predicate.is_none());
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse("DELETE FROM tasks WHERE id = 1").unwrap();

        let Statement::Delete(delete) = stmt else {
            panic!("expected DELETE");
        };
        assert_eq!(delete.table, "tasks");
        assert!(delete.predicate.is_some());
    }

    #[test]
    fn test_parse_errors_carry_offending_token() {
        let err = parse("SELECT FROM users").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));

        let err = parse("INSERT users VALUES (1)").unwrap_err();
        let Error::UnexpectedToken { expected, found } = err else {
            panic!("expected UnexpectedToken");
        };
        assert_eq!(expected, "INTO");
        assert_eq!(found, "users");
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        let err = parse("DELETE FROM tasks WHERE id = 1 garbage").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn test_parse_truncated_statement() {
        let err = parse("UPDATE tasks SET status =").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_quoted_literal_is_never_syntax() {
        // A WHERE literal containing SQL text stays a plain string.
        let stmt = parse("SELECT * FROM users WHERE name = '1 = 1; DROP TABLE users'").unwrap();

        let Statement::Select(select) = stmt else {
            panic!("expected SELECT");
        };
        assert_eq!(
            select.predicate.unwrap().value,
            Literal::String("1 = 1; DROP TABLE users".to_string())
        );
    }
}
