//! SQL front end: tokens, lexer, AST, and the recursive-descent parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;
