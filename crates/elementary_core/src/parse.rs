//! The one place that calls into `boa_parser` directly. Everything
//! downstream — the rewriter (C3), the scheduler's `eval` (C5) — works from
//! the `StatementList` this produces, never from raw source text again until
//! the rewritten tree is re-rendered for the engine to execute.

use boa_ast::StatementList;
use boa_interner::Interner;
use boa_parser::{Parser, Source};

use crate::error::Error;

pub(crate) fn parse(source: &str, interner: &mut Interner) -> Result<StatementList, Error> {
    let mut parser = Parser::new(Source::from_bytes(source.as_bytes()));
    parser
        .parse_script(&boa_ast::scope::Scope::new_global(), interner)
        .map_err(|err| Error::Syntax {
            message: err.to_string(),
            line: 0,
        })
}
