//! Test program builders

use super::fixtures::{library, Library};
use linkgraph_ir::config::LinkConfig;
use linkgraph_ir::shared::models::{Block, Expression, ProgramBuilder, Statement, Variable};
use linkgraph_ir::LinkComputer;
use std::sync::Arc;

/// Program builder with the library types already added
pub fn program_with_library() -> (ProgramBuilder, Library) {
    let mut builder = ProgramBuilder::new();
    let lib = library(&mut builder);
    (builder, lib)
}

/// Sequential computer with the default configuration
pub fn computer(builder: ProgramBuilder) -> LinkComputer {
    computer_with(builder, LinkConfig::default().parallel(false))
}

pub fn computer_with(builder: ProgramBuilder, config: LinkConfig) -> LinkComputer {
    LinkComputer::new(Arc::new(builder.build()), config)
}

pub fn body(statements: Vec<Statement>) -> Block {
    Block::new(statements)
}

pub fn var(v: &Variable) -> Expression {
    Expression::variable(v)
}

pub fn ret(e: Expression) -> Statement {
    Statement::Return(Some(e))
}

pub fn expr(e: Expression) -> Statement {
    Statement::Expression(e)
}

pub fn declare(v: &Variable, initializer: Expression) -> Statement {
    Statement::LocalVariableCreation {
        variable: v.clone(),
        initializer: Some(initializer),
    }
}
