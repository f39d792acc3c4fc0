//! Statement and expression tree of a method body
//!
//! Only the shapes that influence linkage are modeled. Operators are opaque:
//! their operands are evaluated for side effects, their values carry no links.

use super::types::{MethodRef, ParameterizedType};
use super::variable::Variable;

#[derive(Debug, Clone)]
pub enum Constant {
    Null,
    Boolean(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: MethodRef,
    /// `None` for static calls
    pub object: Option<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct ConstructorCall {
    pub ty: ParameterizedType,
    /// `None` when the type has no explicit constructor
    pub constructor: Option<MethodRef>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub target: Variable,
    pub value: Expression,
}

#[derive(Debug, Clone)]
pub struct InlineConditional {
    pub condition: Expression,
    pub if_true: Expression,
    pub if_false: Expression,
}

/// A lambda is a synthetic method of the enclosing type; its body refers to
/// captured variables of the enclosing method directly.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub method: MethodRef,
    /// The functional interface type the lambda implements
    pub ty: ParameterizedType,
}

#[derive(Debug, Clone)]
pub struct MethodReference {
    pub method: MethodRef,
    /// Bound receiver (`list::add`); `None` for static or unbound references
    pub scope: Option<Expression>,
    pub ty: ParameterizedType,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Variable(Variable),
    Constant(Constant),
    MethodCall(Box<MethodCall>),
    ConstructorCall(Box<ConstructorCall>),
    Assignment(Box<Assignment>),
    InlineConditional(Box<InlineConditional>),
    ArrayInitializer {
        ty: ParameterizedType,
        elements: Vec<Expression>,
    },
    BinaryOperator(Box<Expression>, Box<Expression>),
    UnaryOperator(Box<Expression>),
    Cast {
        ty: ParameterizedType,
        expression: Box<Expression>,
    },
    InstanceOf(Box<Expression>),
    ArrayLength(Box<Expression>),
    Lambda(Lambda),
    MethodReference(Box<MethodReference>),
}

impl Expression {
    pub fn variable(v: &Variable) -> Self {
        Expression::Variable(v.clone())
    }

    pub fn null() -> Self {
        Expression::Constant(Constant::Null)
    }

    pub fn call(method: &MethodRef, object: Option<Expression>, arguments: Vec<Expression>) -> Self {
        Expression::MethodCall(Box::new(MethodCall {
            method: method.clone(),
            object,
            arguments,
        }))
    }

    pub fn new_object(
        ty: ParameterizedType,
        constructor: Option<&MethodRef>,
        arguments: Vec<Expression>,
    ) -> Self {
        Expression::ConstructorCall(Box::new(ConstructorCall {
            ty,
            constructor: constructor.cloned(),
            arguments,
        }))
    }

    pub fn assign(target: &Variable, value: Expression) -> Self {
        Expression::Assignment(Box::new(Assignment {
            target: target.clone(),
            value,
        }))
    }

    pub fn conditional(condition: Expression, if_true: Expression, if_false: Expression) -> Self {
        Expression::InlineConditional(Box::new(InlineConditional {
            condition,
            if_true,
            if_false,
        }))
    }

    pub fn lambda(method: &MethodRef, ty: ParameterizedType) -> Self {
        Expression::Lambda(Lambda {
            method: method.clone(),
            ty,
        })
    }

    pub fn method_reference(
        method: &MethodRef,
        scope: Option<Expression>,
        ty: ParameterizedType,
    ) -> Self {
        Expression::MethodReference(Box::new(MethodReference {
            method: method.clone(),
            scope,
            ty,
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Locals declared anywhere in this block, nested blocks included
    pub fn declared_locals(&self) -> Vec<Variable> {
        let mut result = Vec::new();
        for statement in &self.statements {
            statement.collect_declared_locals(&mut result);
        }
        result
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    LocalVariableCreation {
        variable: Variable,
        initializer: Option<Expression>,
    },
    Expression(Expression),
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        condition: Expression,
        body: Block,
    },
    ForEach {
        variable: Variable,
        iterable: Expression,
        body: Block,
    },
    Block(Block),
    Throw(Expression),
}

impl Statement {
    /// Sub-blocks, each analyzed against the same pre-statement snapshot
    pub fn sub_blocks(&self) -> Vec<&Block> {
        match self {
            Statement::If {
                then_block,
                else_block,
                ..
            } => {
                let mut blocks = vec![then_block];
                if let Some(e) = else_block {
                    blocks.push(e);
                }
                blocks
            }
            Statement::While { body, .. } | Statement::ForEach { body, .. } => vec![body],
            Statement::Block(block) => vec![block],
            _ => Vec::new(),
        }
    }

    fn collect_declared_locals(&self, out: &mut Vec<Variable>) {
        match self {
            Statement::LocalVariableCreation { variable, .. }
            | Statement::ForEach { variable, .. } => out.push(variable.clone()),
            _ => {}
        }
        for block in self.sub_blocks() {
            for statement in &block.statements {
                statement.collect_declared_locals(out);
            }
        }
    }
}
