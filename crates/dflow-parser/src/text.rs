//! Lowering from the pest parse tree of the text form to [`Program`].

use crate::error::{ParseError, Result};
use crate::Rule;
use dflow_core::{Argument, Function, Instruction, Literal, Operation, Program, Type};
use pest::iterators::Pair;

pub(crate) fn program(pair: Pair<'_, Rule>) -> Result<Program> {
    let functions = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::function)
        .map(function)
        .collect::<Result<Vec<_>>>()?;
    Ok(Program::new(functions))
}

fn function(pair: Pair<'_, Rule>) -> Result<Function> {
    let mut inner = pair.into_inner();
    let name = inner.next().map(reference_name).unwrap_or_default();
    let mut function = Function::new(name);

    for item in inner {
        match item.as_rule() {
            Rule::arg_list => {
                function.args = item.into_inner().map(argument).collect();
            }
            Rule::ty => function.return_type = Some(ty(item)),
            Rule::label_def => {
                if let Some(label) = item.into_inner().next() {
                    function.push(Instruction::label(reference_name(label)));
                }
            }
            Rule::instruction => function.push(instruction(item)?),
            _ => {}
        }
    }

    Ok(function)
}

fn argument(pair: Pair<'_, Rule>) -> Argument {
    let mut name = String::new();
    let mut arg_ty = Type::primitive("int");
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => name = part.as_str().to_string(),
            Rule::ty => arg_ty = ty(part),
            _ => {}
        }
    }
    Argument::new(name, arg_ty)
}

fn ty(pair: Pair<'_, Rule>) -> Type {
    let mut inner = pair.into_inner();
    let name = inner.next().map(|p| p.as_str()).unwrap_or_default();
    match inner.next() {
        Some(param) => Type::parameterized(name, ty(param)),
        None => Type::primitive(name),
    }
}

/// Body of a `.label` or `@func` reference, without the sigil.
fn reference_name(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn instruction(pair: Pair<'_, Rule>) -> Result<Operation> {
    let (line, _) = pair.line_col();
    let mut op = Operation::default();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::dest => op.dest = Some(part.as_str().to_string()),
            Rule::ty => op.ty = Some(ty(part)),
            Rule::opcode => op.op = part.as_str().to_string(),
            Rule::ident => op.args.push(part.as_str().to_string()),
            Rule::label_ref => op.labels.push(reference_name(part)),
            Rule::func_ref => op.funcs.push(reference_name(part)),
            Rule::int | Rule::float | Rule::boolean | Rule::char_lit => {
                if !op.is_const() || op.value.is_some() {
                    return Err(ParseError::UnexpectedLiteral {
                        line,
                        op: op.op,
                        literal: part.as_str().to_string(),
                    });
                }
                op.value = Some(literal(&part, &op.op, line)?);
            }
            _ => {}
        }
    }

    if op.is_const() {
        match (&op.value, &op.ty) {
            (None, _) => return Err(ParseError::MissingValue { line }),
            // `x: float = const 1;` stores a float.
            (Some(Literal::Int(i)), Some(Type::Primitive(t))) if t == "float" => {
                op.value = Some(Literal::Float(*i as f64));
            }
            _ => {}
        }
    }

    Ok(op)
}

fn literal(pair: &Pair<'_, Rule>, op: &str, line: usize) -> Result<Literal> {
    let text = pair.as_str();
    let invalid = || ParseError::UnexpectedLiteral {
        line,
        op: op.to_string(),
        literal: text.to_string(),
    };

    match pair.as_rule() {
        Rule::int => text.parse::<i64>().map(Literal::Int).map_err(|_| invalid()),
        Rule::float => text.parse::<f64>().map(Literal::Float).map_err(|_| invalid()),
        Rule::boolean => Ok(Literal::Bool(text == "true")),
        Rule::char_lit => pair
            .clone()
            .into_inner()
            .next()
            .and_then(|body| body.as_str().chars().next())
            .map(Literal::Char)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
