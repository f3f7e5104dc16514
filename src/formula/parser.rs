use ndarray::Array1;

use super::symbols::{SeriesLookup, SymbolBinding, SymbolTable};
use crate::error::FormulaError;

/// Deepest parenthesis nesting accepted before evaluation gives up.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// Evaluate `formula` up to the end of its scope.
///
/// Returns the computed series and the number of characters consumed. When
/// the scope is closed by `)` the count includes that parenthesis, so a caller
/// that recursed on `(` can resume right after the matching `)`.
///
/// `time_index` fixes the series length: literals are broadcast to it and
/// every resolved series must match it.
pub fn evaluate<L>(
    formula: &str,
    symbols: &SymbolTable,
    lookup: &L,
    time_index: &Array1<f64>,
) -> Result<(Array1<f64>, usize), FormulaError>
where
    L: SeriesLookup + ?Sized,
{
    let chars: Vec<char> = formula.chars().collect();
    let evaluator = Evaluator {
        symbols,
        lookup,
        time_index,
    };
    evaluator.scope(&chars, 0, 0)
}

/// Evaluate a complete user formula.
///
/// Whitespace is removed from a copy of the input first. Input left over after
/// a stray `)` is rejected instead of being ignored.
pub fn evaluate_formula<L>(
    formula: &str,
    symbols: &SymbolTable,
    lookup: &L,
    time_index: &Array1<f64>,
) -> Result<Array1<f64>, FormulaError>
where
    L: SeriesLookup + ?Sized,
{
    let (origin, stripped): (Vec<usize>, String) = formula
        .chars()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .unzip();
    let end = formula.chars().count();

    let (values, consumed) = evaluate(&stripped, symbols, lookup, time_index)
        .map_err(|e| e.relocate(&origin, end))?;
    if consumed < origin.len() {
        let error = FormulaError::UnmatchedParenthesis {
            position: consumed - 1,
        };
        return Err(error.relocate(&origin, end));
    }
    Ok(values)
}

struct Evaluator<'a, L: ?Sized> {
    symbols: &'a SymbolTable,
    lookup: &'a L,
    time_index: &'a Array1<f64>,
}

impl<L: SeriesLookup + ?Sized> Evaluator<'_, L> {
    /// `offset` is the absolute position of `chars[0]`, used for error reporting only.
    /// `depth` counts the enclosing parentheses.
    fn scope(
        &self,
        chars: &[char],
        offset: usize,
        depth: usize,
    ) -> Result<(Array1<f64>, usize), FormulaError> {
        let mut operands: Vec<Array1<f64>> = Vec::new();
        let mut operators: Vec<Operator> = Vec::new();
        let mut literal: Option<f64> = None;
        let mut cursor = 0;

        while cursor < chars.len() {
            let ch = chars[cursor];
            let position = offset + cursor;
            cursor += 1;

            if ch == '(' {
                expect_operand_slot(&operands, &operators, literal, position)?;
                if depth >= MAX_NESTING {
                    return Err(FormulaError::NestingTooDeep {
                        position,
                        limit: MAX_NESTING,
                    });
                }
                let (value, consumed) = self.scope(&chars[cursor..], offset + cursor, depth + 1)?;
                operands.push(value);
                cursor += consumed;
            } else if ch == ')' {
                break;
            } else if let Some(digit) = ch.to_digit(10) {
                let pending = match literal {
                    Some(value) => value,
                    None => {
                        expect_operand_slot(&operands, &operators, None, position)?;
                        0.0
                    }
                };
                literal = Some(pending * 10.0 + f64::from(digit));
            } else if let Some(operator) = Operator::from_char(ch) {
                if let Some(value) = literal.take() {
                    operands.push(self.broadcast(value));
                }
                if operands.len() != operators.len() + 1 {
                    return Err(FormulaError::EmptyOperand { position });
                }
                operators.push(operator);
            } else {
                let binding = self
                    .symbols
                    .resolve(ch)
                    .ok_or(FormulaError::UnknownSymbol {
                        symbol: ch,
                        position,
                    })?;
                expect_operand_slot(&operands, &operators, literal, position)?;
                operands.push(self.load(binding)?);
            }
        }

        if let Some(value) = literal.take() {
            operands.push(self.broadcast(value));
        }
        if operands.len() != operators.len() + 1 {
            return Err(FormulaError::EmptyOperand {
                position: offset + cursor,
            });
        }

        Ok((reduce(operands, operators), cursor))
    }

    fn broadcast(&self, value: f64) -> Array1<f64> {
        Array1::from_elem(self.time_index.len(), value)
    }

    fn load(&self, binding: &SymbolBinding) -> Result<Array1<f64>, FormulaError> {
        let (name, values) = match binding {
            SymbolBinding::TimeIndex => return Ok(self.time_index.clone()),
            SymbolBinding::Series(name) => {
                let values = self
                    .lookup
                    .series(name)
                    .ok_or_else(|| FormulaError::MissingSeries { name: name.clone() })?;
                (name, values)
            }
        };

        if values.len() != self.time_index.len() {
            return Err(FormulaError::LengthMismatch {
                name: name.clone(),
                expected: self.time_index.len(),
                got: values.len(),
            });
        }
        Ok(values.clone())
    }
}

/// A new operand may only start right after an operator (or at scope start).
fn expect_operand_slot(
    operands: &[Array1<f64>],
    operators: &[Operator],
    literal: Option<f64>,
    position: usize,
) -> Result<(), FormulaError> {
    if literal.is_some() || operands.len() != operators.len() {
        return Err(FormulaError::MissingOperator { position });
    }
    Ok(())
}

/// Fold `*` and `/` into the preceding term, then fold `+` and `-` left to right.
///
/// Callers guarantee `operands.len() == operators.len() + 1`.
fn reduce(operands: Vec<Array1<f64>>, operators: Vec<Operator>) -> Array1<f64> {
    let mut operands = operands.into_iter();
    let mut terms: Vec<Array1<f64>> = operands.next().into_iter().collect();
    let mut additive: Vec<Operator> = Vec::new();

    for (operator, operand) in operators.into_iter().zip(operands) {
        match operator {
            Operator::Multiply | Operator::Divide => {
                if let Some(last) = terms.last_mut() {
                    if operator == Operator::Multiply {
                        *last *= &operand;
                    } else {
                        *last /= &operand;
                    }
                }
            }
            Operator::Add | Operator::Subtract => {
                terms.push(operand);
                additive.push(operator);
            }
        }
    }

    let mut terms = terms.into_iter();
    let mut result = terms.next().unwrap_or_else(|| Array1::zeros(0));
    for (operator, term) in additive.into_iter().zip(terms) {
        match operator {
            Operator::Subtract => result -= &term,
            _ => result += &term,
        }
    }
    result
}
