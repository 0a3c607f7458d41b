//! Análisis semántico y generación de cuádruplos.
//!
//! El generador recibe los terminales en el orden en que el parser
//! los reconoce. Los convierte a notación postfija con una pila de
//! operadores, según la matriz de [`precedes`], y evalúa la cola
//! postfija en cuanto aparece un operador, con una pila de operandos.
//! Cada operación evaluada emite un cuádruplo cuyo resultado es una
//! variable temporal nueva.

use crate::{
    error::{Classify, Kind},
    ir::{Quadruple, Temporary},
    session::Trace,
    token::{precedes, Symbol, Token},
};

use log::debug;
use std::{
    collections::VecDeque,
    io::{self, Write},
};

use thiserror::Error;

pub type Semantic<T> = Result<T, SemanticError>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Failed to emit quadruple")]
    Output(#[from] io::Error),

    #[error("Unbalanced parentheses")]
    UnbalancedParen,

    #[error("Missing operand for {0}")]
    MissingOperand(Symbol),

    #[error("Symbol {0} cannot appear in an expression")]
    Unexpected(Symbol),
}

impl Classify for SemanticError {
    fn kind(&self) -> Kind {
        match self {
            SemanticError::Output(_) => Kind::Io,
            _ => Kind::Semantic,
        }
    }
}

/// Destino de los cuádruplos generados.
pub trait Sink {
    fn push(&mut self, quadruple: Quadruple) -> io::Result<()>;
}

impl Sink for Vec<Quadruple> {
    fn push(&mut self, quadruple: Quadruple) -> io::Result<()> {
        Vec::push(self, quadruple);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn push(&mut self, quadruple: Quadruple) -> io::Result<()> {
        (**self).push(quadruple)
    }
}

/// Escribe un cuádruplo por línea sobre un flujo de salida.
pub struct Listing<W> {
    output: W,
}

impl<W: Write> Listing<W> {
    pub fn new(output: W) -> Self {
        Listing { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> Sink for Listing<W> {
    fn push(&mut self, quadruple: Quadruple) -> io::Result<()> {
        writeln!(self.output, "{}", quadruple)
    }
}

/// Elemento de la cola postfija.
#[derive(Debug)]
enum Entry {
    Operand(String),
    Operator(Symbol),
}

/// Generador de código por precedencia de operadores.
pub struct Generator<S> {
    sink: S,
    operators: Vec<Symbol>,
    operands: Vec<String>,
    postfix: VecDeque<Entry>,
    temporaries: u32,
    trace: Trace,
}

impl<S: Sink> Generator<S> {
    pub fn new(sink: S) -> Self {
        Generator {
            sink,
            operators: Vec::new(),
            operands: Vec::new(),
            postfix: VecDeque::new(),
            temporaries: 0,
            trace: Trace::empty(),
        }
    }

    /// Configura los eventos a reportar por `log`.
    pub fn trace(self, trace: Trace) -> Self {
        Generator { trace, ..self }
    }

    /// Recibe el siguiente terminal reconocido, sin incluir `EOF`.
    pub fn send(&mut self, token: Token) -> Semantic<()> {
        match token.kind() {
            Symbol::Operand => {
                self.postfix.push_back(Entry::Operand(token.into_lexeme()));
            }

            Symbol::Rb => loop {
                match self.operators.pop() {
                    Some(Symbol::Lb) => break,
                    Some(operator) => self.reduce(operator)?,
                    None => return Err(SemanticError::UnbalancedParen),
                }
            },

            operator @ (Symbol::Pl | Symbol::Mi | Symbol::Mu | Symbol::Di | Symbol::Lb) => {
                while let Some(&top) = self.operators.last() {
                    if !precedes(operator, top) {
                        break;
                    }

                    self.operators.pop();
                    self.reduce(top)?;
                }

                self.operators.push(operator);
            }

            other => return Err(SemanticError::Unexpected(other)),
        }

        if self.trace.contains(Trace::POSTFIX) {
            debug!(
                "operators: {:?} | operands: {:?} | postfix: {:?}",
                self.operators, self.operands, self.postfix
            );
        }

        Ok(())
    }

    /// Reduce todos los operadores pendientes.
    pub fn finish(&mut self) -> Semantic<()> {
        while let Some(operator) = self.operators.pop() {
            if operator == Symbol::Lb {
                return Err(SemanticError::UnbalancedParen);
            }

            self.reduce(operator)?;
        }

        // Una expresión sin operadores deja su único operando en la cola
        while let Some(Entry::Operand(operand)) = self.postfix.pop_front() {
            self.operands.push(operand);
        }

        Ok(())
    }

    /// Nombre que contiene el valor de la expresión, tras [`Generator::finish()`].
    pub fn value(&self) -> Option<&str> {
        self.operands.last().map(String::as_str)
    }

    /// Cantidad de cuádruplos emitidos.
    pub fn emitted(&self) -> u32 {
        self.temporaries
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn reduce(&mut self, operator: Symbol) -> Semantic<()> {
        self.postfix.push_back(Entry::Operator(operator));
        self.calc_next()
    }

    /// Evalúa la cola postfija hasta su primer operador.
    fn calc_next(&mut self) -> Semantic<()> {
        let operator = loop {
            match self.postfix.pop_front() {
                Some(Entry::Operand(operand)) => self.operands.push(operand),
                Some(Entry::Operator(operator)) => break operator,
                None => return Ok(()),
            }
        };

        let second = self.operands.pop();
        let first = self.operands.pop();

        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            _ => return Err(SemanticError::MissingOperand(operator)),
        };

        let result = self.new_temp();
        self.sink
            .push(Quadruple::binary(operator, first, second, result.to_string()))?;

        self.operands.push(result.to_string());
        Ok(())
    }

    fn new_temp(&mut self) -> Temporary {
        self.temporaries += 1;
        Temporary(self.temporaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn operand(name: &str) -> Token {
        Token::new(Symbol::Operand, name)
    }

    fn op(kind: Symbol) -> Token {
        Token::new(kind, "")
    }

    fn generate(tokens: Vec<Token>) -> (Vec<String>, Option<String>) {
        let mut quads: Vec<Quadruple> = Vec::new();
        let mut generator = Generator::new(&mut quads);

        for token in tokens {
            generator.send(token).unwrap();
        }

        generator.finish().unwrap();
        let value = generator.value().map(str::to_owned);

        drop(generator);
        (quads.iter().map(ToString::to_string).collect(), value)
    }

    #[test]
    fn product_before_sum() {
        use Symbol::*;

        let (quads, value) = generate(vec![
            operand("3"),
            op(Pl),
            operand("4"),
            op(Mu),
            operand("2"),
        ]);

        assert_eq!(quads, vec!["(MU, 4, 2, T1)", "(PL, 3, T1, T2)"]);
        assert_eq!(value.as_deref(), Some("T2"));
    }

    #[test]
    fn left_associativity() {
        use Symbol::*;

        let (quads, _) = generate(vec![
            operand("a"),
            op(Di),
            operand("b"),
            op(Mu),
            operand("c"),
            op(Mi),
            operand("d"),
        ]);

        assert_eq!(
            quads,
            vec!["(DI, a, b, T1)", "(MU, T1, c, T2)", "(MI, T2, d, T3)"]
        );
    }

    #[test]
    fn nested_parentheses() {
        use Symbol::*;

        // a*(b-(c+d))
        let (quads, value) = generate(vec![
            operand("a"),
            op(Mu),
            op(Lb),
            operand("b"),
            op(Mi),
            op(Lb),
            operand("c"),
            op(Pl),
            operand("d"),
            op(Rb),
            op(Rb),
        ]);

        assert_eq!(
            quads,
            vec!["(PL, c, d, T1)", "(MI, b, T1, T2)", "(MU, a, T2, T3)"]
        );

        assert_eq!(value.as_deref(), Some("T3"));
    }

    #[test]
    fn single_operand() {
        let (quads, value) = generate(vec![operand("x")]);

        assert!(quads.is_empty());
        assert_eq!(value.as_deref(), Some("x"));
    }

    #[test]
    fn listing_writes_lines() {
        let mut generator = Generator::new(Listing::new(Vec::new()));
        for token in vec![operand("1"), op(Symbol::Mi), operand("2")] {
            generator.send(token).unwrap();
        }

        generator.finish().unwrap();
        assert_eq!(generator.emitted(), 1);

        let output = generator.into_sink().into_inner();
        assert_eq!(String::from_utf8(output).unwrap(), "(MI, 1, 2, T1)\n");
    }

    #[test]
    fn misuse_is_reported() {
        let mut quads: Vec<Quadruple> = Vec::new();
        let mut generator = Generator::new(&mut quads);

        assert_matches!(generator.send(op(Symbol::Rb)), Err(SemanticError::UnbalancedParen));
        assert_matches!(
            generator.send(Token::new(Symbol::If, "if")),
            Err(SemanticError::Unexpected(Symbol::If))
        );

        generator.send(op(Symbol::Pl)).unwrap();
        assert_matches!(generator.finish(), Err(SemanticError::MissingOperand(Symbol::Pl)));
    }
}
