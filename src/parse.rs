//! Análisis sintáctico.
//!
//! El parser es predictivo y dirigido por tabla. Mantiene una pila
//! de símbolos gramaticales sembrada con `EOF E`. En cada paso compara
//! el tope de la pila contra el terminal del lookahead: si coinciden
//! se consume el token y se entrega al generador, si el tope es un no
//! terminal se expande según [`predict`], y en cualquier otro caso hay
//! un error de sintaxis. La gramática es:
//!
//! ```text
//! E  → T E1
//! E1 → + T E1 | - T E1 | ε
//! T  → F T1
//! T1 → * F T1 | / F T1 | ε
//! F  → i | ( E )
//! ```

use crate::{
    error::{Classify, Kind},
    lex::{Lexer, LexerError, Scan},
    semantic::{Generator, SemanticError, Sink},
    session::Trace,
    source::Located,
    token::{Symbol, Token},
};

use log::debug;
use std::{
    fmt::{self, Display},
    io::BufRead,
};

use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Unexpected {found} at symbol {count}, expected {expected}")]
    Unexpected {
        found: Token,
        expected: Expected,
        count: usize,
    },

    #[error("No tokens remain after end of input")]
    Exhausted,

    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl Classify for ParserError {
    fn kind(&self) -> Kind {
        match self {
            ParserError::Unexpected { .. } => Kind::Syntax,
            ParserError::Exhausted => Kind::Exhausted,
            ParserError::Lexer(error) => error.kind(),
            ParserError::Semantic(error) => error.kind(),
        }
    }
}

/// Terminales que habrían sido aceptados en lugar del encontrado.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expected(pub Vec<Symbol>);

impl Display for Expected {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => fmt.write_str("nothing"),
            [only] => write!(fmt, "{}", only),
            [init @ .., last] => {
                for (i, symbol) in init.iter().enumerate() {
                    if i > 0 {
                        fmt.write_str(", ")?;
                    }

                    write!(fmt, "{}", symbol)?;
                }

                write!(fmt, " or {}", last)
            }
        }
    }
}

pub type Parse<T> = Result<T, Located<ParserError>>;

/// Tabla predictiva. El lado derecho se almacena invertido, de
/// manera que el primer símbolo de la producción se apila de último.
const PRODUCTIONS: &[(Symbol, Symbol, &[Symbol])] = {
    use Symbol::*;

    &[
        (E,  I,   &[E1, T]),
        (E,  Lb,  &[E1, T]),
        (E1, Pl,  &[E1, T, Pl]),
        (E1, Mi,  &[E1, T, Mi]),
        (E1, Rb,  &[]),
        (E1, Eof, &[]),
        (T,  I,   &[T1, F]),
        (T,  Lb,  &[T1, F]),
        (T1, Pl,  &[]),
        (T1, Mi,  &[]),
        (T1, Mu,  &[T1, F, Mu]),
        (T1, Di,  &[T1, F, Di]),
        (T1, Rb,  &[]),
        (T1, Eof, &[]),
        (F,  I,   &[I]),
        (F,  Lb,  &[Rb, E, Lb]),
    ]
};

/// Terminales de la gramática, en el orden en que se reportan.
const TERMINALS: &[Symbol] = {
    use Symbol::*;
    &[I, Pl, Mi, Mu, Di, Lb, Rb, Eof]
};

/// Consulta la tabla predictiva.
///
/// Retorna el lado derecho invertido de la producción de `nonterminal`
/// ante `lookahead`, o `None` si no existe tal entrada.
pub fn predict(nonterminal: Symbol, lookahead: Symbol) -> Option<&'static [Symbol]> {
    PRODUCTIONS
        .iter()
        .find(|&&(left, next, _)| left == nonterminal && next == lookahead)
        .map(|&(_, _, right)| right)
}

/// Terminales válidos cuando `top` se encuentra en el tope de la pila.
pub fn expected(top: Symbol) -> Expected {
    if top.is_nonterminal() {
        let symbols = TERMINALS
            .iter()
            .copied()
            .filter(|&terminal| predict(top, terminal).is_some())
            .collect();

        Expected(symbols)
    } else {
        Expected(vec![top])
    }
}

/// Parser LL(1). Es dueño tanto del lexer que lo alimenta como del
/// generador al que entrega los terminales reconocidos.
pub struct Parser<R, S> {
    lexer: Lexer<R>,
    generator: Generator<S>,
    stack: Vec<Symbol>,
    exhausted: bool,
    symbols: usize,
    trace: Trace,
}

impl<R: BufRead, S: Sink> Parser<R, S> {
    pub fn new(lexer: Lexer<R>, generator: Generator<S>) -> Self {
        Parser {
            lexer,
            generator,
            stack: Vec::new(),
            exhausted: false,
            symbols: 0,
            trace: Trace::empty(),
        }
    }

    /// Configura los eventos a reportar por `log`.
    pub fn trace(self, trace: Trace) -> Self {
        Parser { trace, ..self }
    }

    /// Analiza la entrada completa.
    ///
    /// Se detiene en el primer error. Los cuádruplos que el generador
    /// haya emitido hasta ese punto permanecen en su destino.
    pub fn run(&mut self) -> Parse<()> {
        self.stack = vec![Symbol::Eof, Symbol::E];
        let mut lookahead = self.advance()?;

        while let Some(&top) = self.stack.last() {
            if self.trace.contains(Trace::STACK) {
                debug!("stack: {:?} | lookahead: {}", self.stack, lookahead.val());
            }

            let terminal = lookahead.val().terminal();
            if top == terminal {
                self.stack.pop();

                let (location, token) = lookahead.split();
                if terminal != Symbol::Eof {
                    self.generator
                        .send(token)
                        .map_err(|error| Located::at(error.into(), location))?;
                }

                if self.stack.is_empty() {
                    break;
                }

                lookahead = self.advance()?;
            } else if let Some(right) = predict(top, terminal) {
                self.stack.pop();
                self.stack.extend_from_slice(right);
            } else {
                return self.unexpected(top, lookahead);
            }
        }

        let here = self.lexer.here();
        self.generator
            .finish()
            .map_err(|error| Located::at(error.into(), here))
    }

    /// Cantidad de tokens entregados, sin contar el fin de entrada.
    pub fn symbols(&self) -> usize {
        self.symbols
    }

    /// Consume el parser y devuelve sus fases internas.
    pub fn into_parts(self) -> (Lexer<R>, Generator<S>) {
        (self.lexer, self.generator)
    }

    /// Obtiene el siguiente token significativo, ya generalizado.
    fn advance(&mut self) -> Parse<Located<Token>> {
        if self.exhausted {
            return self.fail(ParserError::Exhausted);
        }

        let token = loop {
            if !self.lexer.has_next().map_err(lexer_error)? {
                self.exhausted = true;
                break Located::at(Token::eof(), self.lexer.here());
            }

            match self.lexer.get_next().map_err(lexer_error)? {
                Scan::Retry => continue,
                Scan::Token(token) => {
                    self.symbols += 1;
                    break token.map(Token::generalize);
                }
            }
        };

        if self.trace.contains(Trace::TOKENS) {
            debug!("{}: {}", token.location(), token.val());
        }

        Ok(token)
    }

    fn unexpected<T>(&self, top: Symbol, found: Located<Token>) -> Parse<T> {
        let (location, found) = found.split();
        let error = ParserError::Unexpected {
            found,
            expected: expected(top),
            count: self.symbols,
        };

        Err(Located::at(error, location))
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Located::at(error, self.lexer.here()))
    }
}

fn lexer_error(error: Located<LexerError>) -> Located<ParserError> {
    error.map(ParserError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::Quadruple, source::Cursor};
    use assert_matches::assert_matches;
    use Symbol::*;

    fn parse(input: &str) -> (Parse<()>, Vec<String>) {
        let mut quads: Vec<Quadruple> = Vec::new();
        let lexer = Lexer::new(Cursor::new(input.as_bytes(), "<test>"));

        let mut parser = Parser::new(lexer, Generator::new(&mut quads));
        let result = parser.run();
        drop(parser);

        (result, quads.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn table_entries() {
        assert_eq!(predict(E, I), Some(&[E1, T][..]));
        assert_eq!(predict(F, Lb), Some(&[Rb, E, Lb][..]));
        assert_eq!(predict(T1, Rb), Some(&[][..]));
        assert_eq!(predict(E, Pl), None);
        assert_eq!(predict(F, Eof), None);
        assert_eq!(predict(I, I), None);
    }

    #[test]
    fn expected_lookaheads() {
        assert_eq!(expected(E), Expected(vec![I, Lb]));
        assert_eq!(expected(E1), Expected(vec![Pl, Mi, Rb, Eof]));
        assert_eq!(expected(Rb), Expected(vec![Rb]));
        assert_eq!(expected(E1).to_string(), "PL, MI, RB or EOF");
        assert_eq!(expected(F).to_string(), "i or LB");
    }

    #[test]
    fn precedence_and_parentheses() {
        let (result, quads) = parse("3+4*2");
        assert_matches!(result, Ok(()));
        assert_eq!(quads, vec!["(MU, 4, 2, T1)", "(PL, 3, T1, T2)"]);

        let (result, quads) = parse("(1+2)*3");
        assert_matches!(result, Ok(()));
        assert_eq!(quads, vec!["(PL, 1, 2, T1)", "(MU, T1, 3, T2)"]);
    }

    #[test]
    fn expression_across_lines() {
        let (result, quads) = parse("a\n\n  * (b\n- 1.50)\n");
        assert_matches!(result, Ok(()));
        assert_eq!(quads, vec!["(MI, b, 1.50, T1)", "(MU, a, T1, T2)"]);
    }

    #[test]
    fn dangling_operator() {
        let (result, quads) = parse("3+");
        let error = result.unwrap_err();

        assert_eq!(error.val().kind(), Kind::Syntax);
        assert_matches!(
            error.val(),
            ParserError::Unexpected { found, expected, count: 2 }
                if found.kind() == Eof && *expected == Expected(vec![I, Lb])
        );

        assert!(quads.is_empty());
    }

    #[test]
    fn partial_output_survives() {
        let (result, quads) = parse("1*2+)");

        assert_matches!(result, Err(error) if error.val().kind() == Kind::Syntax);
        assert_eq!(quads, vec!["(MU, 1, 2, T1)"]);
    }

    #[test]
    fn keywords_are_rejected() {
        let (result, _) = parse("x + begin");
        let error = result.unwrap_err();

        assert_matches!(
            error.val(),
            ParserError::Unexpected { found, .. } if found.kind() == Begin
        );

        assert_eq!(error.location().start().column(), 5);
    }

    #[test]
    fn unclosed_parenthesis() {
        let (result, _) = parse("(a+b");
        assert_matches!(
            result.unwrap_err().val(),
            ParserError::Unexpected { expected, .. } if *expected == Expected(vec![Rb])
        );
    }

    #[test]
    fn lexical_failures_propagate() {
        let (result, _) = parse("2 * 1.e");
        let error = result.unwrap_err();

        assert_eq!(error.val().kind(), Kind::Numeric);
        assert_matches!(error.val(), ParserError::Lexer(LexerError::Numeric(_)));
    }

    #[test]
    fn nothing_after_end_of_input() {
        let mut quads: Vec<Quadruple> = Vec::new();
        let lexer = Lexer::new(Cursor::new("".as_bytes(), "<test>"));
        let mut parser = Parser::new(lexer, Generator::new(&mut quads));

        let eof = parser.advance().unwrap();
        assert_eq!(eof.val().kind(), Eof);

        let error = parser.advance().unwrap_err();
        assert_matches!(error.val(), ParserError::Exhausted);
        assert_eq!(error.val().kind(), Kind::Exhausted);

        let report = crate::error::Diagnostics::from(error).to_string();
        assert!(report.starts_with("Input exhausted: No tokens remain after end of input\n"));
        assert!(report.contains(" --> <test>:1:1\n"));
    }

    #[test]
    fn symbol_count() {
        let mut quads: Vec<Quadruple> = Vec::new();
        let lexer = Lexer::new(Cursor::new("(a) - b # c".as_bytes(), "<test>"));

        let mut parser = Parser::new(lexer, Generator::new(&mut quads));
        assert_matches!(parser.run(), Err(_));
        assert_eq!(parser.symbols(), 6);

        let (lexer, _) = parser.into_parts();
        assert_eq!(lexer.diagnostics().len(), 1);
    }
}
