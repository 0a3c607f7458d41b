//! Símbolos, tokens y precedencia de operadores.
//!
//! Un único enum [`Symbol`] cubre tanto a las clases de token que
//! emite el lexer como a los símbolos gramaticales que maneja el
//! parser. Esto permite comparar directamente el lookahead contra
//! el tope de la pila de símbolos.

use std::fmt::{self, Display};

/// Símbolo terminal, no terminal o clase de token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    If,
    Else,
    For,
    Do,
    Begin,
    End,

    /// Identificador.
    Id,

    /// Literal entero.
    Int,

    /// Literal real.
    Real,

    /// `<`
    Lt,

    /// `<=`
    Le,

    /// `=`
    Eq,

    /// `<>`
    Ne,

    /// `>`
    Gt,

    /// `>=`
    Ge,

    /// `:=`
    Is,

    /// `+`
    Pl,

    /// `-`
    Mi,

    /// `*`
    Mu,

    /// `/`
    Di,

    /// `(`
    Lb,

    /// `)`
    Rb,

    E,
    E1,
    T,
    T1,
    F,

    /// Operando genérico, resultado de generalizar `ID`, `INT` y `REAL`.
    Operand,

    /// Terminal de la gramática que representa a cualquier operando.
    I,

    /// Fin del flujo de símbolos.
    Eof,
}

impl Symbol {
    /// Busca una palabra reservada. Distingue mayúsculas.
    pub fn keyword(word: &str) -> Option<Symbol> {
        use Symbol::*;

        const KEYWORDS: &[(&str, Symbol)] = &[
            ("if",    If),
            ("else",  Else),
            ("for",   For),
            ("do",    Do),
            ("begin", Begin),
            ("end",   End),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == word)
            .map(|&(_, keyword)| keyword)
    }

    /// Determina si el símbolo es un no terminal de la gramática.
    pub fn is_nonterminal(self) -> bool {
        matches!(self, Symbol::E | Symbol::E1 | Symbol::T | Symbol::T1 | Symbol::F)
    }
}

impl Display for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Symbol::*;
        let string = match self {
            If      => "IF",
            Else    => "ELSE",
            For     => "FOR",
            Do      => "DO",
            Begin   => "BEGIN",
            End     => "END",
            Id      => "ID",
            Int     => "INT",
            Real    => "REAL",
            Lt      => "LT",
            Le      => "LE",
            Eq      => "EQ",
            Ne      => "NE",
            Gt      => "GT",
            Ge      => "GE",
            Is      => "IS",
            Pl      => "PL",
            Mi      => "MI",
            Mu      => "MU",
            Di      => "DI",
            Lb      => "LB",
            Rb      => "RB",
            E       => "E",
            E1      => "E1",
            T       => "T",
            T1      => "T1",
            F       => "F",
            Operand => "Operand",
            I       => "i",
            Eof     => "EOF",
        };

        fmt.write_str(string)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Además de su clase, cada token conserva su texto. Para literales
/// numéricos el texto es el valor normalizado y no el lexema crudo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: Symbol,
    lexeme: String,
}

impl Token {
    /// Construye un token.
    pub fn new<S: Into<String>>(kind: Symbol, lexeme: S) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
        }
    }

    /// Token sintético de fin de entrada.
    pub fn eof() -> Self {
        Token::new(Symbol::Eof, "")
    }

    /// Clase del token.
    pub fn kind(&self) -> Symbol {
        self.kind
    }

    /// Texto del token.
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    /// Toma ownership del texto.
    pub fn into_lexeme(self) -> String {
        self.lexeme
    }

    /// Reetiqueta identificadores y literales como operandos genéricos.
    pub fn generalize(self) -> Self {
        match self.kind {
            Symbol::Id | Symbol::Int | Symbol::Real => Token {
                kind: Symbol::Operand,
                ..self
            },

            _ => self,
        }
    }

    /// Terminal gramatical que corresponde a este token.
    pub fn terminal(&self) -> Symbol {
        match self.kind {
            Symbol::Operand | Symbol::Id | Symbol::Int | Symbol::Real => Symbol::I,
            kind => kind,
        }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Symbol::*;

        match self.kind {
            Id => write!(fmt, "identifier `{}`", self.lexeme),
            Int | Real => write!(fmt, "literal `{}`", self.lexeme),
            Operand => write!(fmt, "operand `{}`", self.lexeme),
            Eof => fmt.write_str("end of input"),
            If | Else | For | Do | Begin | End => write!(fmt, "keyword `{}`", self.lexeme),
            _ => write!(fmt, "`{}`", self.lexeme),
        }
    }
}

/// Matriz de precedencia, fila contra columna.
///
/// `true` significa que la fila cede ante la columna: el operador
/// en el tope de la pila (columna) debe reducirse antes de apilar
/// el operador entrante (fila).
const PRECEDENCE: [[bool; 5]; 5] = [
    //  PL     MI     MU     DI     LB
    [true,  true,  true,  true,  false], // PL
    [true,  true,  true,  true,  false], // MI
    [false, false, true,  true,  false], // MU
    [false, false, true,  true,  false], // DI
    [false, false, false, false, false], // LB
];

fn rank(symbol: Symbol) -> Option<usize> {
    match symbol {
        Symbol::Pl => Some(0),
        Symbol::Mi => Some(1),
        Symbol::Mu => Some(2),
        Symbol::Di => Some(3),
        Symbol::Lb => Some(4),
        _ => None,
    }
}

/// Consulta la matriz de precedencia.
///
/// Fuera de `PL`, `MI`, `MU`, `DI` y `LB` la respuesta es siempre `false`.
pub fn precedes(row: Symbol, column: Symbol) -> bool {
    match (rank(row), rank(column)) {
        (Some(row), Some(column)) => PRECEDENCE[row][column],
        _ => false,
    }
}
