//! Orquestación de una compilación.
//!
//! Una [`Session`] conecta las fases del compilador sobre un flujo
//! de entrada y un destino de cuádruplos. La sesión no abre ni cierra
//! archivos; eso le corresponde a quien la invoca. Si falta alguno de
//! los dos extremos se reporta una violación de precondición antes de
//! leer o escribir cualquier cosa.

use crate::{
    error::{Classify, Diagnostics, Kind},
    lex::Lexer,
    parse::Parser,
    semantic::{Generator, Sink},
    source::Cursor,
};

use bitflags::bitflags;
use log::info;
use std::{io::BufRead, str::FromStr};
use thiserror::Error;

bitflags! {
    /// Eventos internos que se reportan por `log` en nivel `debug`.
    pub struct Trace: u32 {
        /// Cada token entregado al parser.
        const TOKENS = 0x01;

        /// Pila de símbolos y lookahead en cada paso del parser.
        const STACK = 0x02;

        /// Pilas y cola postfija del generador tras cada terminal.
        const POSTFIX = 0x04;
    }
}

impl FromStr for Trace {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "tokens" => Ok(Trace::TOKENS),
            "stack" => Ok(Trace::STACK),
            "postfix" => Ok(Trace::POSTFIX),
            "all" => Ok(Trace::all()),
            _ => Err(()),
        }
    }
}

/// La sesión se invocó sin alguno de sus extremos de E/S.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("Input not opened")]
    NoInput,

    #[error("Output not opened")]
    NoOutput,
}

impl Classify for PreconditionError {
    fn kind(&self) -> Kind {
        Kind::Precondition
    }
}

/// Fallo de una sesión.
#[derive(Error, Debug)]
pub enum Failure {
    /// No se llegó a compilar.
    #[error("Precondition violation: {0}")]
    Precondition(#[from] PreconditionError),

    /// La compilación se detuvo en un error.
    ///
    /// Los cuádruplos emitidos antes del error permanecen en el destino.
    #[error("{0}")]
    Compile(Diagnostics),
}

/// Resultado de una compilación exitosa.
#[derive(Debug)]
pub struct Summary {
    /// Cuádruplos emitidos.
    pub quadruples: u32,

    /// Tokens entregados al parser.
    pub symbols: usize,

    /// Líneas no vacías leídas.
    pub lines: u32,

    /// Nombre que contiene el valor de la expresión.
    pub value: Option<String>,

    /// Errores léxicos recuperables que no impidieron compilar.
    pub warnings: Diagnostics,
}

/// Una compilación de principio a fin.
pub struct Session<R, S> {
    name: String,
    input: Option<R>,
    sink: Option<S>,
    trace: Trace,
}

impl<R: BufRead, S: Sink> Session<R, S> {
    /// Crea una sesión sin extremos. `name` identifica a la entrada
    /// en los diagnósticos.
    pub fn new<N: Into<String>>(name: N) -> Self {
        Session {
            name: name.into(),
            input: None,
            sink: None,
            trace: Trace::empty(),
        }
    }

    pub fn input(self, input: R) -> Self {
        Session {
            input: Some(input),
            ..self
        }
    }

    pub fn sink(self, sink: S) -> Self {
        Session {
            sink: Some(sink),
            ..self
        }
    }

    pub fn trace(self, trace: Trace) -> Self {
        Session { trace, ..self }
    }

    /// Ejecuta el pipeline completo hasta finalizar o hasta el primer error.
    pub fn run(self) -> Result<Summary, Failure> {
        let input = self.input.ok_or(PreconditionError::NoInput)?;
        let sink = self.sink.ok_or(PreconditionError::NoOutput)?;

        let lexer = Lexer::new(Cursor::new(input, self.name));
        let generator = Generator::new(sink).trace(self.trace);

        let mut parser = Parser::new(lexer, generator).trace(self.trace);
        let result = parser.run();

        let symbols = parser.symbols();
        let (lexer, generator) = parser.into_parts();

        let lines = lexer.lines();
        let mut diagnostics = Diagnostics::from(lexer.into_diagnostics());

        match result {
            Ok(()) => {
                info!(
                    "{} quadruples from {} symbols in {} lines",
                    generator.emitted(),
                    symbols,
                    lines
                );

                Ok(Summary {
                    quadruples: generator.emitted(),
                    symbols,
                    lines,
                    value: generator.value().map(str::to_owned),
                    warnings: diagnostics,
                })
            }

            Err(error) => {
                diagnostics.push(error);
                Err(Failure::Compile(diagnostics))
            }
        }
    }
}
