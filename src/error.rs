use crate::source::{Located, Location};
use std::{
    error::Error,
    fmt::{self, Debug, Display},
};

/// Clasificación de errores, común a todas las fases.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Lexical,
    Numeric,
    Syntax,
    Exhausted,
    Precondition,
    Semantic,
    Io,
}

impl Display for Kind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Kind::Lexical => "Lexical error",
            Kind::Numeric => "Malformed numeric literal",
            Kind::Syntax => "Syntax error",
            Kind::Exhausted => "Input exhausted",
            Kind::Precondition => "Precondition violation",
            Kind::Semantic => "Semantic error",
            Kind::Io => "I/O error",
        };

        fmt.write_str(string)
    }
}

/// Errores que conocen su propia clasificación.
pub trait Classify {
    fn kind(&self) -> Kind;
}

mod sealed {
    pub trait Sealed {}
}

pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
    fn kind(&self) -> Kind;
}

/// Reporte de errores ubicados, listo para mostrarse al usuario.
#[derive(Default)]
pub struct Diagnostics {
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    /// Agrega un error al final del reporte.
    pub fn push<E: 'static + LocatedError>(&mut self, error: E) {
        self.errors.push(Box::new(error));
    }

    /// Cantidad de errores reportados.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Clasificaciones de los errores, en orden.
    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.errors.iter().map(|error| error.kind())
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let errors: Box<dyn LocatedError> = Box::new(error);
                errors
            })
            .collect();

        Diagnostics { errors }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", error.kind(), error.source())?;

            let location = error.location();
            writeln!(fmt, " --> {}", location)?;

            let digits = location.end().line().to_string().chars().count();
            writeln!(fmt, "{:digits$} |", "", digits = digits)?;

            for line_number in location.start().line()..=location.end().line() {
                location.source().with_line(line_number, |line| {
                    writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)
                })?
            }

            let (from, to) = (location.start().column(), location.end().column() - 1);
            let min = from.min(to);
            let max = from.max(to);

            let skip = (min - 1) as usize;
            let highlight = (max - min + 1) as usize;

            writeln!(
                fmt,
                "{:digits$} | {:skip$}{:^<highlight$}",
                "",
                "",
                "",
                digits = digits,
                skip = skip,
                highlight = highlight
            )?;

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(fmt, "{} {} reported", errors.len(), error_or_errors)
    }
}

impl Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, fmt)
    }
}

impl<E: Error + Classify> sealed::Sealed for Located<E> {}

impl<E: Error + Classify> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }

    fn kind(&self) -> Kind {
        self.as_ref().kind()
    }
}
