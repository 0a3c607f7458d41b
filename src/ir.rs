//! Código de tres direcciones.

use crate::token::Symbol;
use std::fmt::{self, Display};

/// Variable temporal sintetizada por el generador.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Temporary(pub u32);

impl Display for Temporary {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "T{}", self.0)
    }
}

/// Un cuádruplo `(operador, operando, operando, resultado)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quadruple {
    pub operator: Symbol,
    pub first: String,
    pub second: Option<String>,
    pub result: String,
}

impl Quadruple {
    /// Construye un cuádruplo de operación binaria.
    pub fn binary<A, B, C>(operator: Symbol, first: A, second: B, result: C) -> Self
    where
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
    {
        Quadruple {
            operator,
            first: first.into(),
            second: Some(second.into()),
            result: result.into(),
        }
    }
}

impl Display for Quadruple {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "({}, {}, {}, {})",
            self.operator,
            self.first,
            self.second.as_deref().unwrap_or(""),
            self.result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_format() {
        let quad = Quadruple::binary(Symbol::Mu, "4", "2", Temporary(1).to_string());
        assert_eq!(quad.to_string(), "(MU, 4, 2, T1)");

        let unary = Quadruple {
            second: None,
            ..quad
        };

        assert_eq!(unary.to_string(), "(MU, 4, , T1)");
    }
}
