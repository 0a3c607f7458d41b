//! Reconocimiento de literales numéricos.
//!
//! Este es un sub-autómata del lexer. Entra en acción cuando el lexer
//! ya consumió el primer dígito de un literal y clasifica el resto
//! como entero o real, incluyendo parte fraccionaria y exponente.
//!
//! El reconocedor no tiene buffer propio. Toma prestadas del lexer
//! tres operaciones mediante el trait [`Feed`]: obtener el siguiente
//! carácter, agregarlo al lexema y retroceder un carácter.
//!
//! # Valor
//! Se acumulan la mantisa `w` (todos los dígitos, ignorando el punto),
//! la cantidad `n` de dígitos fraccionarios y el exponente `p` con su
//! signo. El valor real es `w × 10^(±p − n)`, el cual se imprime con
//! `max(0, n ∓ p)` dígitos fraccionarios. La aritmética se hace sobre
//! la cadena de dígitos, por lo cual no hay pérdida de precisión.

use crate::token::Symbol;
use std::io;
use thiserror::Error;

/// Exponente decimal máximo aceptado.
const MAX_EXPONENT: u32 = 308;

/// Operaciones que el reconocedor toma prestadas de su dueño.
pub trait Feed {
    /// Obtiene el siguiente carácter, o `None` al final de la entrada.
    fn next_char(&mut self) -> io::Result<Option<char>>;

    /// Agrega un carácter al token en construcción.
    fn append(&mut self, c: char);

    /// Devuelve el último carácter a la entrada y lo quita del token.
    fn retract(&mut self);
}

/// Error de reconocimiento numérico.
///
/// A diferencia de los errores léxicos ordinarios, estos abortan
/// el reconocimiento del token actual.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NumericError {
    /// Error de E/S originado por el [`Feed`].
    #[error("I/O error")]
    Input(#[from] io::Error),

    /// Un punto decimal sin dígitos que lo sigan.
    #[error("Expected a digit after the decimal point")]
    MissingFraction,

    /// `e`, `e+` o `e-` sin dígitos.
    #[error("Expected exponent digits")]
    MissingExponent,

    /// Letra inesperada dentro de la parte fraccionaria.
    #[error("Unexpected {0:?} in fractional part")]
    StrayLetter(char),

    /// El exponente excede el rango admitido.
    #[error("Exponent out of range, valid range is [0, {MAX_EXPONENT}]")]
    ExponentRange,
}

/// Literal numérico reconocido.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Numeral {
    /// Valor normalizado como texto.
    pub text: String,

    /// Sea [`Symbol::Int`] o [`Symbol::Real`].
    pub kind: Symbol,
}

/// Estados del autómata numérico.
#[derive(Copy, Clone, Debug)]
enum State {
    /// Se ha leído exactamente el primer dígito. No admite exponente.
    Start,

    /// Entero sin signo.
    Unsigned,

    /// Punto inmediato tras el primer dígito, exige un dígito.
    FractionStart,

    /// Parte fraccionaria decimal.
    Fraction,

    /// Se encontró `e` o `E`.
    Exponent,

    /// Se encontró el signo del exponente.
    SignedExponent,

    /// Dígitos del exponente.
    ExponentDigits,
}

/// Clases de carácter relevantes para el autómata numérico.
#[derive(Copy, Clone, Debug)]
enum Class {
    Digit(u32),
    Point,
    Exp,
    Plus,
    Minus,
    Letter(char),
    Other,
}

impl Class {
    fn of(c: Option<char>) -> Class {
        match c {
            Some(c @ '0'..='9') => Class::Digit(c as u32 - '0' as u32),
            Some('.') => Class::Point,
            Some('e' | 'E') => Class::Exp,
            Some('+') => Class::Plus,
            Some('-') => Class::Minus,
            Some(c) if c.is_alphabetic() => Class::Letter(c),
            _ => Class::Other,
        }
    }
}

/// Acumuladores del autómata.
struct Accumulator {
    digits: String,
    fraction: u32,
    exponent: u32,
    negative: bool,
    real: bool,
}

impl Accumulator {
    fn new(first: u32) -> Self {
        let mut digits = String::new();
        digits.extend(std::char::from_digit(first, 10));

        Accumulator {
            digits,
            fraction: 0,
            exponent: 0,
            negative: false,
            real: false,
        }
    }

    fn push(&mut self, digit: u32) {
        self.digits.extend(std::char::from_digit(digit, 10));
    }

    fn push_fraction(&mut self, digit: u32) {
        self.push(digit);
        self.fraction += 1;
    }

    fn push_exponent(&mut self, digit: u32) -> Result<(), NumericError> {
        match self
            .exponent
            .checked_mul(10)
            .and_then(|p| p.checked_add(digit))
        {
            Some(p) if p <= MAX_EXPONENT => {
                self.exponent = p;
                Ok(())
            }

            _ => Err(NumericError::ExponentRange),
        }
    }

    fn finish(self) -> Numeral {
        let significant = self.digits.trim_start_matches('0');
        if !self.real {
            let text = if significant.is_empty() { "0" } else { significant };
            return Numeral {
                text: text.to_owned(),
                kind: Symbol::Int,
            };
        }

        let exponent = if self.negative {
            -(self.exponent as i64)
        } else {
            self.exponent as i64
        };

        let shift = exponent - self.fraction as i64;
        let text = if significant.is_empty() && shift >= 0 {
            String::from("0")
        } else if shift >= 0 {
            let mut text = String::from(significant);
            text.extend(std::iter::repeat('0').take(shift as usize));
            text
        } else {
            let scale = (-shift) as usize;
            let mut text = String::with_capacity(scale + 2);

            // Se rellena con ceros para que haya al menos un dígito entero
            let width = significant.len().max(scale + 1);
            text.extend(std::iter::repeat('0').take(width - significant.len()));
            text.push_str(significant);
            text.insert(width - scale, '.');
            text
        };

        Numeral {
            text,
            kind: Symbol::Real,
        }
    }
}

/// Clasifica un literal numérico cuyo primer dígito ya fue leído.
///
/// El carácter que termina el literal se devuelve a la entrada
/// para que el lexer lo vuelva a clasificar.
pub fn recognize<F: Feed + ?Sized>(first: u32, feed: &mut F) -> Result<Numeral, NumericError> {
    use State::*;

    let mut accumulator = Accumulator::new(first);
    let mut state = Start;

    loop {
        let next = feed.next_char()?;
        if let Some(c) = next {
            feed.append(c);
        }

        state = match (state, Class::of(next)) {
            (Start | Unsigned, Class::Digit(digit)) => {
                accumulator.push(digit);
                Unsigned
            }

            // Un punto inmediato exige dígitos fraccionarios
            (Start, Class::Point) => {
                accumulator.real = true;
                FractionStart
            }

            (Unsigned, Class::Point) => {
                accumulator.real = true;
                Fraction
            }

            (Unsigned | Fraction, Class::Exp) => {
                accumulator.real = true;
                Exponent
            }

            (FractionStart | Fraction, Class::Digit(digit)) => {
                accumulator.push_fraction(digit);
                Fraction
            }

            (FractionStart, _) => return Err(NumericError::MissingFraction),
            (Fraction, Class::Letter(c)) => return Err(NumericError::StrayLetter(c)),

            (Exponent, Class::Plus) => SignedExponent,
            (Exponent, Class::Minus) => {
                accumulator.negative = true;
                SignedExponent
            }

            (Exponent | SignedExponent | ExponentDigits, Class::Digit(digit)) => {
                accumulator.push_exponent(digit)?;
                ExponentDigits
            }

            (Exponent | SignedExponent, _) => return Err(NumericError::MissingExponent),

            // Cualquier otro carácter termina el literal
            (Start | Unsigned | Fraction | ExponentDigits, _) => {
                feed.retract();
                return Ok(accumulator.finish());
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Fuente de caracteres de prueba sobre una cadena.
    struct Text {
        chars: Vec<char>,
        index: usize,
        ended: bool,
        lexeme: String,
    }

    impl Text {
        fn new(text: &str) -> Self {
            Text {
                chars: text.chars().collect(),
                index: 0,
                ended: false,
                lexeme: String::new(),
            }
        }

        fn rest(&self) -> String {
            self.chars[self.index..].iter().collect()
        }
    }

    impl Feed for Text {
        fn next_char(&mut self) -> io::Result<Option<char>> {
            self.ended = self.index == self.chars.len();
            let next = self.chars.get(self.index).copied();
            if next.is_some() {
                self.index += 1;
            }

            Ok(next)
        }

        fn append(&mut self, c: char) {
            self.lexeme.push(c);
        }

        fn retract(&mut self) {
            if !self.ended {
                self.index -= 1;
                self.lexeme.pop();
            }
        }
    }

    /// Reconoce un literal completo, incluyendo su primer dígito.
    fn scan(literal: &str) -> (Result<Numeral, NumericError>, String) {
        let mut text = Text::new(&literal[1..]);
        let first = literal.chars().next().unwrap().to_digit(10).unwrap();

        let result = recognize(first, &mut text);
        (result, text.rest())
    }

    fn numeral(literal: &str) -> Numeral {
        scan(literal).0.unwrap()
    }

    fn int(text: &str) -> Numeral {
        Numeral {
            text: text.to_owned(),
            kind: Symbol::Int,
        }
    }

    fn real(text: &str) -> Numeral {
        Numeral {
            text: text.to_owned(),
            kind: Symbol::Real,
        }
    }

    #[test]
    fn integers() {
        assert_eq!(numeral("7 "), int("7"));
        assert_eq!(numeral("123"), int("123"));
        assert_eq!(numeral("007 "), int("7"));
        assert_eq!(numeral("0"), int("0"));
    }

    #[test]
    fn terminator_is_retracted() {
        let (result, rest) = scan("42+x");
        assert_eq!(result.unwrap(), int("42"));
        assert_eq!(rest, "+x");

        let (result, rest) = scan("12a");
        assert_eq!(result.unwrap(), int("12"));
        assert_eq!(rest, "a");

        let (result, rest) = scan("1.25)");
        assert_eq!(result.unwrap(), real("1.25"));
        assert_eq!(rest, ")");
    }

    #[test]
    fn fractions() {
        assert_eq!(numeral("3.14 "), real("3.14"));
        assert_eq!(numeral("0.05 "), real("0.05"));
        assert_eq!(numeral("1.50 "), real("1.50"));
        assert_eq!(numeral("12. "), real("12"));
    }

    #[test]
    fn exponents() {
        assert_eq!(numeral("1.5e3 "), real("1500"));
        assert_eq!(numeral("25e-1 "), real("2.5"));
        assert_eq!(numeral("2.5E-1 "), real("0.25"));
        assert_eq!(numeral("12e+2 "), real("1200"));
        assert_eq!(numeral("30e0"), real("30"));
        assert_eq!(numeral("0.0e5 "), real("0"));
    }

    #[test]
    fn exponent_needs_two_leading_digits() {
        let (result, rest) = scan("1e2");
        assert_eq!(result.unwrap(), int("1"));
        assert_eq!(rest, "e2");

        let (result, rest) = scan("3E ");
        assert_eq!(result.unwrap(), int("3"));
        assert_eq!(rest, "E ");
    }

    #[test]
    fn point_right_after_first_digit_needs_digits() {
        assert_matches!(scan("1.e").0, Err(NumericError::MissingFraction));
        assert_matches!(scan("1. ").0, Err(NumericError::MissingFraction));
        assert_matches!(scan("1.").0, Err(NumericError::MissingFraction));
    }

    #[test]
    fn malformed_exponents() {
        assert_matches!(scan("10e ").0, Err(NumericError::MissingExponent));
        assert_matches!(scan("15e+x").0, Err(NumericError::MissingExponent));
        assert_matches!(scan("1.5E-").0, Err(NumericError::MissingExponent));
        assert_matches!(scan("10e999").0, Err(NumericError::ExponentRange));
    }

    #[test]
    fn stray_letter_in_fraction() {
        assert_matches!(scan("1.5x").0, Err(NumericError::StrayLetter('x')));
    }

    #[test]
    fn real_text_round_trips() {
        for literal in ["3.14", "0.05", "1.5e3", "2.5E-1", "6.02e2", "9.999e-3", "10.0"] {
            let first = numeral(literal);
            assert_eq!(first.kind, Symbol::Real);

            let again = numeral(&first.text);
            assert_eq!(again.text, first.text, "literal {}", literal);
        }
    }
}
