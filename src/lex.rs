//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el flujo de
//! caracteres de un [`Cursor`] en unidades léxicas denominadas tokens.
//! Los espacios en blanco se descartan durante esta operación. Cada
//! token emitido está asociado a una ubicación en el código fuente
//! original.
//!
//! # Maximal munch
//! El lexer es una máquina de estados sobre clases de carácter. Cada
//! token consume el lexema más largo posible; cuando para decidirlo
//! hizo falta leer un carácter de más, ese carácter se devuelve al
//! cursor antes de emitir el token. Los literales numéricos se delegan
//! al autómata de [`numeric`](crate::numeric).
//!
//! # Errores
//! Un carácter desconocido o un `:` que no forma `:=` se reportan como
//! diagnóstico y no detienen el análisis: el lexema ilegal se descarta
//! y el análisis continúa en el carácter siguiente. Un literal numérico
//! mal formado, por el contrario, aborta el token y se propaga.

use crate::{
    error::{Classify, Kind},
    numeric::{self, Feed, NumericError},
    source::{Cursor, Located, Location, Position},
    token::{Symbol, Token},
};

use log::warn;
use std::io::{self, BufRead};
use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Error de E/S originado por el [`Cursor`].
    #[error(transparent)]
    Input(#[from] io::Error),

    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),

    /// Se esperaba un carácter específico tras el lexema.
    #[error("Expected {expected:?} after {lexeme:?}")]
    Expected { lexeme: String, expected: char },

    /// Literal numérico mal formado.
    #[error(transparent)]
    Numeric(NumericError),
}

impl LexerError {
    /// Determina si el error solo descarta el lexema actual.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LexerError::BadChar(_) | LexerError::Expected { .. })
    }
}

impl From<NumericError> for LexerError {
    fn from(error: NumericError) -> Self {
        match error {
            NumericError::Input(error) => LexerError::Input(error),
            error => LexerError::Numeric(error),
        }
    }
}

impl Classify for LexerError {
    fn kind(&self) -> Kind {
        match self {
            LexerError::Input(_) => Kind::Io,
            LexerError::Numeric(_) => Kind::Numeric,
            _ => Kind::Lexical,
        }
    }
}

/// Resultado de una ejecución del autómata.
#[derive(Debug)]
pub enum Scan {
    /// Se reconoció un token.
    Token(Located<Token>),

    /// No se produjo token: solo había espacios en blanco o se
    /// descartó un lexema ilegal. Se debe volver a intentar.
    Retry,
}

/// Clase de un carácter de entrada.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Class {
    Digit(u32),
    Letter,
    Less,
    Greater,
    Equal,
    Colon,
    Plus,
    Minus,
    Times,
    Slash,
    Open,
    Close,
    Blank,
    End,
    Invalid,
}

impl Class {
    /// Clasifica un carácter, donde `None` es el final de la entrada.
    pub fn of(c: Option<char>) -> Class {
        match c {
            None => Class::End,
            Some(c @ '0'..='9') => Class::Digit(c as u32 - '0' as u32),
            Some('<') => Class::Less,
            Some('>') => Class::Greater,
            Some('=') => Class::Equal,
            Some(':') => Class::Colon,
            Some('+') => Class::Plus,
            Some('-') => Class::Minus,
            Some('*') => Class::Times,
            Some('/') => Class::Slash,
            Some('(') => Class::Open,
            Some(')') => Class::Close,
            Some(c) if c.is_alphabetic() => Class::Letter,
            Some(c) if c.is_whitespace() => Class::Blank,
            Some(_) => Class::Invalid,
        }
    }
}

/// Posibles estados del lexer.
#[derive(Copy, Clone, Debug)]
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Término que puede ser un identificador o una palabra clave.
    Word,

    /// Se encontró `<`, puede seguir `=` o `>`.
    Less,

    /// Se encontró `>`, puede seguir `=`.
    Greater,

    /// Se encontró `:`, debe seguir `=`.
    Colon,
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<R> {
    cursor: Cursor<R>,
    diagnostics: Vec<Located<LexerError>>,
}

/// Vista de un token en construcción sobre el cursor del lexer.
///
/// Esta es la implementación de [`Feed`] que se presta al
/// reconocedor numérico.
struct Window<'a, R> {
    cursor: &'a mut Cursor<R>,
    lexeme: String,
}

impl<R: BufRead> Feed for Window<'_, R> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        self.cursor.next_char()
    }

    fn append(&mut self, c: char) {
        self.lexeme.push(c);
    }

    fn retract(&mut self) {
        if self.cursor.retract() {
            self.lexeme.pop();
        }
    }
}

impl<R: BufRead> Window<'_, R> {
    /// Lee, acumula y clasifica el siguiente carácter.
    fn read(&mut self) -> io::Result<(Option<char>, Class)> {
        let next = self.next_char()?;
        if let Some(c) = next {
            self.append(c);
        }

        Ok((next, Class::of(next)))
    }

    /// Construye un token con el lexema acumulado.
    fn emit(&mut self, kind: Symbol) -> Token {
        Token::new(kind, std::mem::take(&mut self.lexeme))
    }
}

impl<R: BufRead> Lexer<R> {
    /// Crea un lexer en estado inicial a partir de un cursor.
    pub fn new(cursor: Cursor<R>) -> Self {
        Lexer {
            cursor,
            diagnostics: Vec::new(),
        }
    }

    /// Determina si la entrada aún contiene caracteres significativos.
    pub fn has_next(&mut self) -> Result<bool, Located<LexerError>> {
        self.cursor
            .has_next()
            .map_err(|error| Located::at(error.into(), self.cursor.here()))
    }

    /// Ejecuta el autómata desde el estado inicial hasta su estado final.
    ///
    /// Los errores recuperables se acumulan como diagnósticos y
    /// resultan en [`Scan::Retry`].
    pub fn get_next(&mut self) -> Result<Scan, Located<LexerError>> {
        let mut start = self.cursor.position();
        let outcome = self.lex(&mut start);

        let location = self.cursor.locate(start, self.cursor.position());
        match outcome {
            Ok(Some(token)) => Ok(Scan::Token(Located::at(token, location))),
            Ok(None) => Ok(Scan::Retry),

            Err(error) if error.is_recoverable() => {
                warn!("{}: {}", location, error);
                self.diagnostics.push(Located::at(error, location));

                Ok(Scan::Retry)
            }

            Err(error) => Err(Located::at(error, location)),
        }
    }

    /// Ubicación del siguiente carácter a leer.
    pub fn here(&self) -> Location {
        self.cursor.here()
    }

    /// Cantidad de líneas no vacías leídas.
    pub fn lines(&self) -> u32 {
        self.cursor.fetched()
    }

    /// Diagnósticos recuperables acumulados hasta el momento.
    pub fn diagnostics(&self) -> &[Located<LexerError>] {
        &self.diagnostics
    }

    /// Consume el lexer y toma ownership de sus diagnósticos.
    pub fn into_diagnostics(self) -> Vec<Located<LexerError>> {
        self.diagnostics
    }

    /// Reduce la entrada a sea una secuencia de tokens o al primer
    /// error irrecuperable.
    ///
    /// Los errores recuperables no interrumpen la secuencia, pero
    /// quedan disponibles en [`Lexer::diagnostics()`].
    pub fn try_exhaustive(&mut self) -> Result<Vec<Located<Token>>, Located<LexerError>> {
        self.collect()
    }

    fn lex(&mut self, start: &mut Position) -> Result<Option<Token>, LexerError> {
        use State::*;

        let mut feed = Window {
            cursor: &mut self.cursor,
            lexeme: String::new(),
        };

        let mut state = Start;
        loop {
            let (next, class) = feed.read()?;

            // El token comienza en el primer carácter que no es blanco
            if let Start = state {
                *start = feed.cursor.last();
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            state = match (state, class) {
                (Start, Class::Blank | Class::End) => return Ok(None),

                // Tokens triviales
                (Start, Class::Equal) => return Ok(Some(feed.emit(Symbol::Eq))),
                (Start, Class::Plus) => return Ok(Some(feed.emit(Symbol::Pl))),
                (Start, Class::Minus) => return Ok(Some(feed.emit(Symbol::Mi))),
                (Start, Class::Times) => return Ok(Some(feed.emit(Symbol::Mu))),
                (Start, Class::Slash) => return Ok(Some(feed.emit(Symbol::Di))),
                (Start, Class::Open) => return Ok(Some(feed.emit(Symbol::Lb))),
                (Start, Class::Close) => return Ok(Some(feed.emit(Symbol::Rb))),

                (Start, Class::Letter) => Word,
                (Start, Class::Less) => Less,
                (Start, Class::Greater) => Greater,
                (Start, Class::Colon) => Colon,

                // Las constantes numéricas tienen su propio autómata
                (Start, Class::Digit(first)) => {
                    let numeral = numeric::recognize(first, &mut feed)?;
                    return Ok(Some(Token::new(numeral.kind, numeral.text)));
                }

                (Start, Class::Invalid) => {
                    return Err(LexerError::BadChar(next.unwrap_or_default()))
                }

                // Extensión de términos
                (Word, Class::Letter | Class::Digit(_)) => Word,

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word, _) => {
                    feed.retract();
                    let kind = Symbol::keyword(&feed.lexeme).unwrap_or(Symbol::Id);
                    return Ok(Some(feed.emit(kind)));
                }

                (Less, Class::Equal) => return Ok(Some(feed.emit(Symbol::Le))),
                (Less, Class::Greater) => return Ok(Some(feed.emit(Symbol::Ne))),
                (Less, _) => {
                    feed.retract();
                    return Ok(Some(feed.emit(Symbol::Lt)));
                }

                (Greater, Class::Equal) => return Ok(Some(feed.emit(Symbol::Ge))),
                (Greater, _) => {
                    feed.retract();
                    return Ok(Some(feed.emit(Symbol::Gt)));
                }

                (Colon, Class::Equal) => return Ok(Some(feed.emit(Symbol::Is))),
                (Colon, _) => {
                    feed.retract();
                    return Err(LexerError::Expected {
                        lexeme: std::mem::take(&mut feed.lexeme),
                        expected: '=',
                    });
                }
            };
        }
    }
}

impl<R: BufRead> Iterator for Lexer<R> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.has_next() {
                Ok(false) => return None,
                Err(error) => return Some(Err(error)),
                Ok(true) => (),
            }

            match self.get_next() {
                Ok(Scan::Retry) => continue,
                Ok(Scan::Token(token)) => return Some(Ok(token)),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use Symbol::*;

    fn lexer(input: &str) -> Lexer<&[u8]> {
        Lexer::new(Cursor::new(input.as_bytes(), "<test>"))
    }

    fn tokens(input: &str) -> Vec<(Symbol, String)> {
        lexer(input)
            .try_exhaustive()
            .unwrap()
            .into_iter()
            .map(|token| {
                let token = token.into_inner();
                (token.kind(), token.lexeme().to_owned())
            })
            .collect()
    }

    fn kinds(input: &str) -> Vec<Symbol> {
        tokens(input).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn classes() {
        assert_eq!(Class::of(Some('7')), Class::Digit(7));
        assert_eq!(Class::of(Some('q')), Class::Letter);
        assert_eq!(Class::of(Some('\t')), Class::Blank);
        assert_eq!(Class::of(Some('#')), Class::Invalid);
        assert_eq!(Class::of(None), Class::End);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            tokens("if x1 begin End"),
            vec![
                (If, "if".into()),
                (Id, "x1".into()),
                (Begin, "begin".into()),
                (Id, "End".into()),
            ]
        );
    }

    #[test]
    fn relational_operators_use_maximal_munch() {
        assert_eq!(
            kinds("< <= <> = > >= :="),
            vec![Lt, Le, Ne, Eq, Gt, Ge, Is]
        );

        assert_eq!(kinds("a<b"), vec![Id, Lt, Id]);
        assert_eq!(kinds("a>=b>c"), vec![Id, Ge, Id, Gt, Id]);
        assert_eq!(kinds("x:=1"), vec![Id, Is, Int]);
    }

    #[test]
    fn arithmetic_without_spaces() {
        assert_eq!(
            tokens("(a+12)*3.5/b-c"),
            vec![
                (Lb, "(".into()),
                (Id, "a".into()),
                (Pl, "+".into()),
                (Int, "12".into()),
                (Rb, ")".into()),
                (Mu, "*".into()),
                (Real, "3.5".into()),
                (Di, "/".into()),
                (Id, "b".into()),
                (Mi, "-".into()),
                (Id, "c".into()),
            ]
        );
    }

    #[test]
    fn tokens_end_at_line_breaks() {
        assert_eq!(kinds("abc\n\n12\n"), vec![Id, Int]);
    }

    #[test]
    fn token_locations() {
        let tokens = lexer("\n  abc + 1").try_exhaustive().unwrap();

        let abc = tokens[0].location();
        assert_eq!(abc.start(), Position::new(2, 3));
        assert_eq!(abc.end(), Position::new(2, 6));

        let one = tokens[2].location();
        assert_eq!(one.start(), Position::new(2, 9));
        assert_eq!(one.end(), Position::new(2, 10));
    }

    #[test]
    fn bad_characters_are_skipped() {
        let mut lexer = lexer("a # b");
        let tokens = lexer.try_exhaustive().unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(lexer.diagnostics().len(), 1);

        let error = &lexer.diagnostics()[0];
        assert_matches!(error.val(), LexerError::BadChar('#'));
        assert_eq!(error.location().start(), Position::new(1, 3));
        assert_eq!(error.val().kind(), Kind::Lexical);
    }

    #[test]
    fn colon_requires_equals() {
        let mut lexer = lexer(":a");

        assert_matches!(lexer.get_next(), Ok(Scan::Retry));
        assert_matches!(
            lexer.diagnostics()[0].val(),
            LexerError::Expected { lexeme, expected: '=' } if lexeme == ":"
        );

        // El análisis continúa en el carácter siguiente
        assert_matches!(lexer.get_next(), Ok(Scan::Token(token)) if token.val().lexeme() == "a");
    }

    #[test]
    fn blanks_produce_no_token() {
        let mut lexer = lexer("  7");

        assert_matches!(lexer.get_next(), Ok(Scan::Retry));
        assert_matches!(lexer.get_next(), Ok(Scan::Retry));
        assert_matches!(lexer.get_next(), Ok(Scan::Token(_)));
        assert!(!lexer.has_next().unwrap());
    }

    #[test]
    fn malformed_number_is_fatal() {
        let mut lexer = lexer("1.e");

        assert_matches!(
            lexer.get_next(),
            Err(error) if matches!(error.val(), LexerError::Numeric(NumericError::MissingFraction))
        );
    }

    #[test]
    fn single_digit_does_not_take_an_exponent() {
        assert_eq!(
            tokens("1e2 22e1"),
            vec![(Int, "1".into()), (Id, "e2".into()), (Real, "220".into())]
        );
    }

    #[test]
    fn only_invalid_character() {
        let mut lexer = lexer("#\n");

        assert!(lexer.has_next().unwrap());
        assert_matches!(lexer.get_next(), Ok(Scan::Retry));
        assert!(!lexer.has_next().unwrap());
        assert_eq!(lexer.diagnostics().len(), 1);
    }
}
