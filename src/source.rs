//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el compilador construye
//! deben llevar cuenta de posiciones o rangos de ubicaciones en
//! el código fuente original, lo cual permite determinar un punto
//! exacto o aproximado en donde ocurre un error.
//!
//! Este módulo también contiene al [`Cursor`], el único buffer de
//! línea del compilador. Tanto el lexer como el reconocedor numérico
//! avanzan y retroceden sobre el mismo cursor, nunca sobre copias.

use std::{
    cell::RefCell,
    fmt::{self, Debug, Display, Formatter},
    io::{self, BufRead},
    iter,
    ops::Range,
    rc::Rc,
};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    /// Transforma el valor con la misma ubicación.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            location: self.location,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una ubicación está conformada por un origen y un rango de posiciones.
///
/// El final del rango es exclusivo.
#[derive(Clone)]
pub struct Location {
    from: Rc<Source>,
    position: Range<Position>,
}

impl Location {
    /// Obtiene la posición de inicio.
    pub fn start(&self) -> Position {
        self.position.start
    }

    /// Obtiene la posición de fin.
    pub fn end(&self) -> Position {
        self.position.end
    }

    /// Obtiene el origen de la ubicación.
    pub fn source(&self) -> &Source {
        &self.from
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.from.name)?;

        let Range { start, end } = self.position;
        if end == start.advance() {
            // Solo se señala una columna en específico
            write!(formatter, "{}", start)
        } else {
            write!(formatter, "[{}-{}]", start, end.back())
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Construye una posición a partir de sus partes.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Decrementa el número de columna.
    pub fn back(self) -> Position {
        Position {
            line: self.line,
            column: self.column.saturating_sub(1).max(1),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Nombre de origen e histórico interior de líneas.
///
/// Solo se registran las líneas no vacías, junto a su número
/// de línea físico.
pub struct Source {
    name: String,
    lines: RefCell<Vec<(u32, String)>>,
}

impl Source {
    /// Invoca a `callback` con el texto de una línea, si fue leída.
    pub fn with_line<F>(&self, line: u32, callback: F) -> fmt::Result
    where
        F: FnOnce(&str) -> fmt::Result,
    {
        let lines = self.lines.borrow();
        match lines.iter().find(|(number, _)| *number == line) {
            Some((_, text)) => callback(text),
            None => Ok(()),
        }
    }
}

/// Buffer de línea con índice de lectura.
///
/// El cursor lee línea por línea de un [`BufRead`], descartando
/// líneas en blanco. A cada línea leída se le agrega un espacio
/// sintético al final, de forma que el último token de una línea
/// siempre termine por lookahead sin leer más allá del buffer.
pub struct Cursor<R> {
    reader: R,
    source: Rc<Source>,
    line: Vec<char>,
    index: usize,
    line_number: u32,
    read: u32,
    fetched: u32,
    drained: bool,
    ended: bool,
    last: Position,
}

impl<R: BufRead> Cursor<R> {
    /// Crea un cursor sobre un flujo de entrada con un nombre de origen.
    pub fn new<S: Into<String>>(reader: R, name: S) -> Self {
        let source = Rc::new(Source {
            name: name.into(),
            lines: Default::default(),
        });

        Cursor {
            reader,
            source,
            line: Vec::new(),
            index: 0,
            line_number: 1,
            read: 0,
            fetched: 0,
            drained: false,
            ended: false,
            last: Position::default(),
        }
    }

    /// Obtiene el siguiente carácter, o `None` al final de la entrada.
    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.index == self.line.len() && !self.fetch()? {
            self.ended = true;
            return Ok(None);
        }

        self.ended = false;
        let c = self.line[self.index];

        self.last = Position::new(self.line_number, self.index as u32 + 1);
        self.index += 1;

        Ok(Some(c))
    }

    /// Devuelve el último carácter leído al buffer.
    ///
    /// Retorna `false` si no había nada que devolver, lo cual ocurre
    /// cuando la lectura anterior encontró el final de la entrada.
    pub fn retract(&mut self) -> bool {
        if self.ended || self.index == 0 {
            return false;
        }

        self.index -= 1;
        true
    }

    /// Determina si aún quedan caracteres significativos.
    ///
    /// Un resto de línea compuesto solo por espacios en blanco no
    /// cuenta, en cuyo caso se intenta leer la siguiente línea.
    pub fn has_next(&mut self) -> io::Result<bool> {
        loop {
            if self.line[self.index..].iter().any(|c| !c.is_whitespace()) {
                return Ok(true);
            } else if !self.fetch()? {
                return Ok(false);
            }
        }
    }

    /// Posición del siguiente carácter a leer.
    pub fn position(&self) -> Position {
        Position::new(self.line_number, self.index as u32 + 1)
    }

    /// Posición del último carácter leído.
    pub fn last(&self) -> Position {
        self.last
    }

    /// Cantidad de líneas no vacías leídas hasta el momento.
    pub fn fetched(&self) -> u32 {
        self.fetched
    }

    /// Construye una ubicación sobre este origen.
    pub fn locate(&self, start: Position, end: Position) -> Location {
        let end = if end.line == start.line && end.column <= start.column {
            start.advance()
        } else {
            end
        };

        Location {
            from: Rc::clone(&self.source),
            position: start..end,
        }
    }

    /// Ubicación del siguiente carácter a leer.
    pub fn here(&self) -> Location {
        let position = self.position();
        self.locate(position, position.advance())
    }

    fn fetch(&mut self) -> io::Result<bool> {
        let mut text = String::new();
        while !self.drained {
            text.clear();
            if self.reader.read_line(&mut text)? == 0 {
                self.drained = true;
                break;
            }

            self.read += 1;

            let line = text.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() {
                continue;
            }

            self.fetched += 1;
            self.line_number = self.read;
            self.line = line.chars().chain(iter::once(' ')).collect();
            self.index = 0;

            self.source
                .lines
                .borrow_mut()
                .push((self.read, line.to_owned()));

            return Ok(true);
        }

        Ok(false)
    }
}
