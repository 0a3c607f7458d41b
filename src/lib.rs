//! Compilador de expresiones aritméticas a código de tres direcciones.
//!
//! # Front end
//! La entrada es un flujo de caracteres que se lee línea por línea
//! por medio de un cursor definido en [`source`]. Este flujo se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene un flujo
//! de tokens. Los literales numéricos se reconocen con un autómata
//! aparte, descrito en [`numeric`]. Los tokens se validan contra la
//! gramática de expresiones por medio de análisis sintáctico predictivo
//! en [`parse`].
//!
//! # Generación
//! Cada terminal aceptado por el parser se entrega de inmediato al
//! generador de [`semantic`], que convierte la expresión a notación
//! postfija y la evalúa emitiendo cuádruplos, descritos en [`ir`].
//! No se construye un árbol sintáctico intermedio.
//!
//! La orquestación de todas las fases, así como la configuración de
//! trazas, corresponde a [`session`]. Los errores de todas las fases
//! se reportan mediante [`error::Diagnostics`].

pub mod error;
pub mod ir;
pub mod lex;
pub mod numeric;
pub mod parse;
pub mod semantic;
pub mod session;
pub mod source;
pub mod token;
