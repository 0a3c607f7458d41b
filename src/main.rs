//! Punto de entrada ("driver").
//!
//! Este módulo abre los archivos de entrada y salida, configura
//! el logging y expone una CLI sobre [`Session`].

use anyhow::{anyhow, bail, Context};
use clap::{crate_version, Arg, Command};
use exprc::{
    error::Diagnostics,
    lex::Lexer,
    semantic::Listing,
    session::{Failure, Session, Trace},
    source::Cursor,
};

use log::{info, LevelFilter};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, LineWriter, Write},
    str::FromStr,
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("Arithmetic expression compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .default_value("input.txt")
                .help("Source file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("output.txt")
                .help("Quadruple listing ('-' for stdout)"),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Write the token listing instead of quadruples"),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .takes_value(true)
                .value_name("LIST")
                .use_value_delimiter(true)
                .possible_values(["tokens", "stack", "postfix", "all"])
                .help("Log internal events of the given phases"),
        )
        .get_matches();

    let mut trace = Trace::empty();
    for name in args.values_of("trace").into_iter().flatten() {
        trace |= Trace::from_str(name).map_err(|()| anyhow!("Bad trace name: {}", name))?;
    }

    // Las trazas se emiten en nivel debug, RUST_LOG tiene la última palabra
    let level = if trace.is_empty() {
        LevelFilter::Warn
    } else {
        LevelFilter::Debug
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let input = args.value_of("input").unwrap_or("input.txt");
    let output = args.value_of("output").unwrap_or("output.txt");

    let (name, reader): (&str, Box<dyn BufRead>) = match input {
        "-" => ("<stdin>", Box::new(io::stdin().lock())),
        path => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            (path, Box::new(BufReader::new(file)))
        }
    };

    // Cada línea se descarga de inmediato, de manera que un error
    // no descarta los cuádruplos ya emitidos
    let writer: Box<dyn Write> = match output {
        "-" => Box::new(io::stdout()),
        path => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            Box::new(LineWriter::new(file))
        }
    };

    if args.is_present("tokens") {
        return list_tokens(name, reader, writer);
    }

    let result = Session::new(name)
        .input(reader)
        .sink(Listing::new(writer))
        .trace(trace)
        .run();

    match result {
        Ok(summary) => {
            if !summary.warnings.is_empty() {
                eprint!("{}", summary.warnings);
            }

            info!(
                "{}: {} quadruples written to {}, result in {}",
                name,
                summary.quadruples,
                output,
                summary.value.as_deref().unwrap_or("nothing")
            );

            Ok(())
        }

        Err(Failure::Compile(diagnostics)) => {
            eprint!("{}", diagnostics);
            bail!("Failed to compile: {}", name)
        }

        Err(Failure::Precondition(error)) => Err(error.into()),
    }
}

/// Escribe un token `(CLASE, lexema)` por línea.
fn list_tokens(
    name: &str,
    reader: Box<dyn BufRead>,
    mut writer: Box<dyn Write>,
) -> anyhow::Result<()> {
    let mut lexer = Lexer::new(Cursor::new(reader, name));
    let mut failure = None;

    for result in lexer.by_ref() {
        match result {
            Ok(token) => {
                let token = token.val();
                writeln!(writer, "({}, {})", token.kind(), token.lexeme())
                    .context("Failed to write token listing")?;
            }

            Err(error) => {
                failure = Some(error);
                break;
            }
        }
    }

    let failed = failure.is_some();
    let mut diagnostics = Diagnostics::from(lexer.into_diagnostics());
    if let Some(error) = failure {
        diagnostics.push(error);
    }

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
    }

    if failed {
        bail!("Failed to scan: {}", name);
    }

    Ok(())
}
