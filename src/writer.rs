use std::{
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use colored::{ColoredString, Colorize};

use trace2prog::ParseError;

use crate::colors::{GENERAL_TEXT_COLOR, OUR_YELLOW};

/// Collects one line of colored pieces at a time and flushes them to the sink.
pub struct Writer {
    buffer: Vec<ColoredString>,
    sink: BufWriter<Box<dyn Write + Send>>,
}

impl Writer {
    pub fn initialize(output: Option<&Path>) -> anyhow::Result<Self> {
        // colored drops styling on stderr when stdout is redirected, keep it on
        colored::control::set_override(output.is_none());

        let sink: Box<dyn Write + Send> = match output {
            Some(path) => Box::new(
                std::fs::File::options()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .with_context(|| format!("could not open or create {}", path.display()))?,
            ),
            None => Box::new(std::io::stderr()),
        };
        Ok(Self::with_sink(sink))
    }

    pub fn with_sink(sink: Box<dyn Write + Send>) -> Self {
        Writer {
            buffer: Vec::new(),
            sink: BufWriter::new(sink),
        }
    }

    pub fn write_general_text(&mut self, text: &str) {
        self.buffered_write(text.custom_color(*GENERAL_TEXT_COLOR));
    }

    pub fn write_parenthesis(&mut self, text: &str) {
        self.write_general_text(" (");
        self.buffered_write(text.custom_color(*OUR_YELLOW));
        self.write_general_text(")");
    }

    #[inline(always)]
    pub fn buffered_write(&mut self, data: ColoredString) {
        self.buffer.push(data);
    }

    pub fn extend(&mut self, line: impl IntoIterator<Item = ColoredString>) {
        self.buffer.extend(line);
    }

    /// Reports every skipped line and flushes, so they show even when no program is printed.
    pub fn write_line_errors(&mut self, errors: &[ParseError]) -> std::io::Result<()> {
        for error in errors {
            self.write_general_text(&format!("skipped line {}", error.line));
            self.write_parenthesis(&error.reason);
            self.write_general_text("\n");
        }
        self.flush_buffer()
    }

    pub fn flush_buffer(&mut self) -> std::io::Result<()> {
        for colored_text in self.buffer.drain(..) {
            write!(self.sink, "{colored_text}")?;
        }
        self.sink.flush()
    }
}
