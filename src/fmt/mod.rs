//! The output sink: a JSON text writer.
//!
//! [`Writer`] accepts primitive values and object/array markers and accumulates JSON text. It
//! tracks nesting so that separators, indentation, and the `key: value` discipline of objects are
//! handled in one place; misuse is reported as a [`WriteError`] rather than producing malformed
//! text.
//!
//! # Example
//! ```rust
//! # use jsonmap::*;
//! let mut w = Writer::with_config(WriterConfig {
//!     pretty_print: true,
//!     indent: 2,
//!     ..Default::default()
//! });
//!
//! w.write_object_start().unwrap();
//! w.write_property_name("name").unwrap();
//! w.write_str("Ferris").unwrap();
//! w.write_property_name("legs").unwrap();
//! w.write_array_start().unwrap();
//! w.write_i32(6).unwrap();
//! w.write_array_end().unwrap();
//! w.write_object_end().unwrap();
//!
//! assert_eq!(
//!     w.as_str(),
//!     r#"{
//!   "name": "Ferris",
//!   "legs": [
//!     6
//!   ]
//! }"#
//! );
//! ```
use thiserror::Error;

/// Switches for the [`Writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Break objects and arrays over indented lines.
    pub pretty_print: bool,
    /// Spaces per nesting level when pretty printing.
    pub indent: usize,
    /// Wrap values whose runtime type differs from the declared slot type in type-hint envelopes.
    pub type_hinting: bool,
    /// The envelope key holding the concrete type name.
    pub hint_type_name: String,
    /// The envelope key holding the wrapped value.
    pub hint_value_name: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            pretty_print: false,
            indent: 4,
            type_hinting: false,
            hint_type_name: String::from("__type__"),
            hint_value_name: String::from("__value__"),
        }
    }
}

/// A write the sink can't accept.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WriteError {
    /// NaN and the infinities have no JSON representation.
    #[error("the number {0} has no JSON representation")]
    NonFinite(f64),
    /// A value was written inside an object without a property name before it.
    #[error("a property name is expected before the value")]
    ExpectedName,
    /// A property name was written outside of an object, or twice in a row.
    #[error("a property name is not expected here")]
    UnexpectedName,
    /// A closing marker did not match an open object or array.
    #[error("there is no open {0} to close")]
    NotOpen(&'static str),
    /// An object was closed after a property name without its value.
    #[error("the last property is missing its value")]
    MissingValue,
}

type Res = Result<(), WriteError>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ctx {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    ctx: Ctx,
    count: usize,
    expect_name: bool,
}

/// Accumulates JSON text.
#[derive(Debug, Default)]
pub struct Writer {
    buf: String,
    config: WriterConfig,
    frames: Vec<Frame>,
}

impl Writer {
    /// A compact writer.
    pub fn new() -> Self {
        Writer::default()
    }

    /// A writer with the given configuration.
    pub fn with_config(config: WriterConfig) -> Self {
        Writer {
            buf: String::new(),
            config,
            frames: Vec::new(),
        }
    }

    /// The writer's configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut WriterConfig {
        &mut self.config
    }

    /// Are type-hint envelopes written.
    pub fn type_hinting(&self) -> bool {
        self.config.type_hinting
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the writer, returning the text.
    pub fn into_string(self) -> String {
        self.buf
    }

    /// Clear the text and any open objects or arrays, keeping the configuration.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.frames.clear();
    }

    /// Write `null`.
    pub fn write_null(&mut self) -> Res {
        self.before_value()?;
        self.buf.push_str("null");
        self.after_value();
        Ok(())
    }

    /// Write `true` or `false`.
    pub fn write_bool(&mut self, b: bool) -> Res {
        self.before_value()?;
        self.buf.push_str(if b { "true" } else { "false" });
        self.after_value();
        Ok(())
    }

    /// Write an integer.
    pub fn write_i32(&mut self, n: i32) -> Res {
        self.write_num(n)
    }

    /// Write an integer.
    pub fn write_i64(&mut self, n: i64) -> Res {
        self.write_num(n)
    }

    /// Write an unsigned integer.
    pub fn write_u64(&mut self, n: u64) -> Res {
        self.write_num(n)
    }

    /// Write a double.
    ///
    /// Integral values keep a fractional part (`1.0`) so they read back as doubles.
    pub fn write_f64(&mut self, n: f64) -> Res {
        if !n.is_finite() {
            return Err(WriteError::NonFinite(n));
        }
        self.write_float(n)
    }

    /// Write a single precision float in its shortest form.
    pub fn write_f32(&mut self, n: f32) -> Res {
        if !n.is_finite() {
            return Err(WriteError::NonFinite(n as f64));
        }
        self.write_float(n)
    }

    /// Write a string, escaping as needed.
    pub fn write_str(&mut self, s: &str) -> Res {
        self.before_value()?;
        quote(&mut self.buf, s);
        self.after_value();
        Ok(())
    }

    /// Write an object key. Only valid inside an object, before each value.
    pub fn write_property_name(&mut self, name: &str) -> Res {
        let pretty = self.config.pretty_print;
        let frame = match self.frames.last_mut() {
            Some(f) if f.ctx == Ctx::Object && f.expect_name => f,
            _ => return Err(WriteError::UnexpectedName),
        };
        frame.expect_name = false;
        let first = frame.count == 0;

        if !first {
            self.buf.push(',');
        }
        if pretty {
            self.newline_indent(self.frames.len());
        }
        quote(&mut self.buf, name);
        self.buf.push_str(if pretty { ": " } else { ":" });
        Ok(())
    }

    /// Open an object.
    pub fn write_object_start(&mut self) -> Res {
        self.open(Ctx::Object, '{')
    }

    /// Close the innermost object.
    pub fn write_object_end(&mut self) -> Res {
        self.close(Ctx::Object, '}')
    }

    /// Open an array.
    pub fn write_array_start(&mut self) -> Res {
        self.open(Ctx::Array, '[')
    }

    /// Close the innermost array.
    pub fn write_array_end(&mut self) -> Res {
        self.close(Ctx::Array, ']')
    }

    fn open(&mut self, ctx: Ctx, c: char) -> Res {
        self.before_value()?;
        self.buf.push(c);
        self.frames.push(Frame {
            ctx,
            count: 0,
            expect_name: ctx == Ctx::Object,
        });
        Ok(())
    }

    fn close(&mut self, ctx: Ctx, c: char) -> Res {
        let name = match ctx {
            Ctx::Object => "object",
            Ctx::Array => "array",
        };
        match self.frames.last() {
            Some(f) if f.ctx == ctx => {
                if ctx == Ctx::Object && !f.expect_name {
                    return Err(WriteError::MissingValue);
                }
            }
            _ => return Err(WriteError::NotOpen(name)),
        }

        let count = self.frames.pop().map(|f| f.count).unwrap_or_default();
        if self.config.pretty_print && count > 0 {
            self.newline_indent(self.frames.len());
        }
        self.buf.push(c);
        self.after_value();
        Ok(())
    }

    fn before_value(&mut self) -> Res {
        let pretty = self.config.pretty_print;
        let depth = self.frames.len();
        match self.frames.last() {
            None => Ok(()),
            Some(f) if f.ctx == Ctx::Object => {
                if f.expect_name {
                    Err(WriteError::ExpectedName)
                } else {
                    Ok(())
                }
            }
            Some(f) => {
                if f.count > 0 {
                    self.buf.push(',');
                }
                if pretty {
                    self.newline_indent(depth);
                }
                Ok(())
            }
        }
    }

    fn after_value(&mut self) {
        if let Some(f) = self.frames.last_mut() {
            f.count += 1;
            f.expect_name = f.ctx == Ctx::Object;
        }
    }

    fn newline_indent(&mut self, level: usize) {
        self.buf.push('\n');
        for _ in 0..level * self.config.indent {
            self.buf.push(' ');
        }
    }

    fn write_num<N: lexical_core::ToLexical>(&mut self, n: N) -> Res {
        self.before_value()?;
        push_lexical(&mut self.buf, n);
        self.after_value();
        Ok(())
    }

    fn write_float<N: lexical_core::ToLexical>(&mut self, n: N) -> Res {
        self.before_value()?;
        let start = self.buf.len();
        push_lexical(&mut self.buf, n);
        if !self.buf[start..].contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
            self.buf.push_str(".0");
        }
        self.after_value();
        Ok(())
    }
}

fn push_lexical<N: lexical_core::ToLexical>(buf: &mut String, n: N) {
    let mut bytes = [0u8; lexical_core::BUFFER_SIZE];
    // lexical output is ascii
    for &b in lexical_core::write(n, &mut bytes).iter() {
        buf.push(b as char);
    }
}

fn quote(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{8}' => buf.push_str("\\b"),
            '\u{c}' => buf.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                buf.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_nesting() {
        let mut w = Writer::new();
        w.write_array_start().unwrap();
        w.write_object_start().unwrap();
        w.write_property_name("a").unwrap();
        w.write_null().unwrap();
        w.write_property_name("b").unwrap();
        w.write_array_start().unwrap();
        w.write_array_end().unwrap();
        w.write_object_end().unwrap();
        w.write_bool(false).unwrap();
        w.write_array_end().unwrap();
        assert_eq!(w.as_str(), r#"[{"a":null,"b":[]},false]"#);
    }

    #[test]
    fn numbers() {
        let mut w = Writer::new();
        w.write_array_start().unwrap();
        w.write_i32(-7).unwrap();
        w.write_u64(u64::MAX).unwrap();
        w.write_f64(1.0).unwrap();
        w.write_f64(0.25).unwrap();
        w.write_f32(0.1).unwrap();
        w.write_array_end().unwrap();
        assert_eq!(w.as_str(), "[-7,18446744073709551615,1.0,0.25,0.1]");

        assert_eq!(
            Writer::new().write_f64(f64::INFINITY),
            Err(WriteError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn escaping() {
        let mut w = Writer::new();
        w.write_str("a\"b\\c\n\u{1}é").unwrap();
        assert_eq!(w.as_str(), r#""a\"b\\c\n\u0001é""#);
    }

    #[test]
    fn misuse() {
        let mut w = Writer::new();
        assert_eq!(w.write_property_name("x"), Err(WriteError::UnexpectedName));
        w.write_object_start().unwrap();
        assert_eq!(w.write_i32(1), Err(WriteError::ExpectedName));
        w.write_property_name("x").unwrap();
        assert_eq!(w.write_object_end(), Err(WriteError::MissingValue));
        assert_eq!(w.write_array_end(), Err(WriteError::NotOpen("array")));

        w.reset();
        assert_eq!(w.as_str(), "");
        w.write_i32(1).unwrap();
        assert_eq!(w.as_str(), "1");
    }
}
