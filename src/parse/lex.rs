use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, digit0, digit1, multispace1, not_line_ending, one_of},
    combinator::{cut, opt, recognize, value},
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0_count,
    sequence::{delimited, pair, preceded, tuple},
    Err, IResult,
};

pub(super) type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn fail<'a, T>(i: &'a str, msg: &'static str) -> Res<'a, T> {
    Err(Err::Failure(VerboseError {
        errors: vec![(i, VerboseErrorKind::Context(msg))],
    }))
}

fn line_comment(i: &str) -> Res<&str> {
    recognize(preceded(tag("//"), not_line_ending))(i)
}

fn block_comment(i: &str) -> Res<&str> {
    context(
        "unterminated block comment",
        recognize(preceded(tag("/*"), cut(pair(take_until("*/"), tag("*/"))))),
    )(i)
}

/// Whitespace, and comments when allowed.
pub(super) fn trivia(allow_comments: bool) -> impl FnMut(&str) -> Res<usize> {
    move |i: &str| {
        if allow_comments {
            many0_count(alt((multispace1, line_comment, block_comment)))(i)
        } else {
            many0_count(multispace1)(i)
        }
    }
}

/// Recognise a numeric literal, `-?(0|[1-9]digits*)(.digits)?([eE][+-]?digits)?`.
pub(super) fn number(i: &str) -> Res<&str> {
    let (rest, lit) = context(
        "number",
        recognize(tuple((
            opt(char('-')),
            alt((tag("0"), recognize(pair(one_of("123456789"), digit0)))),
            opt(pair(char('.'), cut(digit1))),
            opt(tuple((one_of("eE"), opt(one_of("+-")), cut(digit1)))),
        ))),
    )(i)?;
    // only a lone `0` can be followed by a digit
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return fail(i, "leading zeros are not allowed");
    }
    Ok((rest, lit))
}

/// `true`, `false`, or `null`. `None` represents `null`.
pub(super) fn keyword(i: &str) -> Res<Option<bool>> {
    context(
        "expected a value",
        alt((
            value(Some(true), tag("true")),
            value(Some(false), tag("false")),
            value(None, tag("null")),
        )),
    )(i)
}

/// A string delimited by `quote`, with escapes decoded.
pub(super) fn string(quote: char) -> impl FnMut(&str) -> Res<String> {
    move |i: &str| delimited(char(quote), cut(str_body(quote)), char(quote))(i)
}

fn str_body(quote: char) -> impl FnMut(&str) -> Res<String> {
    move |i: &str| {
        let mut out = String::new();
        let mut chars = i.char_indices();

        while let Some((idx, ch)) = chars.next() {
            match ch {
                c if c == quote => return Ok((&i[idx..], out)),
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, c @ ('"' | '\'' | '\\' | '/'))) => c,
                        Some((_, 'b')) => '\u{8}',
                        Some((_, 'f')) => '\u{c}',
                        Some((_, 'n')) => '\n',
                        Some((_, 'r')) => '\r',
                        Some((_, 't')) => '\t',
                        Some((u, 'u')) => {
                            let (c, used) = match unicode_escape(&i[u + 1..]) {
                                Some(x) => x,
                                None => return fail(&i[idx..], "invalid unicode escape"),
                            };
                            // hex digits are ascii, one byte per char
                            if used > 0 {
                                chars.nth(used - 1);
                            }
                            c
                        }
                        _ => return fail(&i[idx..], "invalid escape sequence"),
                    };
                    out.push(escaped);
                }
                c if (c as u32) < 0x20 => {
                    return fail(&i[idx..], "control character in string");
                }
                c => out.push(c),
            }
        }

        fail(&i[i.len()..], "unterminated string")
    }
}

/// Decode `XXXX` (and a trailing `\uXXXX` low surrogate if needed).
/// Returns the char and the number of bytes used after the `u`.
fn unicode_escape(i: &str) -> Option<(char, usize)> {
    let hi = hex4(i)?;
    if (0xD800..0xDC00).contains(&hi) {
        let rest = i.get(4..)?.strip_prefix("\\u")?;
        let lo = hex4(rest)?;
        if !(0xDC00..0xE000).contains(&lo) {
            return None;
        }
        let c = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
        char::from_u32(c).map(|c| (c, 10))
    } else {
        char::from_u32(hi).map(|c| (c, 4))
    }
}

fn hex4(i: &str) -> Option<u32> {
    let digits = i.get(..4)?;
    if digits.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(digits, 16).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert_eq!(number("123,"), Ok((",", "123")));
        assert_eq!(number("-1.5e+10]"), Ok(("]", "-1.5e+10")));
        assert_eq!(number("0.25"), Ok(("", "0.25")));
        assert!(number("-x").is_err());
        assert!(number("1.").is_err());
        assert_eq!(number("0]"), Ok(("]", "0")));
        assert_eq!(number("-0.05"), Ok(("", "-0.05")));
        assert_eq!(number("10e007"), Ok(("", "10e007")));
        assert!(number("01").is_err());
        assert!(number("-007").is_err());
        assert!(number("00.5").is_err());
    }

    #[test]
    fn test_string() {
        let mut dbl = string('"');
        assert_eq!(dbl(r#""abc" rest"#), Ok((" rest", "abc".to_string())));
        assert_eq!(
            dbl(r#""a\"b\\c\/\n\t" "#),
            Ok((" ", "a\"b\\c/\n\t".to_string()))
        );
        assert_eq!(dbl(r#""\u00e9\u4E2D""#), Ok(("", "é中".to_string())));
        assert_eq!(dbl(r#""\ud83e\udd80""#), Ok(("", "🦀".to_string())));
        assert!(dbl(r#""\ud83e""#).is_err());
        assert!(dbl(r#""unterminated"#).is_err());
        assert!(dbl("\"new\nline\"").is_err());
        assert!(dbl(r#""\x""#).is_err());

        let mut single = string('\'');
        assert_eq!(single(r#"'it\'s "x"'"#), Ok(("", "it's \"x\"".to_string())));
    }

    #[test]
    fn test_trivia() {
        assert_eq!(trivia(true)("  // note\n /* x */ 1"), Ok(("1", 5)));
        assert_eq!(trivia(false)("  // note"), Ok(("// note", 1)));
        assert!(trivia(true)("/* open").is_err());
    }

    #[test]
    fn test_keyword() {
        assert_eq!(keyword("true,"), Ok((",", Some(true))));
        assert_eq!(keyword("null"), Ok(("", None)));
        assert!(keyword("nul").is_err());
    }
}
