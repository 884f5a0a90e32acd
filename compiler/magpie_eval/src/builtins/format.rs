//! `printf`-style formatting.
//!
//! Directives are `%[flags][width][.precision]verb`:
//!
//! - flags: `-` (left-align), `0` (zero-pad numbers), `+` (always sign)
//! - verbs: `%v` (display), `%s` (string), `%d` (integer), `%f` (float),
//!   `%x` (hex integer), `%t` (boolean), `%q` (quoted), `%%` (literal `%`)
//!
//! Every directive consumes one argument, in order. Missing or surplus
//! arguments are a `FormatError`.

use std::iter::Peekable;
use std::str::Chars;

use magpie_ir::Position;

use crate::errors::{format_error, EvalError};
use crate::Value;

#[derive(Default)]
struct Directive {
    left: bool,
    zero: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
}

impl Directive {
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Self {
        let mut d = Directive::default();
        while let Some(&c) = chars.peek() {
            match c {
                '-' => d.left = true,
                '0' => d.zero = true,
                '+' => d.plus = true,
                _ => break,
            }
            chars.next();
        }
        d.width = read_number(chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            d.precision = Some(read_number(chars).unwrap_or(0));
        }
        d
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = self.width - len;
        if self.left {
            format!("{body}{}", " ".repeat(fill))
        } else if self.zero && numeric {
            // Zeros go after the sign.
            let (sign, digits) = match body.strip_prefix(['-', '+']) {
                Some(rest) => (&body[..1], rest),
                None => ("", body.as_str()),
            };
            format!("{sign}{}{digits}", "0".repeat(fill))
        } else {
            format!("{}{body}", " ".repeat(fill))
        }
    }
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n
}

/// Render `fmt` with `args`.
pub fn format_values(pos: Position, fmt: &str, args: &[Value]) -> Result<String, EvalError> {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars().peekable();
    let mut next_arg = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let directive = Directive::parse(&mut chars);
        let verb = chars
            .next()
            .ok_or_else(|| format_error(pos, "format string ends in the middle of a directive"))?;
        let arg = next_arg
            .next()
            .ok_or_else(|| format_error(pos, &format!("missing argument for %{verb}")))?;
        out.push_str(&render(pos, &directive, verb, arg)?);
    }

    let surplus = next_arg.count();
    if surplus > 0 {
        return Err(format_error(
            pos,
            &format!("{surplus} argument(s) not consumed by the format string"),
        ));
    }
    Ok(out)
}

fn render(pos: Position, d: &Directive, verb: char, arg: &Value) -> Result<String, EvalError> {
    let signed = |s: String, non_negative: bool| {
        if d.plus && non_negative {
            format!("+{s}")
        } else {
            s
        }
    };
    let mismatch = |expected: &str| {
        format_error(
            pos,
            &format!("%{verb} expects {expected}, got {}", arg.kind()),
        )
    };

    let (body, numeric) = match verb {
        'v' => match (arg.as_int(), arg.as_number()) {
            (Some(n), _) => (signed(n.to_string(), n >= 0), true),
            (None, Some(x)) => (signed(float_body(x, d.precision), x >= 0.0), true),
            _ => (arg.display(), false),
        },
        's' => {
            let mut s = arg.display();
            if let Some(p) = d.precision {
                s = s.chars().take(p).collect();
            }
            (s, false)
        }
        'd' => {
            let n = arg.as_int().ok_or_else(|| mismatch("INTEGER"))?;
            (signed(n.to_string(), n >= 0), true)
        }
        'x' => {
            let n = arg.as_int().ok_or_else(|| mismatch("INTEGER"))?;
            (format!("{n:x}"), true)
        }
        'f' => {
            let x = arg.as_number().ok_or_else(|| mismatch("a number"))?;
            let body = format!("{x:.*}", d.precision.unwrap_or(6));
            (signed(body, x >= 0.0), true)
        }
        't' => match arg {
            Value::Bool(b) if b.valid => (b.value.to_string(), false),
            _ => return Err(mismatch("BOOLEAN")),
        },
        'q' => (format!("{:?}", arg.display()), false),
        other => return Err(format_error(pos, &format!("unknown verb %{other}"))),
    };
    Ok(d.pad(body, numeric))
}

fn float_body(x: f64, precision: Option<usize>) -> String {
    match precision {
        Some(p) => format!("{x:.p$}"),
        None => x.to_string(),
    }
}
