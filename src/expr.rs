//! The formula language: a tiny arithmetic expression grammar over the
//! complex numbers, compiled once into an AST and then evaluated a few
//! million times without ever touching the source text again.
//!
//! The grammar is deliberately small.  It has numbers (including
//! imaginary literals like `1j` and `2.5J`), the variables `z` and `c`,
//! the constants `pi` and `e`, the operators `+ - * / **` with the
//! usual precedence (`**` binds tightest and associates to the right),
//! unary minus, parentheses, and a fixed menu of one-argument
//! functions.  That is the whole language.  There are no strings, no
//! attribute access, no statements, and no way to name anything outside
//! the menu, which is what makes it safe to hand to strangers: a name
//! that is not on the allow-list is a compile error, not a lookup.
//!
//! One rule is easy to miss and central to everything: the constant
//! term is implicit.  A compiled function computes `body + c`, so the
//! expression `z**2` *is* the Mandelbrot recurrence.  Writing `z**2 + c`
//! works too; you just get `c` added twice.
//!
//! Positions in errors are byte offsets into the source string.
use num::Complex;
use std::f64::consts;
use std::i32;

use errors::CompileError;

/// Compile-time budget on expression structure.  Every level of live
/// parser descent and every operator or call node built charges one
/// unit, so the finished tree always stays shallow enough to walk by
/// recursion on any worker stack.
const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone)]
enum Token {
    /// A numeric literal and whether it carried the `j` suffix.
    Number(f64, bool),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    LParen,
    RParen,
}

fn describe(token: &Token) -> String {
    match *token {
        Token::Number(..) => "number".to_string(),
        Token::Ident(ref name) => format!("name {:?}", name),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::StarStar => "'**'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

/// Split the source into tokens, each tagged with its byte offset.
/// The scanner is strict: any character without a role in the grammar
/// stops the whole compilation here, before the parser ever runs.
fn scan(text: &str) -> Result<Vec<(Token, usize)>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(at, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '+' {
            chars.next();
            tokens.push((Token::Plus, at));
        } else if ch == '-' {
            chars.next();
            tokens.push((Token::Minus, at));
        } else if ch == '/' {
            chars.next();
            tokens.push((Token::Slash, at));
        } else if ch == '(' {
            chars.next();
            tokens.push((Token::LParen, at));
        } else if ch == ')' {
            chars.next();
            tokens.push((Token::RParen, at));
        } else if ch == '*' {
            chars.next();
            if let Some(&(_, '*')) = chars.peek() {
                chars.next();
                tokens.push((Token::StarStar, at));
            } else {
                tokens.push((Token::Star, at));
            }
        } else if ch.is_ascii_digit() || ch == '.' {
            tokens.push(scan_number(&mut chars, at)?);
        } else if ch.is_alphabetic() || ch == '_' {
            let mut name = String::new();
            while let Some(&(_, ic)) = chars.peek() {
                if ic.is_alphanumeric() || ic == '_' {
                    name.push(ic);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(name), at));
        } else {
            return Err(CompileError::UnexpectedChar(ch, at));
        }
    }
    Ok(tokens)
}

type Chars<'a> = ::std::iter::Peekable<::std::str::CharIndices<'a>>;

/// Scan one numeric literal: digits, an optional fraction, an optional
/// exponent, an optional `j`/`J` suffix marking it imaginary.  An `e`
/// is only an exponent when digits actually follow it; otherwise it is
/// left alone for the identifier scanner, so `2e` reads as `2` then
/// the constant `e`.
fn scan_number(chars: &mut Chars, start: usize) -> Result<(Token, usize), CompileError> {
    let mut text = String::new();
    while let Some(&(_, d)) = chars.peek() {
        if d.is_ascii_digit() {
            text.push(d);
            chars.next();
        } else {
            break;
        }
    }
    if let Some(&(_, '.')) = chars.peek() {
        text.push('.');
        chars.next();
        while let Some(&(_, d)) = chars.peek() {
            if d.is_ascii_digit() {
                text.push(d);
                chars.next();
            } else {
                break;
            }
        }
    }
    if text == "." {
        return Err(CompileError::UnexpectedChar('.', start));
    }
    let exponent_follows = match chars.peek() {
        Some(&(_, 'e')) | Some(&(_, 'E')) => {
            let mut ahead = chars.clone();
            ahead.next();
            if let Some(&(_, sign)) = ahead.peek() {
                if sign == '+' || sign == '-' {
                    ahead.next();
                }
            }
            match ahead.peek() {
                Some(&(_, d)) => d.is_ascii_digit(),
                None => false,
            }
        }
        _ => false,
    };
    if exponent_follows {
        if let Some((_, marker)) = chars.next() {
            text.push(marker);
        }
        if let Some(&(_, sign)) = chars.peek() {
            if sign == '+' || sign == '-' {
                text.push(sign);
                chars.next();
            }
        }
        while let Some(&(_, d)) = chars.peek() {
            if d.is_ascii_digit() {
                text.push(d);
                chars.next();
            } else {
                break;
            }
        }
    }
    let mut imaginary = false;
    if let Some(&(_, suffix)) = chars.peek() {
        if suffix == 'j' || suffix == 'J' {
            imaginary = true;
            chars.next();
        }
    }
    match text.parse::<f64>() {
        Ok(value) => Ok((Token::Number(value, imaginary), start)),
        Err(_) => Err(CompileError::BadNumber(text, start)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Builtin {
    Abs,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Phase,
    Floor,
    Ceil,
    Trunc,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        match name {
            "abs" => Some(Builtin::Abs),
            "sin" => Some(Builtin::Sin),
            "cos" => Some(Builtin::Cos),
            "tan" => Some(Builtin::Tan),
            "exp" => Some(Builtin::Exp),
            "log" => Some(Builtin::Log),
            "sqrt" => Some(Builtin::Sqrt),
            "phase" => Some(Builtin::Phase),
            "floor" => Some(Builtin::Floor),
            "ceil" => Some(Builtin::Ceil),
            "trunc" => Some(Builtin::Trunc),
            _ => None,
        }
    }

    /// Apply the function to one value.  `abs` and `phase` return real
    /// results widened back to complex; `floor`, `ceil` and `trunc`
    /// round each component separately.
    fn apply(self, v: Complex<f64>) -> Complex<f64> {
        match self {
            Builtin::Abs => Complex::new(v.norm(), 0.0),
            Builtin::Sin => v.sin(),
            Builtin::Cos => v.cos(),
            Builtin::Tan => v.tan(),
            Builtin::Exp => v.exp(),
            Builtin::Log => v.ln(),
            Builtin::Sqrt => v.sqrt(),
            Builtin::Phase => Complex::new(v.arg(), 0.0),
            Builtin::Floor => Complex::new(v.re.floor(), v.im.floor()),
            Builtin::Ceil => Complex::new(v.re.ceil(), v.im.ceil()),
            Builtin::Trunc => Complex::new(v.re.trunc(), v.im.trunc()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Complex<f64>),
    Z,
    C,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// An exact integer power, split out from `Binary(Pow, ..)` so it
    /// can use repeated squaring instead of the polar-form `powc`.
    /// The polar form turns `0 ** 2` into NaN, which would wrongly
    /// eject the seed point of every orbit that starts at the origin.
    Powi(Box<Expr>, i32),
    Call(Builtin, Box<Expr>),
}

impl Expr {
    fn eval(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        match *self {
            Expr::Literal(v) => v,
            Expr::Z => z,
            Expr::C => c,
            Expr::Neg(ref inner) => -inner.eval(z, c),
            Expr::Binary(op, ref lhs, ref rhs) => {
                let a = lhs.eval(z, c);
                let b = rhs.eval(z, c);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powc(b),
                }
            }
            Expr::Powi(ref base, exp) => base.eval(z, c).powi(exp),
            Expr::Call(f, ref arg) => f.apply(arg.eval(z, c)),
        }
    }
}

/// Rewrite `a ** k` into the exact integer power when `k` folded to an
/// integral real literal, and fold negation of literals on the way so
/// `z ** -2` qualifies too.  Everything else passes through untouched.
fn lower(expr: Expr) -> Expr {
    match expr {
        Expr::Neg(inner) => match lower(*inner) {
            Expr::Literal(v) => Expr::Literal(-v),
            other => Expr::Neg(Box::new(other)),
        },
        Expr::Binary(BinOp::Pow, base, exp) => {
            let base = lower(*base);
            let exp = lower(*exp);
            if let Expr::Literal(k) = exp {
                if k.im == 0.0
                    && k.re.fract() == 0.0
                    && k.re >= i32::MIN as f64
                    && k.re <= i32::MAX as f64
                {
                    return Expr::Powi(Box::new(base), k.re as i32);
                }
            }
            Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp))
        }
        Expr::Binary(op, lhs, rhs) => {
            Expr::Binary(op, Box::new(lower(*lhs)), Box::new(lower(*rhs)))
        }
        Expr::Powi(base, exp) => Expr::Powi(Box::new(lower(*base)), exp),
        Expr::Call(f, arg) => Expr::Call(f, Box::new(lower(*arg))),
        other => other,
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    index: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.index).map(|entry| entry.0.clone())
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|entry| entry.1)
            .unwrap_or(self.end)
    }

    fn bump(&mut self) -> Option<(Token, usize)> {
        let entry = self.tokens.get(self.index).cloned();
        if entry.is_some() {
            self.index += 1;
        }
        entry
    }

    // One unit of the structure budget.  parse_unary holds a charge
    // per level of live descent and releases it on the way back out;
    // the sum/product loops and every `**`/call node charge for good,
    // since a flat `1+1+1+...` deepens the tree one level per term
    // just as surely as a tower of parentheses does.
    fn charge(&mut self, at: usize) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::TooDeep(at));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.depth -= 1;
    }

    fn parse_sum(&mut self) -> Result<Expr, CompileError> {
        let mut node = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(node),
            };
            let at = self.here();
            self.bump();
            let rhs = self.parse_product()?;
            self.charge(at)?;
            node = Expr::Binary(op, Box::new(node), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> Result<Expr, CompileError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(node),
            };
            let at = self.here();
            self.bump();
            let rhs = self.parse_unary()?;
            self.charge(at)?;
            node = Expr::Binary(op, Box::new(node), Box::new(rhs));
        }
    }

    // Every nesting construct passes through here: a sign, the right
    // side of `**`, or a parenthesis on its way down to parse_atom.
    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        self.charge(self.here())?;
        let node = match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                Expr::Neg(Box::new(self.parse_unary()?))
            }
            Some(Token::Plus) => {
                self.bump();
                self.parse_unary()?
            }
            _ => self.parse_power()?,
        };
        self.release();
        Ok(node)
    }

    // `**` associates rightward and its right operand admits a sign,
    // so `2 ** 3 ** 2` is 512 and `z ** -1` is legal.
    fn parse_power(&mut self) -> Result<Expr, CompileError> {
        let base = self.parse_atom()?;
        if let Some(Token::StarStar) = self.peek() {
            let at = self.here();
            self.bump();
            let exp = self.parse_unary()?;
            self.charge(at)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, CompileError> {
        match self.bump() {
            None => Err(CompileError::UnexpectedEnd),
            Some((Token::Number(value, imaginary), _)) => Ok(Expr::Literal(if imaginary {
                Complex::new(0.0, value)
            } else {
                Complex::new(value, 0.0)
            })),
            Some((Token::LParen, _)) => {
                let inner = self.parse_sum()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some((Token::Ident(name), at)) => self.resolve(name, at),
            Some((token, at)) => Err(CompileError::UnexpectedToken(describe(&token), at)),
        }
    }

    /// The allow-list.  An identifier is a variable, a constant, or a
    /// function from the menu; any other name is refused with the
    /// offset where it appeared.
    fn resolve(&mut self, name: String, at: usize) -> Result<Expr, CompileError> {
        let plain = match name.as_str() {
            "z" => Some(Expr::Z),
            "c" => Some(Expr::C),
            "pi" => Some(Expr::Literal(Complex::new(consts::PI, 0.0))),
            "e" => Some(Expr::Literal(Complex::new(consts::E, 0.0))),
            _ => None,
        };
        if let Some(node) = plain {
            if let Some(Token::LParen) = self.peek() {
                return Err(CompileError::NotAFunction(name, at));
            }
            return Ok(node);
        }
        let builtin = match Builtin::from_name(&name) {
            Some(builtin) => builtin,
            None => return Err(CompileError::UnknownName(name, at)),
        };
        match self.peek() {
            Some(Token::LParen) => {
                self.bump();
                let arg = self.parse_sum()?;
                self.expect_rparen()?;
                self.charge(at)?;
                Ok(Expr::Call(builtin, Box::new(arg)))
            }
            _ => Err(CompileError::MissingArgument(name, at)),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), CompileError> {
        match self.bump() {
            Some((Token::RParen, _)) => Ok(()),
            Some((token, at)) => Err(CompileError::UnexpectedToken(describe(&token), at)),
            None => Err(CompileError::UnexpectedEnd),
        }
    }
}

fn parse(tokens: Vec<(Token, usize)>, end: usize) -> Result<Expr, CompileError> {
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
        end,
    };
    let node = parser.parse_sum()?;
    match parser.bump() {
        None => Ok(node),
        Some((token, at)) => Err(CompileError::UnexpectedToken(describe(&token), at)),
    }
}

/// A formula compiled and validated once, ready to be evaluated per
/// orbit step.  Cloning one is cheap enough to hand a copy to every
/// render worker.
#[derive(Debug, Clone)]
pub struct FractalFunction {
    source: String,
    body: Expr,
}

impl FractalFunction {
    /// Compile an expression through the sandbox: scan, parse against
    /// the allow-list, then rewrite literal integer powers into their
    /// exact form.  All rejection happens here; a compiled function
    /// cannot fail at evaluation time, it can only go non-finite.
    pub fn compile(source: &str) -> Result<FractalFunction, CompileError> {
        let tokens = scan(source)?;
        if tokens.is_empty() {
            return Err(CompileError::EmptyExpression);
        }
        let body = lower(parse(tokens, source.len())?);
        Ok(FractalFunction {
            source: source.to_string(),
            body,
        })
    }

    /// One step of the orbit.  The constant term is appended here:
    /// the result is `body(z, c) + c`, which is what turns `z**2` into
    /// the Mandelbrot recurrence.
    pub fn eval(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        self.body.eval(z, c) + c
    }

    /// The source text the function was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        FractalFunction::compile(source).unwrap().eval(z, c)
    }

    fn close(a: Complex<f64>, b: Complex<f64>) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn the_constant_term_is_implicit() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(
            eval("z", Complex::new(2.0, 0.0), Complex::new(1.0, 0.0)),
            Complex::new(3.0, 0.0)
        );
        assert_eq!(
            eval("z**2", zero, Complex::new(-1.0, 0.0)),
            Complex::new(-1.0, 0.0)
        );
    }

    #[test]
    fn integer_powers_are_exact_at_the_origin() {
        // powc would produce NaN here; the lowered form must not.
        let zero = Complex::new(0.0, 0.0);
        let v = eval("z**2", zero, zero);
        assert_eq!(v, zero);
        assert!(v.re.is_finite() && v.im.is_finite());
    }

    #[test]
    fn integer_powers_stay_exact_when_large() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(
            eval("z**10", Complex::new(2.0, 0.0), zero),
            Complex::new(1024.0, 0.0)
        );
        assert_eq!(
            eval("z**-1", Complex::new(2.0, 0.0), zero),
            Complex::new(0.5, 0.0)
        );
    }

    #[test]
    fn fractional_powers_fall_back_to_powc() {
        let zero = Complex::new(0.0, 0.0);
        assert!(close(
            eval("z**0.5", Complex::new(4.0, 0.0), zero),
            Complex::new(2.0, 0.0)
        ));
    }

    #[test]
    fn precedence_matches_the_usual_rules() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(eval("1 + 2 * 3", zero, zero), Complex::new(7.0, 0.0));
        assert_eq!(eval("2 * 3 ** 2", zero, zero), Complex::new(18.0, 0.0));
        assert_eq!(eval("(1 + 2) * 3", zero, zero), Complex::new(9.0, 0.0));
        // Right-associative: the left-handed reading would give 64.
        assert!(close(
            eval("2 ** 3 ** 2", zero, zero),
            Complex::new(512.0, 0.0)
        ));
    }

    #[test]
    fn unary_minus_binds_looser_than_pow() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(
            eval("-z**2", Complex::new(2.0, 0.0), zero),
            Complex::new(-4.0, 0.0)
        );
        assert_eq!(eval("--1", zero, zero), Complex::new(1.0, 0.0));
        assert_eq!(eval("+z", Complex::new(5.0, 0.0), zero), Complex::new(5.0, 0.0));
    }

    #[test]
    fn imaginary_literals_have_the_j_suffix() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(eval("1j", zero, zero), Complex::new(0.0, 1.0));
        assert_eq!(eval("2.5J * 2", zero, zero), Complex::new(0.0, 5.0));
        assert_eq!(eval(".5j", zero, zero), Complex::new(0.0, 0.5));
        assert_eq!(eval("2e1j", zero, zero), Complex::new(0.0, 20.0));
        assert!(FractalFunction::compile("1j * z").is_ok());
        // The suffix belongs to the number; a bare `j` is just an
        // identifier, and no identifier named `j` exists.
        assert_eq!(
            FractalFunction::compile("j").unwrap_err(),
            CompileError::UnknownName("j".to_string(), 0)
        );
    }

    #[test]
    fn constants_resolve_without_parens() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(eval("2 * pi", zero, zero).re, 2.0 * consts::PI);
        // `2e` is the number 2 next to the constant, not an exponent.
        assert!(FractalFunction::compile("2e").is_err());
        assert!(close(eval("log(e)", zero, zero), Complex::new(1.0, 0.0)));
    }

    #[test]
    fn builtins_compute_what_their_names_say() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(
            eval("abs(z)", Complex::new(3.0, 4.0), zero),
            Complex::new(5.0, 0.0)
        );
        assert_eq!(
            eval("phase(1j)", zero, zero),
            Complex::new(consts::FRAC_PI_2, 0.0)
        );
        assert_eq!(
            eval("floor(z)", Complex::new(1.7, -0.3), zero),
            Complex::new(1.0, -1.0)
        );
        assert_eq!(
            eval("ceil(z)", Complex::new(1.2, -0.3), zero),
            Complex::new(2.0, 0.0)
        );
        assert_eq!(
            eval("trunc(z)", Complex::new(1.7, -0.3), zero),
            Complex::new(1.0, 0.0)
        );
        assert!(close(
            eval("sqrt(z)", Complex::new(4.0, 0.0), zero),
            Complex::new(2.0, 0.0)
        ));
        assert!(close(eval("exp(z)", zero, zero), Complex::new(1.0, 0.0)));
        assert!(close(eval("sin(z)", zero, zero), zero));
    }

    #[test]
    fn division_by_zero_goes_non_finite_not_panicking() {
        let v = eval("z / 0", Complex::new(1.0, 0.0), Complex::new(0.0, 0.0));
        assert!(v.re.is_nan() || v.im.is_nan());
    }

    #[test]
    fn unknown_names_are_refused_with_their_position() {
        match FractalFunction::compile("q * z") {
            Err(CompileError::UnknownName(name, 0)) => assert_eq!(name, "q"),
            other => panic!("expected UnknownName, got {:?}", other),
        }
        match FractalFunction::compile("__import__(z)") {
            Err(CompileError::UnknownName(name, 0)) => assert_eq!(name, "__import__"),
            other => panic!("expected UnknownName, got {:?}", other),
        }
        assert!(FractalFunction::compile("open(z)").is_err());
    }

    #[test]
    fn host_syntax_is_refused_at_the_scanner() {
        assert_eq!(
            FractalFunction::compile("z.real").unwrap_err(),
            CompileError::UnexpectedChar('.', 1)
        );
        assert_eq!(
            FractalFunction::compile("z; c").unwrap_err(),
            CompileError::UnexpectedChar(';', 1)
        );
        assert_eq!(
            FractalFunction::compile("sin(z, c)").unwrap_err(),
            CompileError::UnexpectedChar(',', 5)
        );
    }

    #[test]
    fn variables_are_not_callable() {
        assert_eq!(
            FractalFunction::compile("z(2)").unwrap_err(),
            CompileError::NotAFunction("z".to_string(), 0)
        );
        assert_eq!(
            FractalFunction::compile("pi(2)").unwrap_err(),
            CompileError::NotAFunction("pi".to_string(), 0)
        );
    }

    #[test]
    fn functions_need_their_argument() {
        assert_eq!(
            FractalFunction::compile("sin").unwrap_err(),
            CompileError::MissingArgument("sin".to_string(), 0)
        );
        assert_eq!(
            FractalFunction::compile("z + cos").unwrap_err(),
            CompileError::MissingArgument("cos".to_string(), 4)
        );
    }

    #[test]
    fn truncated_expressions_are_refused() {
        assert_eq!(
            FractalFunction::compile("z +").unwrap_err(),
            CompileError::UnexpectedEnd
        );
        assert_eq!(
            FractalFunction::compile("(z").unwrap_err(),
            CompileError::UnexpectedEnd
        );
        assert_eq!(
            FractalFunction::compile("").unwrap_err(),
            CompileError::EmptyExpression
        );
        assert_eq!(
            FractalFunction::compile("   ").unwrap_err(),
            CompileError::EmptyExpression
        );
    }

    #[test]
    fn leftover_tokens_are_refused() {
        assert_eq!(
            FractalFunction::compile("z z").unwrap_err(),
            CompileError::UnexpectedToken("name \"z\"".to_string(), 2)
        );
        assert_eq!(
            FractalFunction::compile(") z").unwrap_err(),
            CompileError::UnexpectedToken("')'".to_string(), 0)
        );
    }

    #[test]
    fn runaway_nesting_is_refused() {
        let mut source = String::new();
        for _ in 0..250 {
            source.push('(');
        }
        source.push('z');
        for _ in 0..250 {
            source.push(')');
        }
        match FractalFunction::compile(&source) {
            Err(CompileError::TooDeep(_)) => {}
            other => panic!("expected TooDeep, got {:?}", other),
        }
    }

    #[test]
    fn runaway_flat_chains_are_refused() {
        // A flat chain builds a left spine one level deeper per term;
        // the budget must refuse it just like nested parentheses.
        let mut source = String::from("z");
        for _ in 0..120_000 {
            source.push_str(" + 1");
        }
        match FractalFunction::compile(&source) {
            Err(CompileError::TooDeep(_)) => {}
            other => panic!("expected TooDeep, got {:?}", other),
        }
    }

    #[test]
    fn long_but_reasonable_sums_still_compile() {
        let mut source = String::from("z");
        for _ in 0..100 {
            source.push_str(" + 1");
        }
        assert!(FractalFunction::compile(&source).is_ok());
    }

    #[test]
    fn source_text_is_preserved() {
        let f = FractalFunction::compile("z**2").unwrap();
        assert_eq!(f.source(), "z**2");
        let g = f.clone();
        assert_eq!(
            g.eval(Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)),
            Complex::new(1.0, 0.0)
        );
    }
}
