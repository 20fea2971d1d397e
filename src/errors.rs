//! Everything that can go wrong, in one place.
//!
//! The taxonomy matters more than the messages: a `CompileError` means
//! the formula never made it through the sandbox and no pixel was ever
//! computed; a `ParamError` means the render geometry was rejected
//! before any worker was dispatched; a `RenderError` means the engine
//! itself gave up mid-flight.  Per-pixel arithmetic trouble (division
//! by zero, `log(0)` and friends) is *not* here: the escape kernel
//! folds it into "diverged immediately" and carries on.

/// Rejection of a formula by the expression sandbox.  Each variant
/// carries the byte offset into the source text where the trouble
/// starts.  The variants split into two families: plain syntax errors,
/// and names the allow-list refuses to resolve.  The distinction is
/// visible to callers who want to word their complaints differently.
#[derive(Debug, Fail, PartialEq)]
pub enum CompileError {
    /// The source was empty, or nothing but whitespace.
    #[fail(display = "the expression is empty")]
    EmptyExpression,
    /// A character with no role in the grammar, e.g. `.` outside a
    /// number, `!`, `;`, or anything else an attribute access or
    /// statement would need.
    #[fail(display = "unexpected character {:?} at position {}", _0, _1)]
    UnexpectedChar(char, usize),
    /// A run of digits and dots that does not form a number.
    #[fail(display = "cannot read {:?} as a number at position {}", _0, _1)]
    BadNumber(String, usize),
    /// A well-formed token in a position the grammar does not allow.
    #[fail(display = "unexpected {} at position {}", _0, _1)]
    UnexpectedToken(String, usize),
    /// The expression stopped where an operand or `)` was still owed.
    #[fail(display = "the expression ends where a value was expected")]
    UnexpectedEnd,
    /// An identifier that is neither `z`, `c`, a constant, nor an
    /// allow-listed function.  This is the variant that blocks
    /// `__import__`, `open`, and every other host name.
    #[fail(display = "unknown name {:?} at position {}", _0, _1)]
    UnknownName(String, usize),
    /// Call syntax applied to something that is not a function, as in
    /// `z(2)` or `pi(c)`.
    #[fail(display = "{:?} is not a function, at position {}", _0, _1)]
    NotAFunction(String, usize),
    /// A known function name used without an argument list.
    #[fail(display = "function {:?} needs an argument at position {}", _0, _1)]
    MissingArgument(String, usize),
    /// More nesting than the evaluator is willing to recurse into.
    #[fail(display = "expression nested too deeply at position {}", _0)]
    TooDeep(usize),
}

/// Rejection of render geometry.  All of these are caught before a
/// single worker is dispatched.
#[derive(Debug, Fail, PartialEq)]
pub enum ParamError {
    /// The pixel grid needs at least two pixels on a side for the
    /// corner-inclusive coordinate mapping to make sense.
    #[fail(display = "grid size must be at least 2, got {}", _0)]
    GridTooSmall(usize),
    /// An iteration cap of zero would classify every point as interior
    /// without ever evaluating the function.
    #[fail(display = "the iteration cap must be at least 1")]
    ZeroIterations,
    /// The viewport corners do not enclose any area: the fields are
    /// x0, y0, x1, y1 as given.
    #[fail(
        display = "viewport ({}, {})..({}, {}) encloses no area",
        _0, _1, _2, _3
    )]
    EmptyViewport(f64, f64, f64, f64),
}

/// Failure of a render that had already started.  No partial frame is
/// ever handed out alongside one of these.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// A worker thread died before delivering its block of rows.
    #[fail(display = "render worker for block {} failed", _0)]
    Worker(usize),
    /// The cancel flag was raised; remaining rows were abandoned and
    /// finished blocks discarded.
    #[fail(display = "render cancelled")]
    Cancelled,
}

/// Umbrella error for the one-call `render` convenience entry point,
/// so callers can still tell the three families apart by matching.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The expression failed sandbox validation.
    #[fail(display = "{}", _0)]
    Compile(#[fail(cause)] CompileError),
    /// The render geometry was rejected.
    #[fail(display = "{}", _0)]
    Param(#[fail(cause)] ParamError),
    /// The render started and then failed or was cancelled.
    #[fail(display = "{}", _0)]
    Render(#[fail(cause)] RenderError),
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Error {
        Error::Compile(err)
    }
}

impl From<ParamError> for Error {
    fn from(err: ParamError) -> Error {
        Error::Param(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}
