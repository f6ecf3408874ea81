#[inline]
pub fn is_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

#[inline]
pub fn is_alphanumeric(c: char) -> bool {
    is_alphabetic(c) || is_numeric(c)
}

// Grow the stack once less than this is left
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_GROWTH: usize = 1024 * 1024;

/// Runs `f`, first moving to a freshly allocated stack segment if the current one is
/// nearly used up. Wraps the recursive entry points of the parser, resolver and interpreter.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}
