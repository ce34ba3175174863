//! Compile-time constant values and the arithmetic the resolver folds with.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Quaternion with `s` as the real (scalar) component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub s: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, o: Vector) -> Vector {
        Vector::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(self, o: Vector) -> Vector {
        Vector::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scale(self, f: f64) -> Vector {
        Vector::new(self.x * f, self.y * f, self.z * f)
    }

    pub fn dot(self, o: Vector) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vector) -> Vector {
        Vector::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    /// `v * r`: rotate the vector by the rotation.
    pub fn rotate(self, r: Rotation) -> Vector {
        let v = Rotation::new(self.x, self.y, self.z, 0.0);
        let out = r.hamilton(v).hamilton(r.conjugate());
        Vector::new(out.x, out.y, out.z)
    }

    /// `v / r`: rotate the vector by the inverse of the rotation.
    pub fn unrotate(self, r: Rotation) -> Vector {
        self.rotate(r.conjugate())
    }

    pub fn component(self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            _ => None,
        }
    }
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { x: 0.0, y: 0.0, z: 0.0, s: 1.0 };

    pub fn new(x: f64, y: f64, z: f64, s: f64) -> Self {
        Self { x, y, z, s }
    }

    pub fn add(self, o: Rotation) -> Rotation {
        Rotation::new(self.x + o.x, self.y + o.y, self.z + o.z, self.s + o.s)
    }

    pub fn sub(self, o: Rotation) -> Rotation {
        Rotation::new(self.x - o.x, self.y - o.y, self.z - o.z, self.s - o.s)
    }

    pub fn conjugate(self) -> Rotation {
        Rotation::new(-self.x, -self.y, -self.z, self.s)
    }

    /// Hamilton product `self ⊗ o`.
    fn hamilton(self, o: Rotation) -> Rotation {
        Rotation::new(
            self.s * o.x + self.x * o.s + self.y * o.z - self.z * o.y,
            self.s * o.y - self.x * o.z + self.y * o.s + self.z * o.x,
            self.s * o.z + self.x * o.y - self.y * o.x + self.z * o.s,
            self.s * o.s - self.x * o.x - self.y * o.y - self.z * o.z,
        )
    }

    /// `a * b` in script terms: apply `a`, then `b`.
    pub fn compose(self, then: Rotation) -> Rotation {
        then.hamilton(self)
    }

    pub fn component(self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            "s" => Some(self.s),
            _ => None,
        }
    }
}

// ── Constant values ──────────────────────────────────────────────

/// A folded compile-time value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ConstantValue {
    Integer(i32),
    Float(f64),
    String(String),
    Vector(Vector),
    Rotation(Rotation),
}

impl ConstantValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantValue::Integer(_) => "integer",
            ConstantValue::Float(_) => "float",
            ConstantValue::String(_) => "string",
            ConstantValue::Vector(_) => "vector",
            ConstantValue::Rotation(_) => "rotation",
        }
    }

    /// Numeric view, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstantValue::Integer(i) => Some(f64::from(*i)),
            ConstantValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The `(string)` form of this value.
    pub fn to_script_string(&self) -> String {
        match self {
            ConstantValue::Integer(i) => i.to_string(),
            ConstantValue::Float(f) => format!("{f:.6}"),
            ConstantValue::String(s) => s.clone(),
            ConstantValue::Vector(v) => format!("<{:.5}, {:.5}, {:.5}>", v.x, v.y, v.z),
            ConstantValue::Rotation(r) => {
                format!("<{:.5}, {:.5}, {:.5}, {:.5}>", r.x, r.y, r.z, r.s)
            }
        }
    }

    /// String form used for elements of a list cast to string; vectors and
    /// rotations keep six decimals there.
    pub fn to_list_element_string(&self) -> String {
        match self {
            ConstantValue::Vector(v) => format!("<{:.6}, {:.6}, {:.6}>", v.x, v.y, v.z),
            ConstantValue::Rotation(r) => {
                format!("<{:.6}, {:.6}, {:.6}, {:.6}>", r.x, r.y, r.z, r.s)
            }
            other => other.to_script_string(),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::String(s) => write!(f, "\"{s}\""),
            other => f.write_str(&other.to_script_string()),
        }
    }
}

/// Unary minus, implemented per constant kind.
pub trait Negate: Sized {
    fn negate(&self) -> Option<Self>;
}

impl Negate for Vector {
    fn negate(&self) -> Option<Self> {
        Some(Vector::new(-self.x, -self.y, -self.z))
    }
}

impl Negate for Rotation {
    fn negate(&self) -> Option<Self> {
        Some(Rotation::new(-self.x, -self.y, -self.z, -self.s))
    }
}

impl Negate for ConstantValue {
    /// `None` for strings, which have no negation.
    fn negate(&self) -> Option<Self> {
        match self {
            ConstantValue::Integer(i) => Some(ConstantValue::Integer(i.wrapping_neg())),
            ConstantValue::Float(f) => Some(ConstantValue::Float(-f)),
            ConstantValue::Vector(v) => v.negate().map(ConstantValue::Vector),
            ConstantValue::Rotation(r) => r.negate().map(ConstantValue::Rotation),
            ConstantValue::String(_) => None,
        }
    }
}

// ── Legacy conversions ───────────────────────────────────────────

/// Float → integer the way the legacy runtime does it: truncate toward zero,
/// wrap modulo 2^32, and map non-finite or wildly out-of-range values to
/// `i32::MIN`.
#[allow(clippy::cast_possible_truncation)]
pub fn float_to_integer(f: f64) -> i32 {
    if !f.is_finite() {
        return i32::MIN;
    }
    let truncated = f.trunc();
    // i64 holds every integral f64 below 2^63 exactly
    if truncated.abs() >= 9.223_372_036_854_775e18 {
        return i32::MIN;
    }
    (truncated as i64) as i32
}

/// String → integer: leading whitespace, optional sign, then decimal digits
/// or a `0x` hex run. Stops at the first unparsable character, wraps on
/// overflow, and yields 0 when no digits are found.
pub fn parse_integer_prefix(text: &str) -> i32 {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i32 = 0;
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        for d in hex.chars().map_while(|c| c.to_digit(16)) {
            value = value.wrapping_mul(16).wrapping_add(d as i32);
        }
    } else {
        for d in rest.chars().map_while(|c| c.to_digit(10)) {
            value = value.wrapping_mul(10).wrapping_add(d as i32);
        }
    }
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// String → float: the longest prefix that reads as a decimal float
/// (`strtod` style). 0.0 when nothing parses.
pub fn parse_float_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mantissa_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == mantissa_start || (end == mantissa_start + 1 && bytes.get(mantissa_start) == Some(&b'.')) {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    s.get(..end).and_then(|p| p.parse::<f64>().ok()).unwrap_or(0.0)
}

/// Parse `<a, b, c>` (3 components) or `<a, b, c, d>` (4 components) from a
/// string, each component read with [`parse_float_prefix`].
fn parse_components(text: &str, count: usize) -> Option<Vec<f64>> {
    let inner = text.trim().strip_prefix('<')?.strip_suffix('>')?;
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != count {
        return None;
    }
    let mut out = Vec::with_capacity(count);
    for part in parts {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            return None;
        }
        out.push(parse_float_prefix(trimmed));
    }
    Some(out)
}

/// `(vector)"<1, 2, 3>"`; the zero vector on failure.
pub fn parse_vector(text: &str) -> Vector {
    match parse_components(text, 3).as_deref() {
        Some(&[x, y, z]) => Vector::new(x, y, z),
        _ => Vector::ZERO,
    }
}

/// `(rotation)"<0, 0, 0, 1>"`; the identity rotation on failure.
pub fn parse_rotation(text: &str) -> Rotation {
    match parse_components(text, 4).as_deref() {
        Some(&[x, y, z, s]) => Rotation::new(x, y, z, s),
        _ => Rotation::IDENTITY,
    }
}

/// Interpret a quoted string literal token: strip the quotes and apply the
/// escapes `\n`, `\t`, `\"`, `\\`. Any other escaped character stands for
/// itself.
pub fn unescape_string_literal(token: &str) -> Option<String> {
    let quote = token.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = token.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                // tabs expand to four spaces, as the legacy runtime does
                Some('t') => out.push_str("    "),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn dot_of_orthogonal_units_is_zero() {
        assert_eq!(Vector::new(1.0, 0.0, 0.0).dot(Vector::new(0.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn cross_product() {
        let c = Vector::new(1.0, 0.0, 0.0).cross(Vector::new(0.0, 1.0, 0.0));
        assert_eq!(c, Vector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let half = std::f64::consts::FRAC_PI_4;
        let r = Rotation::new(0.0, 0.0, half.sin(), half.cos());
        let v = Vector::new(1.0, 0.0, 0.0).rotate(r);
        assert!(close(v.x, 0.0) && close(v.y, 1.0) && close(v.z, 0.0), "{v:?}");
        let back = v.unrotate(r);
        assert!(close(back.x, 1.0) && close(back.y, 0.0), "{back:?}");
    }

    #[test]
    fn compose_applies_left_first() {
        let half = std::f64::consts::FRAC_PI_4;
        let about_z = Rotation::new(0.0, 0.0, half.sin(), half.cos());
        let about_x = Rotation::new(half.sin(), 0.0, 0.0, half.cos());
        let v = Vector::new(1.0, 0.0, 0.0);
        let stepwise = v.rotate(about_z).rotate(about_x);
        let combined = v.rotate(about_z.compose(about_x));
        assert!(close(stepwise.x, combined.x));
        assert!(close(stepwise.y, combined.y));
        assert!(close(stepwise.z, combined.z));
    }

    #[test]
    fn negate_every_numeric_kind() {
        assert_eq!(ConstantValue::Integer(5).negate(), Some(ConstantValue::Integer(-5)));
        assert_eq!(ConstantValue::Integer(i32::MIN).negate(), Some(ConstantValue::Integer(i32::MIN)));
        assert_eq!(
            ConstantValue::Vector(Vector::new(1.0, -2.0, 3.0)).negate(),
            Some(ConstantValue::Vector(Vector::new(-1.0, 2.0, -3.0)))
        );
        assert_eq!(
            ConstantValue::Rotation(Rotation::IDENTITY).negate(),
            Some(ConstantValue::Rotation(Rotation::new(-0.0, -0.0, -0.0, -1.0)))
        );
        assert_eq!(ConstantValue::String("a".into()).negate(), None);
    }

    #[test]
    fn float_to_integer_truncates_and_wraps() {
        assert_eq!(float_to_integer(2.9), 2);
        assert_eq!(float_to_integer(-2.9), -2);
        assert_eq!(float_to_integer(4_294_967_297.0), 1);
        assert_eq!(float_to_integer(2_147_483_648.0), i32::MIN);
        assert_eq!(float_to_integer(f64::NAN), i32::MIN);
        assert_eq!(float_to_integer(f64::INFINITY), i32::MIN);
    }

    #[test]
    fn integer_prefix_parsing() {
        assert_eq!(parse_integer_prefix("abc"), 0);
        assert_eq!(parse_integer_prefix("  42xyz"), 42);
        assert_eq!(parse_integer_prefix("-17"), -17);
        assert_eq!(parse_integer_prefix("0x1F"), 31);
        assert_eq!(parse_integer_prefix("1.9"), 1);
        assert_eq!(parse_integer_prefix("4294967295"), -1);
    }

    #[test]
    fn float_prefix_parsing() {
        assert_eq!(parse_float_prefix("1.5abc"), 1.5);
        assert_eq!(parse_float_prefix("abc"), 0.0);
        assert_eq!(parse_float_prefix("-2e3"), -2000.0);
        assert_eq!(parse_float_prefix("3e"), 3.0);
        assert_eq!(parse_float_prefix("."), 0.0);
    }

    #[test]
    fn rotation_string_fallback() {
        assert_eq!(parse_rotation("<1, 2, 3, 4>"), Rotation::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(parse_rotation("nonsense"), Rotation::IDENTITY);
        assert_eq!(parse_rotation("<1, 2, 3>"), Rotation::IDENTITY);
        assert_eq!(parse_vector("<1,2,3>"), Vector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn string_forms() {
        assert_eq!(ConstantValue::Float(1.5).to_script_string(), "1.500000");
        assert_eq!(
            ConstantValue::Vector(Vector::new(1.0, 2.0, 3.0)).to_script_string(),
            "<1.00000, 2.00000, 3.00000>"
        );
        assert_eq!(
            ConstantValue::Vector(Vector::new(1.0, 2.0, 3.0)).to_list_element_string(),
            "<1.000000, 2.000000, 3.000000>"
        );
    }

    #[test]
    fn string_literal_escapes() {
        assert_eq!(unescape_string_literal(r#""a\"b""#).unwrap(), "a\"b");
        assert_eq!(unescape_string_literal(r#""line\nnext""#).unwrap(), "line\nnext");
        assert_eq!(unescape_string_literal("'single'").unwrap(), "single");
        assert!(unescape_string_literal("bare").is_none());
    }
}
