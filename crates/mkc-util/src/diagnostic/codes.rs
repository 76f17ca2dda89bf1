//! Diagnostic codes - the compiler's error code table.
//!
//! Every diagnostic carries a [`DiagnosticCode`] in the `E1000`–`E9999`
//! space. The thousands digit determines the [`Category`]:
//!
//! | Range | Category |
//! |-------|----------|
//! | 1000–1999 | Syntax |
//! | 2000–2999 | Type |
//! | 3000–3999 | Effect |
//! | 4000–4999 | Pattern |
//! | 5000–5999 | Module |
//! | 6000–6999 | Api |
//! | 7000–7999 | Runtime |
//! | 8000–8999 | Resource |
//! | 9000–9999 | Internal |

use std::fmt;

/// Diagnostic category, derived from the code's thousands digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Syntax,
    Type,
    Effect,
    Pattern,
    Module,
    Api,
    Runtime,
    Resource,
    Internal,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Syntax => "syntax",
            Category::Type => "type",
            Category::Effect => "effect",
            Category::Pattern => "pattern",
            Category::Module => "module",
            Category::Api => "api",
            Category::Runtime => "runtime",
            Category::Resource => "resource",
            Category::Internal => "internal",
        };
        write!(f, "{name}")
    }
}

/// A numeric diagnostic code, rendered as `E1001`, `E2006`, ...
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(pub u16);

impl DiagnosticCode {
    // Syntax errors (E1000-E1999)
    /// E1001: Unexpected token
    pub const E1001: Self = Self(1001);
    /// E1002: Expected token missing
    pub const E1002: Self = Self(1002);
    /// E1003: Invalid literal
    pub const E1003: Self = Self(1003);
    /// E1004: Unterminated string literal
    pub const E1004: Self = Self(1004);
    /// E1005: Unexpected character
    pub const E1005: Self = Self(1005);
    /// E1006: Unexpected end of file
    pub const E1006: Self = Self(1006);

    // Type errors (E2000-E2999)
    /// E2001: Undefined symbol
    pub const E2001: Self = Self(2001);
    /// E2002: Type mismatch
    pub const E2002: Self = Self(2002);
    /// E2003: Invalid function call
    pub const E2003: Self = Self(2003);
    /// E2004: Invalid operand type
    pub const E2004: Self = Self(2004);
    /// E2005: Missing return value
    pub const E2005: Self = Self(2005);
    /// E2006: Shadowing/reassignment forbidden
    pub const E2006: Self = Self(2006);
    /// E2007: Invalid condition type
    pub const E2007: Self = Self(2007);

    // Effect errors (E3000-E3999)
    /// E3001: Undeclared effect usage
    pub const E3001: Self = Self(3001);
    /// E3002: Effect leakage from pure function
    pub const E3002: Self = Self(3002);
    /// E3003: Unknown effect name
    pub const E3003: Self = Self(3003);
    /// E3004: Effect use inside lambda
    pub const E3004: Self = Self(3004);
    /// E3005: Duplicate effect in uses clause
    pub const E3005: Self = Self(3005);

    // Pattern matching errors (E4000-E4999)
    /// E4001: Non-exhaustive match
    pub const E4001: Self = Self(4001);
    /// E4002: Match on non-union without wildcard
    pub const E4002: Self = Self(4002);
    /// E4003: Duplicate match arm
    pub const E4003: Self = Self(4003);
    /// E4004: Inconsistent match arm types
    pub const E4004: Self = Self(4004);

    // Module errors (E5000-E5999)
    /// E5001: Module not found
    pub const E5001: Self = Self(5001);
    /// E5002: Duplicate module
    pub const E5002: Self = Self(5002);
    /// E5003: Invalid module path
    pub const E5003: Self = Self(5003);
    /// E5004: Circular dependency
    pub const E5004: Self = Self(5004);

    // API errors (E6000-E6999)
    /// E6001: Invalid HTTP method
    pub const E6001: Self = Self(6001);
    /// E6002: Invalid route path
    pub const E6002: Self = Self(6002);
    /// E6003: Duplicate route
    pub const E6003: Self = Self(6003);
    /// E6004: Invalid route parameter
    pub const E6004: Self = Self(6004);
    /// E6005: Handler effects not declared
    pub const E6005: Self = Self(6005);

    // Runtime errors (E7000-E7999), reported by the host shim
    /// E7001: Effect invocation failed
    pub const E7001: Self = Self(7001);
    /// E7002: HTTP request failed
    pub const E7002: Self = Self(7002);
    /// E7003: Filesystem operation failed
    pub const E7003: Self = Self(7003);
    /// E7004: Execution time limit exceeded
    pub const E7004: Self = Self(7004);

    // Resource limit errors (E8000-E8999)
    /// E8001: Source file too large
    pub const E8001: Self = Self(8001);
    /// E8002: Memory limit exceeded
    pub const E8002: Self = Self(8002);
    /// E8003: Recursion limit exceeded
    pub const E8003: Self = Self(8003);
    /// E8004: Too many diagnostics
    pub const E8004: Self = Self(8004);

    // Internal errors (E9000-E9999)
    /// E9001: Internal invariant violation
    pub const E9001: Self = Self(9001);
    /// E9002: Unimplemented construct
    pub const E9002: Self = Self(9002);

    /// Category implied by the code's range.
    pub const fn category(&self) -> Category {
        match self.0 / 1000 {
            1 => Category::Syntax,
            2 => Category::Type,
            3 => Category::Effect,
            4 => Category::Pattern,
            5 => Category::Module,
            6 => Category::Api,
            7 => Category::Runtime,
            8 => Category::Resource,
            _ => Category::Internal,
        }
    }

    /// Canonical short description of the code.
    pub const fn description(&self) -> &'static str {
        match self.0 {
            1001 => "unexpected token",
            1002 => "expected token missing",
            1003 => "invalid literal",
            1004 => "unterminated string literal",
            1005 => "unexpected character",
            1006 => "unexpected end of file",
            2001 => "undefined symbol",
            2002 => "type mismatch",
            2003 => "invalid function call",
            2004 => "invalid operand type",
            2005 => "missing return value",
            2006 => "shadowing/reassignment forbidden",
            2007 => "invalid condition type",
            3001 => "undeclared effect usage",
            3002 => "effect leakage from pure function",
            3003 => "unknown effect name",
            3004 => "effect use inside lambda",
            3005 => "duplicate effect in uses clause",
            4001 => "non-exhaustive match",
            4002 => "match on non-union type without wildcard",
            4003 => "duplicate match arm",
            4004 => "inconsistent match arm types",
            5001 => "module not found",
            5002 => "duplicate module",
            5003 => "invalid module path",
            5004 => "circular dependency",
            6001 => "invalid HTTP method",
            6002 => "invalid route path",
            6003 => "duplicate route",
            6004 => "invalid route parameter",
            6005 => "handler effects not declared",
            7001 => "effect invocation failed",
            7002 => "HTTP request failed",
            7003 => "filesystem operation failed",
            7004 => "execution time limit exceeded",
            8001 => "source file too large",
            8002 => "memory limit exceeded",
            8003 => "recursion limit exceeded",
            8004 => "too many diagnostics",
            9001 => "internal invariant violation",
            9002 => "unimplemented construct",
            _ => "unknown error",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.0)
    }
}

impl fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiagnosticCode(E{:04})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_zero_padded() {
        assert_eq!(DiagnosticCode::E1001.to_string(), "E1001");
        assert_eq!(DiagnosticCode::E9002.to_string(), "E9002");
        assert_eq!(format!("{:?}", DiagnosticCode::E2006), "DiagnosticCode(E2006)");
    }

    #[test]
    fn category_follows_thousands_digit() {
        assert_eq!(DiagnosticCode::E1004.category(), Category::Syntax);
        assert_eq!(DiagnosticCode::E2006.category(), Category::Type);
        assert_eq!(DiagnosticCode::E3002.category(), Category::Effect);
        assert_eq!(DiagnosticCode::E4001.category(), Category::Pattern);
        assert_eq!(DiagnosticCode::E5004.category(), Category::Module);
        assert_eq!(DiagnosticCode::E6001.category(), Category::Api);
        assert_eq!(DiagnosticCode::E7002.category(), Category::Runtime);
        assert_eq!(DiagnosticCode::E8001.category(), Category::Resource);
        assert_eq!(DiagnosticCode::E9001.category(), Category::Internal);
    }

    #[test]
    fn every_table_entry_has_a_description() {
        let codes = [
            1001, 1002, 1003, 1004, 1005, 1006, 2001, 2002, 2003, 2004, 2005, 2006, 2007, 3001,
            3002, 3003, 3004, 3005, 4001, 4002, 4003, 4004, 5001, 5002, 5003, 5004, 6001, 6002,
            6003, 6004, 6005, 7001, 7002, 7003, 7004, 8001, 8002, 8003, 8004, 9001, 9002,
        ];
        for n in codes {
            assert_ne!(DiagnosticCode(n).description(), "unknown error", "E{n}");
        }
    }

    #[test]
    fn named_entries_match_spec_wording() {
        assert_eq!(DiagnosticCode::E2005.description(), "missing return value");
        assert_eq!(
            DiagnosticCode::E2006.description(),
            "shadowing/reassignment forbidden"
        );
        assert_eq!(DiagnosticCode::E5004.description(), "circular dependency");
        assert_eq!(DiagnosticCode::E6001.description(), "invalid HTTP method");
    }
}
