use std::fmt::{self, Write};
pub use vec1::vec1;

pub type Int = i64;

pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

/// The faces of a die: a numbered die rolls in `[1, n]`, a fate die in `[-1, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sides {
    Faces(Int),
    Fate,
}

impl Sides {
    pub const fn min_face(&self) -> Int {
        match self {
            Self::Faces(_) => 1,
            Self::Fate => -1,
        }
    }

    pub const fn max_face(&self) -> Int {
        match self {
            Self::Faces(n) => *n,
            Self::Fate => 1,
        }
    }
}

impl fmt::Display for Sides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faces(n) => fmt::Display::fmt(n, f),
            Self::Fate => f.write_char('F'),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
}

impl BinaryOperator {
    pub(crate) const fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 2,
            Self::Multiply | Self::Divide | Self::Modulo => 3,
            Self::Exponent => 4,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Modulo => '%',
            Self::Exponent => '^',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompareOp {
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl CompareOp {
    pub fn holds<T: PartialOrd>(&self, lhs: &T, rhs: &T) -> bool {
        match self {
            Self::Equal => lhs == rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Less => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeepType {
    Highest,
    Lowest,
    Middle,
}

impl fmt::Display for KeepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Highest => 'h',
            Self::Lowest => 'l',
            Self::Middle => 'm',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CriticalType {
    Success,
    Failure,
}

impl fmt::Display for CriticalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Success => 's',
            Self::Failure => 'f',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Ascending => 'a',
            Self::Descending => 'd',
        };
        f.write_char(c)
    }
}
