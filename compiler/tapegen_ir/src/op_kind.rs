//! Operation kinds recorded on the tape.
//!
//! `OpKind` is a closed set. Each kind fixes the number of arguments a node
//! may carry ([`Arity`]); the meaning of the `info` values is documented on
//! the variant.

use std::fmt;

/// The operation performed by an [`OperationNode`](crate::OperationNode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    // ── Arithmetic ──────────────────────────────────────────────────
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `pow(a, b)`
    Pow,
    /// `-(a)`
    UnMinus,

    // ── Unary functions ─────────────────────────────────────────────
    Abs,
    Acos,
    Asin,
    Atan,
    Cos,
    Cosh,
    Exp,
    Log,
    /// `(x > 0) ? 1 : ((x == 0) ? 0 : -1)`
    Sign,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,

    // ── Comparisons with select ─────────────────────────────────────
    //
    // Arguments: `[left, right, true_case, false_case]`.
    /// `left < right ? t : f`
    ComLt,
    /// `left <= right ? t : f`
    ComLe,
    /// `left == right ? t : f`
    ComEq,
    /// `left >= right ? t : f`
    ComGe,
    /// `left > right ? t : f`
    ComGt,
    /// `left != right ? t : f`
    ComNe,

    // ── Values ──────────────────────────────────────────────────────
    /// Independent placeholder.
    Inv,
    /// Reference to another operation.
    Alias,
    /// Plain assignment of its single argument.
    Assign,

    // ── Arrays ──────────────────────────────────────────────────────
    /// `{a, b, c, ...}` written into the shared dense temporary array.
    ArrayCreation,
    /// Non-zero values written into the shared sparse temporary array.
    ///
    /// Info: `[length, position_0, position_1, ...]`.
    SparseArrayCreation,
    /// `array[i]`. Arguments: `[array, producer]`; info: `[position]`.
    ArrayElement,

    // ── Atomic functions ────────────────────────────────────────────
    /// `atomic.forward(q, p, tx, ty)`. Info: `[atomic_id, q, p]`.
    AtomicForward,
    /// `atomic.reverse(p, tx, ty, px, py)`. Info: `[atomic_id, p]`.
    AtomicReverse,

    // ── Dependents ──────────────────────────────────────────────────
    /// `dep += value` using the first usable argument.
    DependentMultiAssign,
    /// Right-hand-side-only reference to a dependent; renders nothing.
    DependentRefRhs,

    // ── Loops ───────────────────────────────────────────────────────
    /// Opens a loop. Arguments: `[index_declaration]` plus an optional
    /// iteration-count `Index`; info: `[iteration_count]` when the count
    /// is a literal.
    LoopStart,
    /// Closes a loop. Arguments: `[loop_start, ...]`.
    LoopEnd,
    /// Independent read through an index pattern. Info: `[pattern]`.
    LoopIndexedIndep,
    /// Dependent written through an index pattern.
    ///
    /// Info: `[pattern, accumulate]` where `accumulate == 1` renders `+=`.
    LoopIndexedDep,
    /// Assignment to a temporary declared outside the loop.
    /// Arguments: `[tmp_declaration, value]`.
    LoopIndexedTmp,
    /// Read of a declared temporary. Arguments: `[tmp_declaration, ...]`.
    Tmp,
    /// Temporary declaration; renders nothing.
    TmpDcl,

    // ── Indices ─────────────────────────────────────────────────────
    /// A named integer index (e.g. a loop counter).
    IndexDeclaration,
    /// Use of an index. Arguments: `[index_declaration]`.
    Index,
    /// `index = pattern(...)`. Arguments: `[index_declaration, indexes...]`;
    /// info: `[pattern]`.
    IndexAssign,
    /// Range guard over an index. Arguments: `[index]`; info: `(min, max)`
    /// pairs.
    IndexCondExpr,

    // ── Structured conditionals ─────────────────────────────────────
    /// Arguments: `[condition, ...]`.
    StartIf,
    /// Arguments: `[previous_branch, condition, ...]`.
    ElseIf,
    /// Arguments: `[previous_branch, ...]`.
    Else,
    /// Arguments: `[previous_branch, ...]`.
    EndIf,
    /// Value produced inside a branch. Arguments: `[branch, value]`.
    CondResult,
}

/// Number of arguments accepted by an operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    /// Check whether `count` arguments satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Between(lo, hi) => write!(f, "between {lo} and {hi}"),
        }
    }
}

impl OpKind {
    /// Argument count accepted by this kind.
    pub fn arity(self) -> Arity {
        match self {
            OpKind::Inv | OpKind::IndexDeclaration | OpKind::TmpDcl => Arity::Exact(0),

            OpKind::UnMinus
            | OpKind::Abs
            | OpKind::Acos
            | OpKind::Asin
            | OpKind::Atan
            | OpKind::Cos
            | OpKind::Cosh
            | OpKind::Exp
            | OpKind::Log
            | OpKind::Sign
            | OpKind::Sin
            | OpKind::Sinh
            | OpKind::Sqrt
            | OpKind::Tan
            | OpKind::Tanh
            | OpKind::Alias
            | OpKind::Assign
            | OpKind::Index
            | OpKind::IndexCondExpr => Arity::Exact(1),

            OpKind::Add
            | OpKind::Sub
            | OpKind::Mul
            | OpKind::Div
            | OpKind::Pow
            | OpKind::ArrayElement
            | OpKind::LoopIndexedTmp
            | OpKind::CondResult => Arity::Exact(2),

            OpKind::ComLt
            | OpKind::ComLe
            | OpKind::ComEq
            | OpKind::ComGe
            | OpKind::ComGt
            | OpKind::ComNe => Arity::Exact(4),

            OpKind::LoopStart => Arity::Between(1, 2),

            OpKind::ArrayCreation
            | OpKind::DependentMultiAssign
            | OpKind::LoopEnd
            | OpKind::LoopIndexedDep
            | OpKind::Tmp
            | OpKind::IndexAssign
            | OpKind::StartIf
            | OpKind::Else
            | OpKind::EndIf => Arity::AtLeast(1),

            OpKind::ElseIf | OpKind::AtomicForward => Arity::AtLeast(2),
            OpKind::AtomicReverse => Arity::AtLeast(4),

            OpKind::SparseArrayCreation | OpKind::LoopIndexedIndep | OpKind::DependentRefRhs => {
                Arity::AtLeast(0)
            }
        }
    }

    /// Unary mathematical functions (`sin`, `exp`, `sqrt`, ...).
    pub fn is_unary_function(self) -> bool {
        matches!(
            self,
            OpKind::Abs
                | OpKind::Acos
                | OpKind::Asin
                | OpKind::Atan
                | OpKind::Cos
                | OpKind::Cosh
                | OpKind::Exp
                | OpKind::Log
                | OpKind::Sign
                | OpKind::Sin
                | OpKind::Sinh
                | OpKind::Sqrt
                | OpKind::Tan
                | OpKind::Tanh
        )
    }

    /// Kinds rendered as a function application (never parenthesized).
    pub fn is_function(self) -> bool {
        self.is_unary_function() || self == OpKind::Pow
    }

    /// Comparisons with select (`ComLt` .. `ComNe`).
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpKind::ComLt
                | OpKind::ComLe
                | OpKind::ComEq
                | OpKind::ComGe
                | OpKind::ComGt
                | OpKind::ComNe
        )
    }

    /// Dense or sparse array creation.
    pub fn is_array_creation(self) -> bool {
        matches!(self, OpKind::ArrayCreation | OpKind::SparseArrayCreation)
    }

    /// Atomic function calls.
    pub fn is_atomic(self) -> bool {
        matches!(self, OpKind::AtomicForward | OpKind::AtomicReverse)
    }

    /// Structured if/else-if/else/end-if nodes and branch results.
    pub fn is_conditional_structure(self) -> bool {
        matches!(
            self,
            OpKind::StartIf | OpKind::ElseIf | OpKind::Else | OpKind::EndIf | OpKind::CondResult
        )
    }

    /// Short human-readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            OpKind::Add => "a + b",
            OpKind::Sub => "a - b",
            OpKind::Mul => "a * b",
            OpKind::Div => "a / b",
            OpKind::Pow => "pow(a, b)",
            OpKind::UnMinus => "-(a)",
            OpKind::Abs => "abs()",
            OpKind::Acos => "acos()",
            OpKind::Asin => "asin()",
            OpKind::Atan => "atan()",
            OpKind::Cos => "cos()",
            OpKind::Cosh => "cosh()",
            OpKind::Exp => "exp()",
            OpKind::Log => "log()",
            OpKind::Sign => "sign()",
            OpKind::Sin => "sin()",
            OpKind::Sinh => "sinh()",
            OpKind::Sqrt => "sqrt()",
            OpKind::Tan => "tan()",
            OpKind::Tanh => "tanh()",
            OpKind::ComLt => "left < right ? t : f",
            OpKind::ComLe => "left <= right ? t : f",
            OpKind::ComEq => "left == right ? t : f",
            OpKind::ComGe => "left >= right ? t : f",
            OpKind::ComGt => "left > right ? t : f",
            OpKind::ComNe => "left != right ? t : f",
            OpKind::Inv => "independent()",
            OpKind::Alias => "alias",
            OpKind::Assign => "a = b",
            OpKind::ArrayCreation => "new array[size]",
            OpKind::SparseArrayCreation => "new sparse array[size]",
            OpKind::ArrayElement => "array[i]",
            OpKind::AtomicForward => "atomic.forward(q, p, tx, ty)",
            OpKind::AtomicReverse => "atomic.reverse(p, tx, ty, px, py)",
            OpKind::DependentMultiAssign => "dep += a",
            OpKind::DependentRefRhs => "dep (rhs)",
            OpKind::LoopStart => "for",
            OpKind::LoopEnd => "endfor",
            OpKind::LoopIndexedIndep => "loop indexed independent",
            OpKind::LoopIndexedDep => "loop indexed dependent",
            OpKind::LoopIndexedTmp => "loop indexed temporary",
            OpKind::Tmp => "tmp",
            OpKind::TmpDcl => "tmp declaration",
            OpKind::IndexDeclaration => "index declaration",
            OpKind::Index => "index",
            OpKind::IndexAssign => "index = pattern",
            OpKind::IndexCondExpr => "index condition",
            OpKind::StartIf => "if",
            OpKind::ElseIf => "else if",
            OpKind::Else => "else",
            OpKind::EndIf => "endif",
            OpKind::CondResult => "if result",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
