use rulex_model::{Comparator, Labels};

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bare numeric literal: `90`, `1.5e3`, `NaN`.
    Scalar(Scalar),
    /// Quoted string literal, only meaningful as a function argument.
    StringLiteral(StringLiteral),
    /// `metric{label="value"}`
    InstantSelector(InstantSelector),
    /// `metric{label="value"}[5m]`
    RangeSelector(RangeSelector),
    /// `rate(x[5m])`
    Function(FunctionCall),
    /// `sum by (job) (x)`
    Aggregation(Aggregation),
    /// `-x`
    Unary(UnaryOperation),
    /// `x > 90`, `a + b`, `a and b`
    Binary(BinaryOperation),
    /// `(x)`; kept so that rendering preserves the user's grouping.
    Paren(Box<Expr>),
}

impl Expr {
    pub fn scalar(value: f64) -> Self {
        Expr::Scalar(Scalar { value })
    }

    /// Short node name for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Scalar(_) => "scalar",
            Expr::StringLiteral(_) => "string",
            Expr::InstantSelector(_) => "instant_selector",
            Expr::RangeSelector(_) => "range_selector",
            Expr::Function(_) => "function",
            Expr::Aggregation(_) => "aggregation",
            Expr::Unary(_) => "unary",
            Expr::Binary(_) => "binary",
            Expr::Paren(_) => "paren",
        }
    }
}

/// Numeric literal. Equality treats every NaN as equal to every other NaN,
/// so `NaN` parses to the same tree each time.
#[derive(Debug, Clone, Copy)]
pub struct Scalar {
    pub value: f64,
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value || (self.value.is_nan() && other.value.is_nan())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub value: String,
}

/// Selects series by metric name and label matchers at a single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantSelector {
    /// Metric name; `None` for `{job="x"}` style selectors.
    pub selector_name: Option<String>,
    pub labels: Labels,
    /// Raw duration of an `offset` modifier, e.g. `"5m"`.
    pub offset: Option<String>,
}

impl InstantSelector {
    pub fn new(selector_name: impl Into<String>, labels: Labels) -> Self {
        Self {
            selector_name: Some(selector_name.into()),
            labels,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelector {
    /// Selector part; its `offset` is always `None`.
    pub selector: InstantSelector,
    /// Raw range duration, e.g. `"5m"`.
    pub range: String,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOp {
    Sum,
    Min,
    Max,
    Avg,
    Group,
    Stddev,
    Stdvar,
    Count,
    CountValues,
    Bottomk,
    Topk,
    Quantile,
}

impl AggregationOp {
    const ALL: [AggregationOp; 12] = [
        AggregationOp::Sum,
        AggregationOp::Min,
        AggregationOp::Max,
        AggregationOp::Avg,
        AggregationOp::Group,
        AggregationOp::Stddev,
        AggregationOp::Stdvar,
        AggregationOp::Count,
        AggregationOp::CountValues,
        AggregationOp::Bottomk,
        AggregationOp::Topk,
        AggregationOp::Quantile,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AggregationOp::Sum => "sum",
            AggregationOp::Min => "min",
            AggregationOp::Max => "max",
            AggregationOp::Avg => "avg",
            AggregationOp::Group => "group",
            AggregationOp::Stddev => "stddev",
            AggregationOp::Stdvar => "stdvar",
            AggregationOp::Count => "count",
            AggregationOp::CountValues => "count_values",
            AggregationOp::Bottomk => "bottomk",
            AggregationOp::Topk => "topk",
            AggregationOp::Quantile => "quantile",
        }
    }

    /// Keywords are case-insensitive.
    pub fn from_ident(ident: &str) -> Option<Self> {
        AggregationOp::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(ident))
    }

    /// `topk(5, x)` and friends take a parameter before the vector.
    pub const fn takes_param(&self) -> bool {
        matches!(
            self,
            AggregationOp::CountValues
                | AggregationOp::Bottomk
                | AggregationOp::Topk
                | AggregationOp::Quantile
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    By(Vec<String>),
    Without(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub op: AggregationOp,
    pub param: Option<Box<Expr>>,
    pub expr: Box<Expr>,
    pub grouping: Option<Grouping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperation {
    pub operator: UnaryOperator,
    pub expr: Box<Expr>,
}

/// Binary operators, grouped by the role they play in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Atan2,
    Compare(Comparator),
    And,
    Or,
    Unless,
}

impl BinaryOperator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
            BinaryOperator::Atan2 => "atan2",
            BinaryOperator::Compare(c) => c.as_str(),
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Unless => "unless",
        }
    }

    /// The comparator, if this operator is a relational one.
    pub const fn as_comparator(&self) -> Option<Comparator> {
        match self {
            BinaryOperator::Compare(c) => Some(*c),
            _ => None,
        }
    }

    pub const fn is_set_operator(&self) -> bool {
        matches!(
            self,
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Unless
        )
    }

    /// Binding strength; higher binds tighter.
    pub(crate) const fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And | BinaryOperator::Unless => 2,
            BinaryOperator::Compare(_) => 3,
            BinaryOperator::Add | BinaryOperator::Sub => 4,
            BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod
            | BinaryOperator::Atan2 => 5,
            BinaryOperator::Pow => 6,
        }
    }

    pub(crate) const fn is_right_associative(&self) -> bool {
        matches!(self, BinaryOperator::Pow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingKind {
    On,
    Ignoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSide {
    Left,
    Right,
}

/// `on (a, b) group_left (c)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorMatching {
    pub kind: MatchingKind,
    pub labels: Vec<String>,
    pub group: Option<(GroupSide, Vec<String>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub operator: BinaryOperator,
    pub left_hand: Box<Expr>,
    pub right_hand: Box<Expr>,
    /// `bool` modifier on a comparison.
    pub return_bool: bool,
    pub matching: Option<VectorMatching>,
}

impl BinaryOperation {
    /// Plain `left <operator> right` with no modifiers.
    pub fn new(left_hand: Expr, operator: BinaryOperator, right_hand: Expr) -> Self {
        Self {
            operator,
            left_hand: Box::new(left_hand),
            right_hand: Box::new(right_hand),
            return_bool: false,
            matching: None,
        }
    }
}

impl From<BinaryOperation> for Expr {
    fn from(op: BinaryOperation) -> Self {
        Expr::Binary(op)
    }
}

impl From<InstantSelector> for Expr {
    fn from(sel: InstantSelector) -> Self {
        Expr::InstantSelector(sel)
    }
}

impl From<Scalar> for Expr {
    fn from(s: Scalar) -> Self {
        Expr::Scalar(s)
    }
}
