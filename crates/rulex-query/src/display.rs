//! Query-text rendering. Parsed trees render back to text that parses to an
//! equal tree; scalars compare NaN-equal for this purpose (see [`Scalar`]).

use std::fmt::{self, Display, Formatter, Write};

use rulex_model::Labels;

use crate::ast::{
    Aggregation, BinaryOperation, BinaryOperator, Expr, FunctionCall, GroupSide, Grouping,
    InstantSelector, MatchingKind, RangeSelector, Scalar, StringLiteral, UnaryOperation,
    UnaryOperator, VectorMatching,
};

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Scalar(s) => s.fmt(f),
            Expr::StringLiteral(s) => s.fmt(f),
            Expr::InstantSelector(s) => s.fmt(f),
            Expr::RangeSelector(r) => r.fmt(f),
            Expr::Function(c) => c.fmt(f),
            Expr::Aggregation(a) => a.fmt(f),
            Expr::Unary(u) => u.fmt(f),
            Expr::Binary(b) => b.fmt(f),
            Expr::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let v = self.value;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "Inf" } else { "-Inf" })
        } else {
            write!(f, "{v}")
        }
    }
}

impl Display for StringLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_quoted(f, &self.value)
    }
}

impl Display for InstantSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.selector_name {
            f.write_str(name)?;
        }
        let bare_is_literal = self
            .selector_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case("inf") || name.eq_ignore_ascii_case("nan"));
        if self.selector_name.is_none() || bare_is_literal || !self.labels.is_empty() {
            write_matchers(f, &self.labels)?;
        }
        write_offset(f, self.offset.as_deref())
    }
}

impl Display for RangeSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.selector, self.range)?;
        write_offset(f, self.offset.as_deref())
    }
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args)?;
        f.write_char(')')
    }
}

impl Display for Grouping {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (keyword, labels) = match self {
            Grouping::By(labels) => ("by", labels),
            Grouping::Without(labels) => ("without", labels),
        };
        write!(f, "{keyword} (")?;
        write_list(f, labels)?;
        f.write_char(')')
    }
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.op.as_str())?;
        if let Some(grouping) = &self.grouping {
            write!(f, " {grouping} ")?;
        }
        f.write_char('(')?;
        if let Some(param) = &self.param {
            write!(f, "{param}, ")?;
        }
        write!(f, "{})", self.expr)
    }
}

impl Display for UnaryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = match self.operator {
            UnaryOperator::Minus => '-',
            UnaryOperator::Plus => '+',
        };
        write!(f, "{sign}{}", self.expr)
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for VectorMatching {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            MatchingKind::On => "on",
            MatchingKind::Ignoring => "ignoring",
        };
        write!(f, "{keyword} (")?;
        write_list(f, &self.labels)?;
        f.write_char(')')?;

        if let Some((side, labels)) = &self.group {
            let keyword = match side {
                GroupSide::Left => "group_left",
                GroupSide::Right => "group_right",
            };
            write!(f, " {keyword}")?;
            if !labels.is_empty() {
                f.write_str(" (")?;
                write_list(f, labels)?;
                f.write_char(')')?;
            }
        }
        Ok(())
    }
}

impl Display for BinaryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.left_hand, self.operator)?;
        if self.return_bool {
            f.write_str(" bool")?;
        }
        let rhs = self.right_hand.to_string();
        if let Some(matching) = &self.matching {
            write!(f, " {matching}")?;
            // A bare `group_left (x)` would read `(x)` as the label list.
            let bare_group = matching.group.as_ref().is_some_and(|(_, l)| l.is_empty());
            if bare_group && rhs.starts_with('(') {
                f.write_str(" ()")?;
            }
        }
        write!(f, " {rhs}")
    }
}

fn write_matchers(f: &mut Formatter<'_>, labels: &Labels) -> fmt::Result {
    f.write_char('{')?;
    for (i, m) in labels.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}{}", m.name(), m.op())?;
        write_quoted(f, m.value())?;
    }
    f.write_char('}')
}

fn write_offset(f: &mut Formatter<'_>, offset: Option<&str>) -> fmt::Result {
    match offset {
        Some(offset) => write!(f, " offset {offset}"),
        None => Ok(()),
    }
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

#[cfg(test)]
mod tests {
    use rulex_model::{Comparator, Labels};

    use crate::{BinaryOperation, BinaryOperator, Expr, InstantSelector, parse};

    fn reparses(src: &str) -> String {
        let expr = parse(src).unwrap();
        let text = expr.to_string();
        assert_eq!(parse(&text).unwrap(), expr, "{src:?} rendered as {text:?}");
        text
    }

    #[test]
    fn renders_canonical_text() {
        assert_eq!(reparses("cpu_util{} > 90"), "cpu_util > 90");
        assert_eq!(
            reparses(r#"up{job = "node" , env=~'prod'}==0"#),
            r#"up{job="node", env=~"prod"} == 0"#
        );
        assert_eq!(reparses("x >bool 1.5"), "x > bool 1.5");
        assert_eq!(reparses("temp <= -5"), "temp <= -5");
        assert_eq!(reparses("1e3"), "1000");
    }

    #[test]
    fn renders_complex_trees() {
        let cases = [
            "sum by (job) (rate(http_requests_total{code=~\"5..\"}[5m]))",
            "topk(3, cpu) > 0.5",
            "count without (instance) (up) unless on (job) group_left (team) absent(x)",
            "(a + b) * c ^ -2",
            "-up offset 5m",
            "avg_over_time(up[1h] offset 1d) / ignoring (mode) group_right x",
            "label_replace(up, \"dst\", \"$1\", \"src\", \"(.*)\")",
            "{__name__=\"up\"} != Inf",
        ];
        for src in cases {
            assert_eq!(reparses(src), src);
        }
    }

    #[test]
    fn escapes_label_values() {
        let mut labels = Labels::new();
        labels.insert("path", "C:\\tmp \"x\"\n");
        let expr: Expr = InstantSelector::new("files", labels).into();

        let text = expr.to_string();
        assert_eq!(text, r#"files{path="C:\\tmp \"x\"\n"}"#);
        assert_eq!(parse(&text).unwrap(), expr);
    }

    #[test]
    fn literal_like_metric_names_keep_braces() {
        for name in ["inf", "NaN", "Inf", "nan"] {
            let src = format!("{name}{{}} > 5");
            assert_eq!(reparses(&src), src);

            let expr: Expr = BinaryOperation::new(
                InstantSelector::new(name, Labels::new()).into(),
                BinaryOperator::Compare(Comparator::Gt),
                Expr::scalar(5.0),
            )
            .into();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr);
        }
        assert_eq!(reparses("info > 5"), "info > 5");
    }

    #[test]
    fn bare_group_modifier_before_parenthesized_operand() {
        assert_eq!(
            reparses("a * on (job) group_left () (b + c)"),
            "a * on (job) group_left () (b + c)"
        );
        assert_eq!(reparses("a * on (job) group_left b"), "a * on (job) group_left b");
    }

    #[test]
    fn special_scalars_reparse_equal() {
        for src in ["NaN", "Inf", "-Inf", "up > NaN", "-NaN"] {
            reparses(src);
        }
    }

    /// xorshift64; deterministic so failures reproduce.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
            items[(self.next() % items.len() as u64) as usize]
        }
    }

    fn gen_selector(rng: &mut Rng) -> String {
        let name = rng.pick(&["up", "cpu_util", "inf", "NaN", "sum", "node:load1", ""]);
        let labels = rng.pick(&[
            "",
            r#"{job="node"}"#,
            r#"{env=~'prod|dev', zone!="eu"}"#,
            r#"{path!~"C:\\tmp \"x\"\n"}"#,
            r#"{a="1",}"#,
        ]);
        let literal_like = name == "inf" || name == "NaN";
        let labels = if name.is_empty() && labels.is_empty() {
            r#"{job="x"}"#
        } else if labels.is_empty() && (literal_like || rng.next() % 3 == 0) {
            "{}"
        } else {
            labels
        };
        let offset = rng.pick(&["", "", " offset 5m"]);
        format!("{name}{labels}{offset}")
    }

    fn gen_expr(rng: &mut Rng, depth: u32) -> String {
        let leaf = depth == 0 || rng.next() % 4 == 0;
        if leaf {
            return match rng.next() % 4 {
                0 => rng
                    .pick(&["0", "90", "1.5", "0.25", "1e3", "Inf", "NaN", "0x1F"])
                    .to_string(),
                1 => format!("-{}", rng.pick(&["2", "0.5", "Inf"])),
                _ => gen_selector(rng),
            };
        }

        let inner = gen_expr(rng, depth - 1);
        match rng.next() % 7 {
            0 => format!("({inner})"),
            1 => format!("-({inner})"),
            2 => format!("abs({inner})"),
            3 => format!("rate(up{{job=\"x\"}}[{}])", rng.pick(&["5m", "1h", "30s"])),
            4 => {
                let agg = rng.pick(&["sum", "avg by (job)", "max without (instance)"]);
                format!("{agg} ({inner})")
            }
            5 => format!("topk(3, {inner})"),
            _ => {
                let rhs = gen_expr(rng, depth - 1);
                let op = rng.pick(&[
                    "+", "-", "*", "/", "%", "^", "atan2", "==", "!=", ">", "<", ">=", "<=",
                    "> bool", "and", "or", "unless", "+ on (job)", "* ignoring (a) group_left ()",
                    "/ on (job) group_right (team)",
                ]);
                format!("({inner}) {op} ({rhs})")
            }
        }
    }

    #[test]
    fn generated_expressions_render_stably() {
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
        for _ in 0..2_000 {
            let src = gen_expr(&mut rng, 4);
            let expr = parse(&src).unwrap_or_else(|e| panic!("{src:?} did not parse: {e}"));

            let text = expr.to_string();
            let again = parse(&text).unwrap_or_else(|e| panic!("{text:?} did not reparse: {e}"));
            assert_eq!(again, expr, "{src:?} rendered as {text:?}");
            assert_eq!(again.to_string(), text);
        }
    }

    #[test]
    fn renders_constructed_comparison() {
        let expr: Expr = BinaryOperation::new(
            InstantSelector::new("disk_free", Labels::new()).into(),
            BinaryOperator::Compare(Comparator::Lt),
            Expr::scalar(0.1),
        )
        .into();
        assert_eq!(expr.to_string(), "disk_free < 0.1");
    }
}
