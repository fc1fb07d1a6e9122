//! Column definition formatting
//!
//! A column renders to one clause (`` `name` type NOT NULL DEFAULT ... ``).
//! The script emits it under the configured default policy; comparisons use a
//! canonical variant of it that cannot fail.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{DiffConfig, UnsafeDefaultPolicy};
use crate::error::{Error, Result};
use crate::schema::types::Column;
use crate::utils::naming::QuoteStyle;

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid regex"));

static BIT_OR_HEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)[bx]'[0-9a-f]*'$").expect("valid regex"));

/// `now()`, `uuid()`, `nextval('seq'::regclass)`, `current_timestamp(6)`
static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s)[A-Za-z_][A-Za-z0-9_.]*\(.*\)$").expect("valid regex"));

/// Bare only outside character columns, where they would be plain words
const NON_TEXT_KEYWORDS: &[&str] = &[
    "TRUE",
    "FALSE",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

/// How a raw default expression is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    /// `CURRENT_TIMESTAMP`, emitted unquoted
    CurrentTimestamp,
    /// Literal `NULL`, never emitted
    Null,
    /// Numbers, bit/hex literals, keywords, function calls and parenthesized expressions
    Bare,
    /// Already a single-quoted literal
    Quoted,
    /// Anything else: wrapped in single quotes
    Text,
}

impl DefaultKind {
    /// Classify a default of a column with type `sql_type`
    pub fn classify(raw: &str, sql_type: &str) -> Self {
        let text = raw.trim();

        if text.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
            DefaultKind::CurrentTimestamp
        } else if text.eq_ignore_ascii_case("NULL") {
            DefaultKind::Null
        } else if NUMERIC_LITERAL.is_match(text)
            || BIT_OR_HEX_LITERAL.is_match(text)
            || FUNCTION_CALL.is_match(text)
            || (text.starts_with('(') && text.ends_with(')'))
            || (!is_character_type(sql_type)
                && NON_TEXT_KEYWORDS.iter().any(|kw| text.eq_ignore_ascii_case(kw)))
        {
            DefaultKind::Bare
        } else if is_quoted_literal(text) {
            DefaultKind::Quoted
        } else {
            DefaultKind::Text
        }
    }
}

/// Types whose defaults are strings: `char`, `varchar`, `text`, `enum`, `set`, ...
fn is_character_type(sql_type: &str) -> bool {
    let lowered = sql_type.trim().to_lowercase();
    lowered.contains("char")
        || lowered.contains("text")
        || lowered.starts_with("enum")
        || lowered.starts_with("set")
}

/// `'...'` where every inner quote is doubled
fn is_quoted_literal(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('\'')
        && text.ends_with('\'')
        && !text[1..text.len() - 1].replace("''", "").contains('\'')
}

/// Renders columns into canonical definition clauses
#[derive(Debug, Clone)]
pub struct ColumnFormatter {
    quote_style: QuoteStyle,
    compare_nullability_and_defaults: bool,
    default_for_nullable_columns: bool,
    unsafe_default_policy: UnsafeDefaultPolicy,
}

impl ColumnFormatter {
    pub fn new(config: &DiffConfig) -> Self {
        Self {
            quote_style: config.quote_style(),
            compare_nullability_and_defaults: config.compare_nullability_and_defaults,
            default_for_nullable_columns: config.default_for_nullable_columns,
            unsafe_default_policy: config.unsafe_default_policy,
        }
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    /// Render a column into the clause written to the script
    pub fn format(&self, column: &Column) -> Result<String> {
        self.render(column, Some(self.unsafe_default_policy))
    }

    /// Clause used only for comparison. Text defaults get their quotes
    /// doubled and line breaks kept, so this never fails.
    pub fn canonical(&self, column: &Column) -> String {
        self.render(column, None)
            .unwrap_or_else(|_| format!("{} {}", self.quote_style.quote(&column.name), column.sql_type))
    }

    /// `policy` is `None` for the canonical comparison form
    fn render(&self, column: &Column, policy: Option<UnsafeDefaultPolicy>) -> Result<String> {
        let mut definition = format!("{} {}", self.quote_style.quote(&column.name), column.sql_type);

        if !self.compare_nullability_and_defaults {
            return Ok(definition);
        }

        if !column.nullable {
            definition.push_str(" NOT NULL");
        }

        // Nullable columns only get a DEFAULT when explicitly enabled
        if !column.nullable || self.default_for_nullable_columns {
            if let Some(default) = &column.default {
                if let Some(rendered) = render_default(column, default, policy)? {
                    definition.push_str(" DEFAULT ");
                    definition.push_str(&rendered);
                }
            }
        }

        Ok(definition)
    }

    /// Render a default expression, `None` when no clause should be emitted
    pub fn format_default(&self, column: &Column, raw: &str) -> Result<Option<String>> {
        render_default(column, raw, Some(self.unsafe_default_policy))
    }

    /// Two columns are unchanged when their clauses match ignoring case
    pub fn equivalent(&self, a: &Column, b: &Column) -> bool {
        self.canonical(a).to_lowercase() == self.canonical(b).to_lowercase()
    }
}

fn render_default(
    column: &Column,
    raw: &str,
    policy: Option<UnsafeDefaultPolicy>,
) -> Result<Option<String>> {
    let rendered = match DefaultKind::classify(raw, &column.sql_type) {
        DefaultKind::Null => return Ok(None),
        DefaultKind::CurrentTimestamp | DefaultKind::Bare | DefaultKind::Quoted => {
            raw.trim().to_string()
        }
        DefaultKind::Text => match policy {
            Some(policy) => quote_text(&column.name, raw, policy)?,
            None => format!("'{}'", raw.replace('\'', "''")),
        },
    };

    Ok(Some(rendered))
}

fn quote_text(column_name: &str, raw: &str, policy: UnsafeDefaultPolicy) -> Result<String> {
    let unrenderable = || Error::UnrenderableDefault {
        column: column_name.to_string(),
        value: raw.to_string(),
    };
    let has_line_break = raw.contains('\n') || raw.contains('\r');

    match policy {
        UnsafeDefaultPolicy::Verbatim => Ok(format!("'{}'", raw)),
        UnsafeDefaultPolicy::Escape => {
            if has_line_break {
                return Err(unrenderable());
            }
            Ok(format!("'{}'", raw.replace('\'', "''")))
        }
        UnsafeDefaultPolicy::Reject => {
            if has_line_break || raw.contains('\'') {
                return Err(unrenderable());
            }
            Ok(format!("'{}'", raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn formatter() -> ColumnFormatter {
        ColumnFormatter::new(&DiffConfig::default())
    }

    fn formatter_with(edit: impl FnOnce(&mut DiffConfig)) -> ColumnFormatter {
        let mut config = DiffConfig::default();
        edit(&mut config);
        ColumnFormatter::new(&config)
    }

    #[rstest]
    #[case("CURRENT_TIMESTAMP", "timestamp", DefaultKind::CurrentTimestamp)]
    #[case("current_timestamp", "datetime", DefaultKind::CurrentTimestamp)]
    #[case("NULL", "varchar(10)", DefaultKind::Null)]
    #[case("0", "int", DefaultKind::Bare)]
    #[case("-12.50", "decimal(5,2)", DefaultKind::Bare)]
    #[case("1e3", "double", DefaultKind::Bare)]
    #[case("b'1'", "bit(1)", DefaultKind::Bare)]
    #[case("CURRENT_TIMESTAMP(6)", "timestamp(6)", DefaultKind::Bare)]
    #[case("now()", "timestamp", DefaultKind::Bare)]
    #[case("nextval('users_id_seq'::regclass)", "integer", DefaultKind::Bare)]
    #[case("true", "boolean", DefaultKind::Bare)]
    #[case("CURRENT_DATE", "date", DefaultKind::Bare)]
    #[case("(uuid())", "char(36)", DefaultKind::Bare)]
    #[case("'active'", "varchar(10)", DefaultKind::Quoted)]
    #[case("'it''s'", "varchar(10)", DefaultKind::Quoted)]
    #[case("active", "varchar(10)", DefaultKind::Text)]
    #[case("now", "varchar(10)", DefaultKind::Text)]
    #[case("localtime", "varchar(10)", DefaultKind::Text)]
    #[case("true", "varchar(10)", DefaultKind::Text)]
    #[case("FALSE", "text", DefaultKind::Text)]
    #[case("inf", "varchar(10)", DefaultKind::Text)]
    #[case("'broken", "varchar(10)", DefaultKind::Text)]
    fn classify_defaults(#[case] raw: &str, #[case] sql_type: &str, #[case] expected: DefaultKind) {
        assert_eq!(DefaultKind::classify(raw, sql_type), expected);
    }

    #[rstest]
    #[case(Column::new("state", "varchar(10)").with_default("now"), "`state` varchar(10) NOT NULL DEFAULT 'now'")]
    #[case(Column::new("flag", "varchar(10)").with_default("true"), "`flag` varchar(10) NOT NULL DEFAULT 'true'")]
    #[case(Column::new("flag", "tinyint(1)").with_default("true"), "`flag` tinyint(1) NOT NULL DEFAULT true")]
    #[case(Column::new("id", "integer").with_default("nextval('users_id_seq'::regclass)"), "`id` integer NOT NULL DEFAULT nextval('users_id_seq'::regclass)")]
    fn keywords_are_words_in_character_columns(#[case] column: Column, #[case] expected: &str) {
        assert_eq!(formatter().format(&column).unwrap(), expected);
    }

    #[rstest]
    #[case(Column::new("status", "varchar(10)").with_default("active"), "`status` varchar(10) NOT NULL DEFAULT 'active'")]
    #[case(Column::new("hits", "int").with_default("0"), "`hits` int NOT NULL DEFAULT 0")]
    #[case(Column::new("seen_at", "timestamp").with_default("CURRENT_TIMESTAMP"), "`seen_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP")]
    #[case(Column::new("note", "text").with_default("NULL"), "`note` text NOT NULL")]
    #[case(Column::new("id", "int"), "`id` int NOT NULL")]
    #[case(Column::new("name", "varchar(100)").nullable(true), "`name` varchar(100)")]
    #[case(Column::new("kind", "varchar(5)").nullable(true).with_default("basic"), "`kind` varchar(5)")]
    fn format_applies_nullability_and_default_rules(#[case] column: Column, #[case] expected: &str) {
        assert_eq!(formatter().format(&column).unwrap(), expected);
    }

    #[test]
    fn nullable_defaults_can_be_enabled() {
        let formatter = formatter_with(|c| c.default_for_nullable_columns = true);
        let column = Column::new("kind", "varchar(5)").nullable(true).with_default("basic");

        assert_eq!(formatter.format(&column).unwrap(), "`kind` varchar(5) DEFAULT 'basic'");
    }

    #[test]
    fn type_only_mode_ignores_nullability_and_defaults() {
        let formatter = formatter_with(|c| c.compare_nullability_and_defaults = false);
        let strict = Column::new("hits", "int").with_default("0");
        let loose = Column::new("hits", "INT").nullable(true);

        assert_eq!(formatter.format(&strict).unwrap(), "`hits` int");
        assert!(formatter.equivalent(&strict, &loose));
    }

    #[test]
    fn pre_quoted_default_formats_to_the_same_clause() {
        let raw = Column::new("status", "varchar(10)").with_default("active");
        let canonical = Column::new("status", "varchar(10)").with_default("'active'");

        assert_eq!(formatter().format(&raw).unwrap(), formatter().format(&canonical).unwrap());
        assert!(formatter().equivalent(&raw, &canonical));
    }

    #[test]
    fn equivalence_ignores_case_only() {
        let a = Column::new("Name", "VARCHAR(50)").nullable(true);
        let b = Column::new("name", "varchar(50)").nullable(true);
        let c = Column::new("name", "varchar(50)");

        assert!(formatter().equivalent(&a, &b));
        assert!(formatter().equivalent(&a, &a));
        assert!(!formatter().equivalent(&b, &c));
    }

    #[test]
    fn embedded_quote_is_rejected_by_default() {
        let column = Column::new("motto", "varchar(20)").with_default("it's");

        let err = formatter().format(&column).unwrap_err();
        assert!(matches!(err, Error::UnrenderableDefault { column, .. } if column == "motto"));
    }

    #[test]
    fn comparison_never_fails_on_unrenderable_defaults() {
        let formatter = formatter();
        let quoted = Column::new("motto", "varchar(20)").with_default("it's");
        let plain = Column::new("motto", "varchar(20)").with_default("ok");

        assert!(formatter.equivalent(&quoted, &quoted.clone()));
        assert!(!formatter.equivalent(&quoted, &plain));
        assert_eq!(formatter.canonical(&quoted), "`motto` varchar(20) NOT NULL DEFAULT 'it''s'");
        assert!(formatter.equivalent(&quoted, &quoted.clone().with_default("'it''s'")));
        assert!(formatter.format(&quoted).is_err());
    }

    #[rstest]
    #[case(UnsafeDefaultPolicy::Escape, "`motto` varchar(20) NOT NULL DEFAULT 'it''s'")]
    #[case(UnsafeDefaultPolicy::Verbatim, "`motto` varchar(20) NOT NULL DEFAULT 'it's'")]
    fn embedded_quote_under_lenient_policies(#[case] policy: UnsafeDefaultPolicy, #[case] expected: &str) {
        let formatter = formatter_with(|c| c.unsafe_default_policy = policy);
        let column = Column::new("motto", "varchar(20)").with_default("it's");

        assert_eq!(formatter.format(&column).unwrap(), expected);
    }

    #[test]
    fn line_breaks_cannot_be_escaped() {
        let formatter = formatter_with(|c| c.unsafe_default_policy = UnsafeDefaultPolicy::Escape);
        let column = Column::new("motto", "text").with_default("two\nlines");

        assert!(formatter.format(&column).is_err());
    }

    #[test]
    fn quote_style_follows_config() {
        let formatter = formatter_with(|c| c.identifier_quote_style = Some(QuoteStyle::Bracket));

        assert_eq!(formatter.format(&Column::new("id", "int")).unwrap(), "[id] int NOT NULL");
    }
}
