//! Integration tests for error reporting
//!
//! These tests cover diagnostic messages, their positions, and the
//! resource limits every parser shares.

use monexpr::parsers::*;

fn message<T>(result: &Parsed<T>) -> Option<String> {
    result.error().map(ToString::to_string)
}

// ============================================================================
// Message Formats
// ============================================================================

#[test]
fn test_unexpected_message_is_one_based() {
    let error = ParseError::unexpected("incorrect formula", 4);
    assert_eq!(error.to_string(), "incorrect formula at position 5");
    assert_eq!(error.position(), Some(4));
}

#[test]
fn test_unescaped_character() {
    let result = EscapedStringParser::default().parse("path\\to", 0);

    assert!(result.is_fail());
    assert_eq!(
        message(&result).as_deref(),
        Some("value contains unescaped character at position 5")
    );
}

#[test]
fn test_invalid_rules_points_at_clause() {
    let result = ValidationRuleParser::new().parse("required | db hosts", 0);

    assert!(result.is_fail());
    assert_eq!(
        message(&result).as_deref(),
        Some("Cannot parse validation rules \"required | db hosts\" at position 12.")
    );
}

#[test]
fn test_incorrect_syntax_is_truncated() {
    let tail = "x".repeat(60);
    let result = UpdateIntervalParser::default().parse(&format!("30;{}", tail), 0);

    let expected = format!("incorrect syntax near \"{} ...\"", "x".repeat(50));
    assert_eq!(message(&result), Some(expected));
}

#[test]
fn test_unexpected_end_of_interval() {
    let result = UpdateIntervalParser::default().parse("30;", 0);
    assert_eq!(message(&result).as_deref(), Some("unexpected end of interval"));
}

#[test]
fn test_expression_macro_error() {
    let result = ExpressionMacroParser::default().parse("{?last(/host/key) +}", 0);

    assert!(result.is_fail());
    assert!(matches!(result.error(), Some(ParseError::IncorrectExpression { .. })));
}

#[test]
fn test_condition_formula_reports_stop() {
    let result = ConditionFormulaParser::new().parse("A and B )", 0);

    assert_eq!(result.status(), ParseStatus::SuccessContinue);
    assert_eq!(result.get_match(), "A and B");
    assert_eq!(result.error().and_then(|e| e.position()), Some(8));
}

// ============================================================================
// Interval Diagnostics
// ============================================================================

fn interval_error(custom: &str) -> String {
    let source = format!("30s;{}", custom);
    let result = UpdateIntervalParser::default().parse(&source, 0);

    assert!(result.is_fail(), "{}", custom);
    message(&result).unwrap_or_default()
}

fn near(text: &str) -> String {
    format!("incorrect syntax near \"{}\"", text)
}

const END: &str = "unexpected end of interval";

#[test]
fn test_invalid_flexible_intervals() {
    let cases = [
        ("86401/7,23:59-24:00", near("1/7,23:59-24:00")),
        ("86400/7-7,23:59-23:59", END.to_string()),
        ("86400/8-9,23:59-24:00", near("8-9,23:59-24:00")),
        ("7-7,23:59-24:00", near("-7,23:59-24:00")),
        ("5/2,1:00-9:20;", END.to_string()),
        ("5 /7,0:00-24:00", near(" /7,0:00-24:00")),
        ("5/77,0:00-24:00", near("7,0:00-24:00")),
        ("5/7-9,0:00-24:00", near(",0:00-24:00")),
        ("5/7-6,0:00-24:00", near("6,0:00-24:00")),
        ("0/0,0:00-24:00", near("0,0:00-24:00")),
        ("1/1-000,0:00-24:00", near("000,0:00-24:00")),
        ("1/1-7-7,0:00-24:00", near("-7,0:00-24:00")),
        ("5/1-6,:00-24:00", near(":00-24:00")),
        ("0/2,99:00-24:00", near("9:00-24:00")),
        ("0/2,000:00-24:00", near(":00-24:00")),
        ("0/2,00:000-24:00", near("-24:00")),
        ("0/2,00:0024:00", near(":00")),
        ("0/2,23:59-2400", near("00")),
        ("0/2,00:01-00:00", END.to_string()),
        ("0/2,5:00-29:00", near("9:00")),
        ("0/2,0:00-9:000", END.to_string()),
        ("0/2,0:00-111:2", near("1:2")),
        ("0/2,1:00-9::20", near(":20")),
        ("0/2,1:00-9:20a", near("a")),
        ("0/2,24:00-23:00", near("4:00-23:00")),
        ("0/2,00:00-024:00", near(":00")),
        ("50/7,0:01-0:02;0/2,00-24:00", near("-24:00")),
        ("50/1-\u{e9},00:00-23:59", near("\u{e9},00:00-23:59")),
    ];

    for (custom, expected) in cases {
        assert_eq!(interval_error(custom), expected, "{}", custom);
    }
}

#[test]
fn test_invalid_scheduling_intervals() {
    let cases = [
        ("md31-30", near("0")),
        ("md1,2/1", near("/1")),
        ("mdmd", near("md")),
        ("md/", END.to_string()),
        ("md30-32/5", END.to_string()),
        ("md32-28/4", near("2-28/4")),
        ("md0", END.to_string()),
        ("md0/0", near("/0")),
        ("md1-31/0000", near("000")),
        ("md1-31/001", near("01")),
        ("md01-0031/1", near("031/1")),
        ("md/31", near("1")),
        ("md/003", near("03")),
        ("md1-5/4,9-7", END.to_string()),
        ("wd7-6", END.to_string()),
        ("wd01-7", near("1-7")),
        ("wd1-07", near("7")),
        ("wd1-7/06", near("6")),
        ("wd/10", near("0")),
        ("wd6-7/5", END.to_string()),
        ("wd1-5/4,9-7", near("-7")),
        ("wd1-7/6md1", near("md1")),
        ("h24", near("4")),
        ("h000", END.to_string()),
        ("h100", near("0")),
        ("h0-023", END.to_string()),
        ("h000-0", near("-0")),
        ("h/0", END.to_string()),
        ("h00-23/00", near("0")),
        ("h00-23/023", END.to_string()),
        ("h0023/01", near("/01")),
        ("h00-23wd1-7", near("wd1-7")),
        ("m", near("m")),
        ("ms", near("s")),
        ("m60", near("0")),
        ("m00-23;m", near("m")),
        ("md1-31m00-59h00-23wd1-7", near("h00-23wd1-7")),
        ("s", END.to_string()),
        ("s00-590/59", near("0/59")),
        ("s00-59m00-59h00-23wd1-7", near("m00-59h00-23wd1-7")),
    ];

    for (custom, expected) in cases {
        assert_eq!(interval_error(custom), expected, "{}", custom);
    }
}

// ============================================================================
// Structural Failures Carry No Diagnostic
// ============================================================================

#[test]
fn test_structural_failures_are_silent() {
    assert!(Ipv4Parser::new().parse("1.2.3", 0).error().is_none());
    assert!(LldMacroParser::new().parse("{#lower}", 0).error().is_none());
    assert!(FunctionIdParser::new().parse("{0}", 0).error().is_none());
    assert!(PortParser::default().parse("65536", 0).error().is_none());
}

// ============================================================================
// Resource Limits
// ============================================================================

#[test]
fn test_input_too_large() {
    let config = ParserConfig::new().with_max_input_size(8);
    let result = LldMacroParser::new().with_config(config).parse("{#MACRO_NAME}", 0);

    assert!(result.is_fail());
    assert_eq!(
        result.error(),
        Some(&ParseError::InputTooLarge {
            input_size: 13,
            max_size: 8
        })
    );
}

#[test]
fn test_recursion_limit_on_nested_parameters() {
    let depth = 100;
    let source = format!("key{}{}", "[".repeat(depth), "]".repeat(depth));
    let config = ParserConfig::new().with_max_recursion_depth(16);
    let result = ItemKeyParser::new().with_config(config).parse(&source, 0);

    assert!(result.is_fail());
    assert!(matches!(
        result.error(),
        Some(ParseError::RecursionLimitExceeded { max_depth: 16, .. })
    ));
}

#[test]
fn test_recursion_limit_on_formulas() {
    let depth = 200;
    let source = format!("{}A{}", "(".repeat(depth), ")".repeat(depth));
    let result = ConditionFormulaParser::new().parse(&source, 0);

    assert!(result.is_fail());
    assert!(matches!(
        result.error(),
        Some(ParseError::RecursionLimitExceeded { .. })
    ));

    let shallow = format!("{}A{}", "(".repeat(10), ")".repeat(10));
    assert!(ConditionFormulaParser::new().parse(&shallow, 0).is_success());
}

#[test]
fn test_recursion_limit_on_expressions() {
    let depth = 500;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let result = ExpressionParser::default().parse(&source, 0);

    assert!(result.is_fail());
    assert!(matches!(
        result.error(),
        Some(ParseError::RecursionLimitExceeded { .. })
    ));
}

#[test]
fn test_errors_serialize() {
    let json = serde_json::to_value(ParseError::DuplicateRule {
        name: "fatal".into(),
        position: 15,
    })
    .unwrap();

    assert_eq!(json["kind"], "duplicate_rule");
    assert_eq!(json["name"], "fatal");
}
