//! End-to-end extraction tests against real files.
//!
//! Every scenario runs through the public API and checks the file on disk
//! afterwards.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

use rextract::lang::common::{SourceParser, SourcePrinter};
use rextract::lang::printer::RubyPrinter;
use rextract::lang::ruby::RubyAdapter;
use rextract::refactor::structural::rename::{count_references, Renamer};
use rextract::{
    extract_method, ExtractConfig, ExtractEngine, ExtractError, ExtractRequest, FailureStage,
    MethodKind, NoName, PromptNameProvider, StrategyKind,
};

const CALCULATOR: &str = "\
class Calculator
  def calculate_total(items)
    result = 0
    apply_tax(result, items)
    format_currency(result)
  end
end
";

const PAYMENT_PROCESSOR: &str = "\
class PaymentProcessor
  def self.process_payment(amount, card)
    validate_card(card)
    apply_processing_fee(amount)
    charge_card(card, amount)
    send_receipt(card.email, amount)
  end
end
";

const LOGGER: &str = "\
class Logger
  class << self
    def log_event(event_type, details)
      timestamp = Time.now.iso8601
      formatted_message = \"#{timestamp} [#{event_type.upcase}] #{details}\"
      append_to_log_file(formatted_message)
      notify_subscribers(event_type, details) if critical?(event_type)
    end
  end
end
";

const USER_MANAGER: &str = "\
class UserManager
  def update_permissions(user, permissions)
    old_permissions = user.permissions
    user.permissions = permissions
    log_permission_change(user, old_permissions, permissions)
  end
end
";

const DATA_PROCESSOR: &str = "\
class DataProcessor
  def process(data)
    return [] if data.nil?

    result = []
    data.each do |item|
      if item.valid?
        transformed = transform_item(item)
        result << transformed if transformed
      end
    end

    finalize_results(result)
  end
end
";

/// Write `source` into a fresh temporary directory.
fn write_fixture(source: &str) -> (TempDir, String) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("subject.rb");
    fs::write(&path, source).unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

fn engine(strategy: StrategyKind) -> ExtractEngine {
    ExtractEngine::new(ExtractConfig {
        strategy,
        ..ExtractConfig::default()
    })
    .unwrap()
}

fn assert_parses(source: &str) {
    let mut parser = RubyAdapter::new().unwrap();
    if let Err(err) = parser.parse(source) {
        panic!("rewritten source does not parse: {err}\n{source}");
    }
}

/// Lines equal to `text` once surrounding whitespace is trimmed.
fn count_lines(source: &str, text: &str) -> usize {
    source.lines().filter(|line| line.trim() == text).count()
}

#[test]
fn test_instance_method_extraction_calculator() {
    let expected = "\
class Calculator
  def calculate_total(items)
    result = 0
    calculate_with_tax
    format_currency(result)
  end

  def calculate_with_tax
    apply_tax(result, items)
  end
end
";

    for strategy in [StrategyKind::Structural, StrategyKind::Text] {
        let (_dir, path) = write_fixture(CALCULATOR);
        let request =
            ExtractRequest::new(&path, "apply_tax(result, items)", 4, 4).with_method_name("calculate_with_tax");

        let outcome = engine(strategy).run(&request, &mut NoName).unwrap();
        assert_eq!(outcome.kind, MethodKind::Instance);
        assert_eq!(fs::read_to_string(&path).unwrap(), expected, "strategy {strategy}");
    }
}

#[test]
fn test_static_method_extraction_keeps_marker() {
    let expected = "\
class PaymentProcessor
  def self.process_payment(amount, card)
    validate_card(card)
    prepare_amount
    charge_card(card, amount)
    send_receipt(card.email, amount)
  end

  def self.prepare_amount
    apply_processing_fee(amount)
  end
end
";

    for strategy in [StrategyKind::Structural, StrategyKind::Text] {
        let (_dir, path) = write_fixture(PAYMENT_PROCESSOR);
        let request =
            ExtractRequest::new(&path, "apply_processing_fee(amount)", 4, 4).with_method_name("prepare_amount");

        let outcome = engine(strategy).run(&request, &mut NoName).unwrap();
        assert_eq!(outcome.kind, MethodKind::Static);
        assert_eq!(fs::read_to_string(&path).unwrap(), expected, "strategy {strategy}");
    }
}

#[test]
fn test_singleton_block_extraction_stays_inside_block() {
    let (_dir, path) = write_fixture(LOGGER);
    assert!(extract_method(
        &path,
        "timestamp = Time.now.iso8601",
        4,
        6,
        Some("format_log_message")
    ));

    let output = fs::read_to_string(&path).unwrap();
    assert_parses(&output);
    assert!(output.contains("      format_log_message\n      formatted_message = "));
    assert!(output.ends_with(
        "\n\n    def self.format_log_message\n      timestamp = Time.now.iso8601\n    end\n  end\nend\n"
    ));
}

#[test]
fn test_singleton_block_reports_singleton_kind() {
    let (_dir, path) = write_fixture(LOGGER);
    let request =
        ExtractRequest::new(&path, "timestamp = Time.now.iso8601", 4, 6).with_method_name("stamp");

    let outcome = engine(StrategyKind::Structural).run(&request, &mut NoName).unwrap();
    assert_eq!(outcome.kind, MethodKind::SingletonContext);
}

#[test]
fn test_first_statement_extraction_user_manager() {
    let (_dir, path) = write_fixture(USER_MANAGER);
    assert!(extract_method(
        &path,
        "old_permissions = user.permissions",
        3,
        4,
        Some("update_user_permissions")
    ));

    let output = fs::read_to_string(&path).unwrap();
    assert_parses(&output);
    assert!(output.contains(
        "  def update_permissions(user, permissions)\n    update_user_permissions\n    user.permissions = permissions\n"
    ));
    assert!(output.contains("  def update_user_permissions\n    old_permissions = user.permissions\n  end\n"));
}

#[test]
fn test_extraction_inside_control_flow() {
    let (_dir, path) = write_fixture(DATA_PROCESSOR);
    assert!(extract_method(
        &path,
        "transformed = transform_item(item)",
        8,
        8,
        Some("process_valid_item")
    ));

    let output = fs::read_to_string(&path).unwrap();
    assert_parses(&output);
    assert!(output.contains("      if item.valid?\n        process_valid_item\n        result << transformed"));
    assert!(output.ends_with(
        "  end\n\n  def process_valid_item\n    transformed = transform_item(item)\n  end\nend\n"
    ));
    assert_eq!(count_lines(&output, "def process_valid_item"), 1);
    assert_eq!(count_lines(&output, "process_valid_item"), 1);
}

#[test]
fn test_heredoc_statement_moves_with_its_body() {
    let source = "\
class A
  def run
    msg = <<~TXT
      hi
    TXT
    puts msg
  end
end
";
    let expected = "\
class A
  def run
    greeting
    puts msg
  end

  def greeting
    msg = <<~TXT
      hi
    TXT
  end
end
";

    let (_dir, path) = write_fixture(source);
    let request = ExtractRequest::new(&path, "msg = <<~TXT", 3, 4).with_method_name("greeting");

    engine(StrategyKind::Structural).run(&request, &mut NoName).unwrap();
    let output = fs::read_to_string(&path).unwrap();
    assert_eq!(output, expected);
    assert_parses(&output);
}

#[test]
fn test_private_definition_fragment_moves_to_top_level() {
    let source = "\
class A
  def run
    go
  end

  private def secret
    42
  end
end
";

    let (_dir, path) = write_fixture(source);
    let request =
        ExtractRequest::new(&path, "private def secret\n    42\n  end", 6, 2).with_method_name("hide_secret");

    engine(StrategyKind::Structural).run(&request, &mut NoName).unwrap();
    let output = fs::read_to_string(&path).unwrap();
    assert!(output.contains("\n  hide_secret\nend\n"), "{output}");
    assert!(output.ends_with("def hide_secret\n  private def secret\n    42\n  end\nend\n"), "{output}");
    assert_parses(&output);
}

#[test]
fn test_missing_fragment_leaves_file_untouched() {
    for strategy in [StrategyKind::Structural, StrategyKind::Text] {
        let (_dir, path) = write_fixture(CALCULATOR);
        let request = ExtractRequest::new(&path, "launch_rockets(now)", 4, 4).with_method_name("launch");

        let err = engine(strategy).run(&request, &mut NoName).unwrap_err();
        assert_eq!(err.stage(), FailureStage::Locate, "strategy {strategy}");
        assert_eq!(fs::read_to_string(&path).unwrap(), CALCULATOR);
    }
}

#[test]
fn test_illegal_name_fails_before_mutation() {
    let (_dir, path) = write_fixture(CALCULATOR);
    assert!(!extract_method(&path, "apply_tax(result, items)", 4, 4, Some("123bad")));
    assert_eq!(fs::read_to_string(&path).unwrap(), CALCULATOR);

    let request = ExtractRequest::new(&path, "apply_tax(result, items)", 4, 4).with_method_name("123bad");
    let err = engine(StrategyKind::Text).run(&request, &mut NoName).unwrap_err();
    assert!(matches!(err, ExtractError::IllegalMethodName { ref name } if name == "123bad"));
    assert_eq!(fs::read_to_string(&path).unwrap(), CALCULATOR);
}

#[test]
fn test_no_name_available_fails() {
    for strategy in [StrategyKind::Structural, StrategyKind::Text] {
        let (_dir, path) = write_fixture(CALCULATOR);
        let request = ExtractRequest::new(&path, "apply_tax(result, items)", 4, 4);

        let err = engine(strategy).run(&request, &mut NoName).unwrap_err();
        assert_eq!(err.stage(), FailureStage::Name);
        assert_eq!(fs::read_to_string(&path).unwrap(), CALCULATOR);
    }
}

#[test]
fn test_name_is_read_from_provider() {
    let (_dir, path) = write_fixture(CALCULATOR);
    let request = ExtractRequest::new(&path, "apply_tax(result, items)", 4, 4);
    let mut names = PromptNameProvider::new(Cursor::new("  taxed  \n"), Vec::new());

    let outcome = engine(StrategyKind::Structural).run(&request, &mut names).unwrap();
    assert_eq!(outcome.method_name.as_str(), "taxed");
    assert!(fs::read_to_string(&path).unwrap().contains("  def taxed\n"));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.rb");
    let request = ExtractRequest::new(&path, "work", 1, 0).with_method_name("helper");

    let err = engine(StrategyKind::Structural).run(&request, &mut NoName).unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound { .. }));
    assert!(!Path::new(&path).exists());
}

#[test]
fn test_fragment_outside_any_method_fails_context_stage() {
    let source = "class Config\n  DEFAULTS = load_defaults\nend\n";
    let (_dir, path) = write_fixture(source);
    let request = ExtractRequest::new(&path, "load_defaults", 2, 13).with_method_name("defaults");

    let err = engine(StrategyKind::Text).run(&request, &mut NoName).unwrap_err();
    assert_eq!(err.stage(), FailureStage::Context);
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn test_text_window_tolerates_small_hint_error() {
    let source = "\
class Report
  def build(rows)
    header = rows.first
    body = rows.drop(1)
    totals = body.map(&:sum)
    average = totals.sum / totals.size
    minimum = totals.min
    maximum = totals.max
    spread = maximum - minimum
    summary = format_summary(average, spread)
    publish(summary)
  end
end
";
    let snippet = "summary = format_summary(average, spread)";

    let (_dir, path) = write_fixture(source);
    let request = ExtractRequest::new(&path, snippet, 12, 4).with_method_name("summarize");
    assert!(engine(StrategyKind::Text).extract(&request, &mut NoName));
    assert!(fs::read_to_string(&path)
        .unwrap()
        .contains("    spread = maximum - minimum\n    summarize\n    publish(summary)\n"));

    for hint in [4, 16] {
        let (_dir, path) = write_fixture(source);
        let request = ExtractRequest::new(&path, snippet, hint, 4).with_method_name("summarize");
        let err = engine(StrategyKind::Text).run(&request, &mut NoName).unwrap_err();
        assert!(matches!(err, ExtractError::FragmentNotLocated { line, .. } if line == hint));
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }
}

#[test]
fn test_existing_placeholder_name_is_not_clobbered() {
    let source = "\
class Cache
  def extracted_method_temp
    :old
  end

  def fill
    warm_up
    store(1)
  end
end
";
    let (_dir, path) = write_fixture(source);
    assert!(extract_method(&path, "store(1)", 8, 4, Some("persist")));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\
class Cache
  def extracted_method_temp
    :old
  end

  def fill
    warm_up
    persist
  end

  def persist
    store(1)
  end
end
"
    );
}

#[test]
fn test_second_rename_pass_is_a_no_op() {
    let mut parser = RubyAdapter::new().unwrap();
    let tree = parser.parse(CALCULATOR).unwrap();

    let once = Renamer::new("apply_tax", "tax").rename_tree(&tree);
    let twice = Renamer::new("apply_tax", "tax").rename_tree(&once);

    assert!(std::sync::Arc::ptr_eq(once.root(), twice.root()));
    assert_eq!(count_references(&twice, "apply_tax"), 0);

    let printer = RubyPrinter::new();
    assert_eq!(printer.print(&once).unwrap(), printer.print(&twice).unwrap());
}

#[test]
fn test_multiline_fragment_with_text_strategy() {
    let source = "\
class Importer
  def run(rows)
    rows.each do |row|
      store(row)
    end
    finish
  end
end
";
    let (_dir, path) = write_fixture(source);
    let request = ExtractRequest::new(&path, "rows.each do |row|\n  store(row)\nend", 3, 4)
        .with_method_name("store_all");

    engine(StrategyKind::Text).run(&request, &mut NoName).unwrap();

    let output = fs::read_to_string(&path).unwrap();
    assert_eq!(
        output,
        "\
class Importer
  def run(rows)
    store_all
    finish
  end

  def store_all
    rows.each do |row|
      store(row)
    end
  end
end
"
    );
    assert_parses(&output);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any legal name yields a parseable file with one definition and one call.
    #[test]
    fn prop_structural_rewrite_round_trips(suffix in "[a-z0-9_]{0,12}") {
        let name = format!("m_{suffix}");
        let (_dir, path) = write_fixture(USER_MANAGER);

        prop_assert!(extract_method(&path, "user.permissions = permissions", 4, 4, Some(&name)));

        let output = fs::read_to_string(&path).unwrap();
        let tree = RubyAdapter::new().unwrap().parse(&output);
        prop_assert!(tree.is_ok());
        prop_assert_eq!(count_references(&tree.unwrap(), &name), 2);
        prop_assert_eq!(count_lines(&output, &format!("def {name}")), 1);
        prop_assert_eq!(count_lines(&output, &name), 1);
    }
}
