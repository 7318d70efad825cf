//! End-to-end scenarios: trees recorded by the test matcher, then collapsed,
//! re-parsed, flattened and queried.

use crate::diagnostic::{CompilationContext, DiagnosticCollector, DiagnosticLevel};
use crate::error::{ResultError, ResultResult};
use crate::testing::*;
use crate::tree::TreeRef;
use crate::types::{ParserType, TypeProvider, TypeRegistry};
use regparser_location::END_OF_LINE_MARKER;
use serde_json::Value;
use std::sync::Arc;

/// `Name[digits]` with an optional ` = value` before the `;`
fn assignment() -> Pattern {
    seq(vec![
        capture("#Name", plus(alpha())),
        lit("["),
        plus(capture("#Index", digit())),
        lit("]"),
        opt(seq(vec![
            ws(),
            lit("="),
            ws(),
            capture("#Value", plus(digit())),
        ])),
        lit(";"),
    ])
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn not_semicolon() -> Pattern {
    class(|c| c != ';')
}

#[test]
fn test_basic_capture() {
    let (arena, root) = assignment().run("Var[55] = 70;");
    let tree = arena.tree(root.unwrap());

    let names: Vec<_> = tree.names().into_iter().collect();
    assert_eq!(names, vec!["#Index", "#Name", "#Value"]);
    assert_eq!(tree.text_of_name("#Name"), Some("Var"));
    assert_eq!(tree.text_of_name("#Index"), Some("5"));
    assert_eq!(tree.text_of_name("#Value"), Some("70"));
    assert_eq!(tree.all_texts_of("#Index"), vec!["55"]);

    let (arena, root) = assignment().run("Var[55];");
    let tree = arena.tree(root.unwrap());
    assert_eq!(tree.text_of_name("#Value"), None);
    assert_eq!(tree.text_of_name("#Name"), Some("Var"));
}

#[test]
fn test_basic_collapse_merges_punctuation() {
    let (mut arena, root) = assignment().run("Var[55] = 70;");
    let root = root.unwrap();
    assert_eq!(arena.tree(root).entry_count(), 10);

    assert!(arena.collapse(root, None));
    let tree = arena.tree(root);
    assert_eq!(tree.entry_count(), 7);
    assert_eq!(tree.text_of(4), Some("] = "));
    assert_eq!(tree.text_of_name("#Value"), Some("70"));
    for index in 1..tree.entry_count() {
        assert_eq!(tree.start_position_of(index), tree.end_position_of(index - 1));
    }
}

#[test]
fn test_second_stage_reparse_then_flatten() {
    init_tracing();
    let declaration = seq(vec![
        lit("var"),
        lit(" "),
        capture("#Var", plus(alpha())),
        ws(),
        lit("="),
        ws(),
        capture("$InvalidExpr", plus(not_semicolon())),
        lit(";"),
    ]);
    let (mut arena, root) = declaration.run("var I = 15+5*2+5a;");
    let root = root.unwrap();
    arena.collapse(root, None);

    let tree = arena.tree(root);
    assert_eq!(tree.entry_count(), 5);
    assert_eq!(tree.name_of(3), Some("$InvalidExpr"));
    assert_eq!(tree.text_of(3), Some("15+5*2+5a"));

    let grammar = PatternGrammar(expression());
    assert!(arena.reparse_entry(root, 3, &grammar, None));

    let tree = arena.tree(root);
    assert_eq!(tree.entry_count(), 6);
    assert_eq!(tree.name_of(3), Some("#ValidExpr"));
    assert_eq!(tree.text_of(3), Some("15+5*2+5"));
    assert_eq!(tree.name_of(4), Some("$InvalidExpr"));
    assert_eq!(tree.text_of(4), Some("a"));
    assert_eq!(tree.text_of_path(&[3, 2]).unwrap(), "5");

    let expr = tree.sub_result_of(3).unwrap();
    assert_eq!(expr.parent().map(|p| p.id()), Some(root));
    assert_eq!(expr.index_in_parent(), Some(3));
    assert_eq!(expr.entry_count(), 7);

    assert!(arena.flatten(root, 3));
    let tree = arena.tree(root);
    assert_eq!(tree.entry_count(), 12);
    let inlined: String = (3..10).filter_map(|index| tree.text_of(index)).collect();
    assert_eq!(inlined, "15+5*2+5");
    assert_eq!(tree.name_of(3), Some("#Operand"));
    assert_eq!(tree.name_of(4), Some("#Operator"));
    assert_eq!(tree.text_of(10), Some("a"));
}

#[test]
fn test_reparse_rejects_groups_and_misses() {
    let (mut arena, root) = seq(vec![expression(), capture("#Rest", plus(alpha()))]).run("1+2xy");
    let root = root.unwrap();
    let grammar = PatternGrammar(expression());

    // entry 0 already carries a sub-result
    assert!(!arena.reparse_entry(root, 0, &grammar, None));
    // "xy" is not an expression
    assert!(!arena.reparse_entry(root, 1, &grammar, None));
    assert!(!arena.reparse_entry(root, 9, &grammar, None));
    assert_eq!(arena.tree(root).entry_count(), 2);
}

#[test]
fn test_collapse_runs_second_stage_grammars() {
    let statement = seq(vec![
        capture("#Name", alpha()),
        lit("="),
        staged("$Raw", plus(not_semicolon()), expression()),
        lit(";"),
    ]);
    let (mut arena, root) = statement.run("x=1+2;");
    let root = root.unwrap();

    assert!(arena.collapse(root, None));
    let tree = arena.tree(root);
    assert_eq!(tree.entry_count(), 4);
    assert_eq!(tree.name_of(2), Some("#ValidExpr"));
    assert_eq!(tree.text_of_path(&[2, 1]).unwrap(), "+");
    assert_eq!(
        tree.sub_result_of(2).unwrap().texts_of("#Operand"),
        vec!["1", "2"]
    );
    assert!(tree.entry_at(2).unwrap().second_stage().is_none());

    assert!(!arena.collapse(root, None));
}

/// `{ 5, 7, 454, 5 }` with one `#Value[]` entry per digit
fn collective_list() -> Pattern {
    let item = || plus(capture("#Value[]", digit()));
    seq(vec![
        lit("{"),
        ws(),
        item(),
        star(seq(vec![ws(), lit(","), ws(), item()])),
        ws(),
        lit("}"),
    ])
}

#[test]
fn test_repeated_collective_capture() {
    let (mut arena, root) = collective_list().run("{ 5, 7, 454, 5 }");
    let root = root.unwrap();

    let tree = arena.tree(root);
    assert_eq!(
        tree.all_indexes_of("#Value"),
        vec![vec![2], vec![5], vec![8, 9, 10], vec![13]]
    );
    assert_eq!(tree.all_texts_of("#Value"), vec!["5", "7", "454", "5"]);

    arena.collapse(root, None);
    let tree = arena.tree(root);
    assert_eq!(tree.texts_of("#Value"), vec!["5", "7", "454", "5"]);
    assert_eq!(
        tree.all_indexes_of("#Value"),
        vec![vec![1], vec![3], vec![5], vec![7]]
    );
    assert_eq!(tree.text_of(0), Some("{ "));
    assert_eq!(tree.text_of(8), Some(" }"));
}

#[test]
fn test_collapse_is_idempotent_on_recorded_trees() {
    let inputs = [
        (assignment(), "Var[55] = 70;"),
        (collective_list(), "{ 5, 7, 454, 5 }"),
        (seq(vec![expression(), lit(";")]), "1+2*3;"),
    ];
    for (pattern, text) in inputs {
        let (mut arena, root) = pattern.run(text);
        let root = root.unwrap();
        arena.collapse(root, None);
        let once = arena.tree(root).dump();
        assert!(!arena.collapse(root, None));
        assert_eq!(arena.tree(root).dump(), once);
    }
}

#[test]
fn test_flatten_markers_remove_quantifier_groups() {
    let list = seq(vec![
        group("#Items*", plus(capture("#Item", alpha()))),
        lit(":"),
        group("#Tail+", capture("#Last", alpha())),
    ]);
    let (mut arena, root) = list.run("abc:z");
    let root = root.unwrap();
    assert_eq!(arena.tree(root).depth(), 2);

    arena.collapse(root, None);
    let tree = arena.tree(root);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.texts_of("#Item"), vec!["a", "b", "c"]);
    assert_eq!(tree.text_of_name("#Last"), Some("z"));
    assert_eq!(tree.index_of("#Items"), None);
}

#[test]
fn test_speculative_duplicate_keeps_the_snapshot() {
    let mut arena = crate::arena::ResultArena::new();
    let root = arena.new_root("ab1cd");
    let mut tip = root;
    for pattern in [capture("#A", alpha()), capture("#B", alpha()), digit()] {
        tip = arena.new_temporary(tip);
        assert!(pattern.match_into(&mut arena, tip));
    }

    let snapshot = arena.duplicate(tip);
    assert!(capture("#C", alpha()).match_into(&mut arena, snapshot));
    assert_eq!(arena.tree(snapshot).entry_count(), 4);
    assert_eq!(arena.tree(snapshot).text_of_name("#C"), Some("c"));

    assert_eq!(arena.tree(tip).entry_count(), 3);
    assert_eq!(arena.tree(tip).text_of_name("#C"), None);

    assert_eq!(arena.tree(root).entry_count(), 0);
}

/// Parses the entry text as a base-10 integer
#[derive(Debug)]
struct IntType;

impl ParserType for IntType {
    fn name(&self) -> &str {
        "$int"
    }

    fn compile(
        &self,
        tree: TreeRef<'_>,
        index: usize,
        _parameter: Option<&str>,
        _context: &mut dyn CompilationContext,
        _types: &dyn TypeProvider,
    ) -> ResultResult<Value> {
        let text = tree.text_of(index).unwrap_or_default();
        text.parse::<i64>()
            .map(Value::from)
            .map_err(|err| ResultError::compile(self.name(), err.to_string()))
    }
}

#[test]
fn test_typed_values_from_a_recorded_list() {
    let item = || typed("#Value", "$int", plus(digit()));
    let list = seq(vec![
        lit("{"),
        ws(),
        item(),
        star(seq(vec![lit(","), ws(), item()])),
        ws(),
        lit("}"),
    ]);
    let (mut arena, root) = list.run("{ 5, 7, 454, 5 }");
    let root = root.unwrap();
    let types = TypeRegistry::new().with_type(Arc::new(IntType));
    arena.collapse(root, Some(&types));

    let mut context = DiagnosticCollector::new();
    let values = arena
        .tree(root)
        .values_of("#Value", &types, &mut context)
        .unwrap();
    assert_eq!(
        values,
        vec![Value::from(5), Value::from(7), Value::from(454), Value::from(5)]
    );
}

#[test]
fn test_missing_semicolon_is_reported() {
    init_tracing();
    let statement = seq(vec![
        capture("#Name", alpha()),
        ws(),
        lit("="),
        ws(),
        capture("#Value", plus(digit())),
        alt(vec![lit(";"), capture("$ERROR_MissingSemicolon", lit(""))]),
    ]);
    let (mut arena, root) = statement.run("a = 1");
    let root = root.unwrap();
    arena.collapse(root, None);

    let tree = arena.tree(root);
    assert!(!tree.has_no_error(None).unwrap());

    let mut context = DiagnosticCollector::new();
    assert!(!tree.ensure_no_error(None, &mut context).unwrap());
    assert_eq!(context.count(DiagnosticLevel::Error), 1);

    let diagnostic = &context.diagnostics[0];
    assert_eq!(diagnostic.message, "MissingSemicolon");
    assert_eq!(diagnostic.position, 5);
    assert_eq!(diagnostic.text, "");
    assert!(diagnostic.snippet.contains(END_OF_LINE_MARKER));

    let (arena, root) = statement.run("a = 1;");
    assert!(arena.tree(root.unwrap()).has_no_error(None).unwrap());
}
