//! A tiny ordered-choice pattern matcher for driving result trees in tests.
//!
//! It records matches the way a grammar layer does: every step runs on a
//! temporary over the tree being extended and is merged on success, groups
//! open node trees, and failed repetitions are rolled back with `reset`.

use crate::arena::{ResultArena, TreeId};
use crate::entry::MatchEntry;
use crate::reparse::Grammar;
use crate::types::TypeProvider;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(&'static str),
    /// A single character accepted by the predicate
    Class(fn(char) -> bool),
    Seq(Vec<Pattern>),
    /// First alternative that matches wins
    Alt(Vec<Pattern>),
    /// Greedy repetition
    Repeat {
        pattern: Box<Pattern>,
        min: usize,
        max: Option<usize>,
    },
    /// One leaf entry spanning whatever `pattern` matched
    Capture {
        name: Option<&'static str>,
        type_name: Option<&'static str>,
        pattern: Box<Pattern>,
        second_stage: Option<Arc<dyn Grammar>>,
    },
    /// A named entry whose sub-result holds the entries of `pattern`
    Group {
        name: &'static str,
        pattern: Box<Pattern>,
    },
}

impl Pattern {
    /// Extend `tree` with a match at its current end
    pub fn match_into(&self, arena: &mut ResultArena, tree: TreeId) -> bool {
        let limit = arena.tree(tree).original_text().len();
        self.match_within(arena, tree, limit)
    }

    /// Like [`match_into`](Self::match_into), never matching past `limit`
    pub fn match_within(&self, arena: &mut ResultArena, tree: TreeId, limit: usize) -> bool {
        let position = arena.tree(tree).end_position();
        let text = arena.tree(tree).shared_text().clone();
        let rest = text.get(position..limit);

        match self {
            Pattern::Literal(literal) => {
                let matched = rest.is_some_and(|rest| rest.starts_with(*literal));
                matched
                    && arena
                        .push_entry(tree, MatchEntry::new(position + literal.len()))
                        .is_ok()
            }
            Pattern::Class(accepts) => {
                match rest.and_then(|rest| rest.chars().next()) {
                    Some(c) if accepts(c) => arena
                        .push_entry(tree, MatchEntry::new(position + c.len_utf8()))
                        .is_ok(),
                    _ => false,
                }
            }
            Pattern::Seq(patterns) => {
                let temporary = arena.new_temporary(tree);
                patterns
                    .iter()
                    .all(|pattern| pattern.match_within(arena, temporary, limit))
                    && arena.merge_with(tree, temporary).is_ok()
            }
            Pattern::Alt(patterns) => patterns.iter().any(|pattern| {
                let temporary = arena.new_temporary(tree);
                pattern.match_within(arena, temporary, limit) && arena.merge_with(tree, temporary).is_ok()
            }),
            Pattern::Repeat { pattern, min, max } => {
                let temporary = arena.new_temporary(tree);
                let mut count = 0;
                while max.map_or(true, |max| count < max) {
                    let entries = arena.tree(temporary).entry_count();
                    let before = arena.tree(temporary).end_position();
                    if !pattern.match_within(arena, temporary, limit)
                        || arena.tree(temporary).end_position() == before
                    {
                        arena.reset(temporary, entries);
                        break;
                    }
                    count += 1;
                }
                count >= *min && arena.merge_with(tree, temporary).is_ok()
            }
            Pattern::Capture {
                name,
                type_name,
                pattern,
                second_stage,
            } => {
                let temporary = arena.new_temporary(tree);
                if !pattern.match_within(arena, temporary, limit) {
                    return false;
                }
                let mut entry = MatchEntry::new(arena.tree(temporary).end_position());
                if let Some(name) = name {
                    entry = entry.with_name(*name);
                }
                if let Some(type_name) = type_name {
                    entry = entry.with_type(*type_name);
                }
                if let Some(grammar) = second_stage {
                    entry = entry.with_second_stage(grammar.clone());
                }
                arena.push_entry(tree, entry).is_ok()
            }
            Pattern::Group { name, pattern } => {
                let node = arena.new_node(tree);
                if !pattern.match_within(arena, node, limit) {
                    return false;
                }
                let entry = MatchEntry::new(arena.tree(node).end_position())
                    .with_name(*name)
                    .with_sub_result(node);
                arena.push_entry(tree, entry).is_ok()
            }
        }
    }

    /// Match against the whole of `text` from offset 0
    pub fn run(&self, text: &str) -> (ResultArena, Option<TreeId>) {
        let mut arena = ResultArena::new();
        let root = arena.new_root(text);
        let matched = self.match_into(&mut arena, root);
        (arena, matched.then_some(root))
    }
}

/// A [`Pattern`] usable as a second-stage grammar
#[derive(Debug)]
pub struct PatternGrammar(pub Pattern);

impl Grammar for PatternGrammar {
    fn parse(
        &self,
        arena: &mut ResultArena,
        text: &Arc<str>,
        start: usize,
        end: usize,
        _types: Option<&dyn TypeProvider>,
    ) -> Option<TreeId> {
        let root = arena.new_root_at(text.clone(), start);
        self.0.match_within(arena, root, end).then_some(root)
    }
}

pub fn lit(literal: &'static str) -> Pattern {
    Pattern::Literal(literal)
}

pub fn class(accepts: fn(char) -> bool) -> Pattern {
    Pattern::Class(accepts)
}

pub fn digit() -> Pattern {
    class(|c| c.is_ascii_digit())
}

pub fn alpha() -> Pattern {
    class(|c| c.is_ascii_alphabetic())
}

pub fn seq(patterns: Vec<Pattern>) -> Pattern {
    Pattern::Seq(patterns)
}

pub fn alt(patterns: Vec<Pattern>) -> Pattern {
    Pattern::Alt(patterns)
}

fn repeat(pattern: Pattern, min: usize, max: Option<usize>) -> Pattern {
    Pattern::Repeat {
        pattern: Box::new(pattern),
        min,
        max,
    }
}

pub fn star(pattern: Pattern) -> Pattern {
    repeat(pattern, 0, None)
}

pub fn plus(pattern: Pattern) -> Pattern {
    repeat(pattern, 1, None)
}

pub fn opt(pattern: Pattern) -> Pattern {
    repeat(pattern, 0, Some(1))
}

/// Zero or more spaces
pub fn ws() -> Pattern {
    star(lit(" "))
}

pub fn capture(name: &'static str, pattern: Pattern) -> Pattern {
    Pattern::Capture {
        name: Some(name),
        type_name: None,
        pattern: Box::new(pattern),
        second_stage: None,
    }
}

pub fn typed(name: &'static str, type_name: &'static str, pattern: Pattern) -> Pattern {
    Pattern::Capture {
        name: Some(name),
        type_name: Some(type_name),
        pattern: Box::new(pattern),
        second_stage: None,
    }
}

pub fn staged(name: &'static str, pattern: Pattern, grammar: Pattern) -> Pattern {
    Pattern::Capture {
        name: Some(name),
        type_name: None,
        pattern: Box::new(pattern),
        second_stage: Some(Arc::new(PatternGrammar(grammar))),
    }
}

pub fn group(name: &'static str, pattern: Pattern) -> Pattern {
    Pattern::Group {
        name,
        pattern: Box::new(pattern),
    }
}

/// `15+5*2`-style arithmetic as a `#ValidExpr` group of operands and
/// operators
pub fn expression() -> Pattern {
    let operand = || capture("#Operand", plus(digit()));
    group(
        "#ValidExpr",
        seq(vec![
            operand(),
            star(seq(vec![
                capture("#Operator", class(|c| "+-*/".contains(c))),
                operand(),
            ])),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ends(arena: &ResultArena, tree: TreeId) -> Vec<usize> {
        arena.tree(tree).entries().map(MatchEntry::end_position).collect()
    }

    #[test]
    fn test_sequences_commit_into_the_root() {
        let (arena, root) = seq(vec![lit("ab"), digit(), lit("c")]).run("ab7c");
        let root = root.unwrap();
        assert_eq!(ends(&arena, root), vec![2, 3, 4]);
    }

    #[test]
    fn test_failed_alternatives_leave_no_trace() {
        let pattern = alt(vec![seq(vec![lit("a"), lit("x")]), seq(vec![lit("a"), lit("b")])]);
        let (arena, root) = pattern.run("ab");
        assert_eq!(ends(&arena, root.unwrap()), vec![1, 2]);

        assert!(pattern.run("ac").1.is_none());
    }

    #[test]
    fn test_repeat_rolls_back_partial_steps() {
        let pattern = seq(vec![star(seq(vec![lit("a"), lit("b")])), lit("a")]);
        let (arena, root) = pattern.run("ababa");
        assert_eq!(ends(&arena, root.unwrap()), vec![1, 2, 3, 4, 5]);

        assert!(plus(lit("x")).run("y").1.is_none());
        let (arena, root) = opt(lit("x")).run("y");
        assert_eq!(arena.tree(root.unwrap()).entry_count(), 0);
    }

    #[test]
    fn test_groups_and_captures() {
        let (arena, root) = expression().run("1+23");
        let tree = arena.tree(root.unwrap());
        assert_eq!(tree.entry_count(), 1);
        assert_eq!(tree.text_of_name("#ValidExpr"), Some("1+23"));

        let expr = tree.sub_result_of(0).unwrap();
        assert_eq!(expr.parent().map(|p| p.id()), Some(tree.id()));
        assert_eq!(expr.texts_of("#Operand"), vec!["1", "23"]);
        assert_eq!(expr.text_of_name("#Operator"), Some("+"));
    }
}
