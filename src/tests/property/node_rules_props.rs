//! Property-based tests for node derivation
//!
//! Tests invariants:
//! - Standard head/tail are the first/last character, reverse swaps them
//! - Middle tail is defined exactly for odd lengths above two
//! - Long head/tail are undefined below three characters and at most two wide
//! - Every derived tail fits the width of its category

use proptest::prelude::*;

use crate::core::node::{self, GameMode, NodeCategory};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Hangul words of 1 to 12 syllables
fn arb_word() -> impl Strategy<Value = String> {
    "[가-힣]{1,12}"
}

/// Mixed-script words, including multi-byte characters outside Hangul
fn arb_mixed_word() -> impl Strategy<Value = String> {
    "[a-z가-힣ぁ-ん0-9]{1,12}"
}

fn chars(word: &str) -> Vec<char> {
    word.chars().collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_standard_nodes_are_word_ends(word in arb_mixed_word()) {
        let c = chars(&word);
        let first = c[0].to_string();
        let last = c[c.len() - 1].to_string();

        prop_assert_eq!(node::standard_head(&word).unwrap(), first.clone());
        prop_assert_eq!(node::standard_tail(&word).unwrap(), last.clone());
        prop_assert_eq!(node::reverse_head(&word).unwrap(), last);
        prop_assert_eq!(node::reverse_tail(&word).unwrap(), first);
    }

    #[test]
    fn prop_middle_tail_only_for_odd_lengths(word in arb_word()) {
        let c = chars(&word);
        let tail = node::middle_tail(&word).unwrap();
        if c.len() > 2 && c.len() % 2 == 1 {
            prop_assert_eq!(tail, Some(c[(c.len() - 1) / 2].to_string()));
        } else {
            prop_assert_eq!(tail, None);
        }
    }

    #[test]
    fn prop_long_nodes_width(word in arb_word()) {
        let len = word.chars().count();
        let head = node::long_head(&word).unwrap();
        let tail = node::long_tail(&word).unwrap();

        if len < 3 {
            prop_assert!(head.is_none());
            prop_assert!(tail.is_none());
        } else {
            let expected = if len == 3 { 1 } else { 2 };
            prop_assert_eq!(head.map(|h| h.chars().count()), Some(expected));
            prop_assert_eq!(tail.map(|t| t.chars().count()), Some(expected));
        }
    }

    #[test]
    fn prop_long_head_is_word_prefix(word in arb_word()) {
        if let Some(head) = node::long_head(&word).unwrap() {
            prop_assert!(word.starts_with(&head));
        }
    }

    #[test]
    fn prop_tails_fit_category_width(word in arb_word()) {
        for category in NodeCategory::ALL {
            if let Some(tail) = category.mode().tail(&word).unwrap() {
                prop_assert!(category.validate(&tail).is_ok(), "{} tail {:?} too wide", category, tail);
            }
        }
    }

    #[test]
    fn prop_index_column_depends_on_node_width(node in "[가-힣]{1,2}") {
        let column = GameMode::Long.index_column(&node);
        let width = node.chars().count();
        prop_assert_eq!(column == crate::core::node::IndexColumn::Kkutu, width == 2);
    }
}

#[test]
fn test_blank_input_rejected_by_every_mode() {
    for mode in GameMode::ALL {
        assert!(mode.tail("").is_err(), "{mode} accepted empty input");
        assert!(mode.head("   ").is_err(), "{mode} accepted blank input");
    }
}
