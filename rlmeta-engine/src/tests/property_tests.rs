use crate::cursor::Cursor;
use crate::grammar::{Grammar, GrammarBuilder};
use crate::host::CollectingHost;
use crate::runtime::Runtime;
use crate::value::Value;
use proptest::prelude::*;

fn values(items: &[i64]) -> Vec<Value> {
    items.iter().map(|n| Value::from(*n)).collect()
}

// main = (any any -1)?
fn optional_triple() -> Grammar {
    let mut g = GrammarBuilder::new("Optional");
    let a = g.any();
    let b = g.any();
    let marker = g.eq(-1);
    let triple = g.seq([a, b, marker]);
    let body = g.opt(triple);
    g.define("main", body);
    g.build("main").unwrap()
}

proptest! {
    #[test]
    fn star_any_returns_the_input(items in prop::collection::vec(0i64..100, 0..32)) {
        let mut g = GrammarBuilder::new("All");
        let any = g.any();
        let body = g.star(any);
        g.define("main", body);
        let grammar = g.build("main").unwrap();

        let action = grammar.match_main(values(&items)).unwrap();
        let result = action.eval(&Runtime::new(), &mut CollectingHost::new()).unwrap();
        prop_assert_eq!(result, Value::from(values(&items)));
    }

    #[test]
    fn failed_alternatives_leave_position_unchanged(items in prop::collection::vec(0i64..100, 0..16)) {
        let grammar = optional_triple();
        let mut cursor = Cursor::new(values(&items));
        let body = grammar.rule_body(grammar.main());
        prop_assert!(grammar.run(body, &mut cursor).is_ok());
        prop_assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn failures_stay_within_the_input(items in prop::collection::vec(0i64..4, 0..16)) {
        // main = 0 1 2 3
        let mut g = GrammarBuilder::new("Exact");
        let parts: Vec<_> = (0..4).map(|n| g.eq(n)).collect();
        let body = g.seq(parts);
        g.define("main", body);
        let grammar = g.build("main").unwrap();

        if let Err(failure) = grammar.match_main(values(&items)) {
            prop_assert!(failure.position <= items.len());
            prop_assert!(failure.position < 4);
        }
    }

    #[test]
    fn not_never_moves_the_cursor(
        items in prop::collection::vec(0i64..3, 0..12),
        start in 0usize..12,
    ) {
        // main = ~(0 1)
        let mut g = GrammarBuilder::new("Lookahead");
        let zero = g.eq(0);
        let one = g.eq(1);
        let pair = g.seq([zero, one]);
        let body = g.not(pair);
        g.define("main", body);
        let grammar = g.build("main").unwrap();

        let start = start.min(items.len());
        let mut cursor = Cursor::new(values(&items));
        cursor.restore(start);
        let _ = grammar.run(grammar.rule_body(grammar.main()), &mut cursor);
        prop_assert_eq!(cursor.position(), start);
    }

    #[test]
    fn failed_alternative_never_leaks_consumption(items in prop::collection::vec(0i64..3, 0..12)) {
        // a = 0 0 2, b = 0*
        let mut g = GrammarBuilder::new("Leak");
        let parts: Vec<_> = [0, 0, 2].into_iter().map(|n| g.eq(n)).collect();
        let a = g.seq(parts);
        let zero = g.eq(0);
        let b = g.star(zero);
        let body = g.choice([a, b]);
        g.define("main", body);
        let grammar = g.build("main").unwrap();

        let mut with_choice = Cursor::new(values(&items));
        let choice = grammar.run(grammar.rule_body(grammar.main()), &mut with_choice);
        let mut alone = Cursor::new(values(&items));
        let b_only = grammar.run(b, &mut alone);

        if items.starts_with(&[0, 0, 2]) {
            prop_assert_eq!(with_choice.position(), 3);
        } else {
            prop_assert!(choice.is_ok() && b_only.is_ok());
            prop_assert_eq!(with_choice.position(), alone.position());
        }
    }
}
