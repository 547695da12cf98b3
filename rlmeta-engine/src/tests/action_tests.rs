use crate::action::{Action, Expr};
use crate::component::Component;
use crate::error::EvalError;
use crate::grammar::GrammarBuilder;
use crate::host::CollectingHost;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::Value;
use std::sync::Arc;

fn eval_expr(expr: Expr) -> Result<Value, EvalError> {
    eval_with(expr, &Runtime::new(), &mut CollectingHost::new())
}

fn eval_with(expr: Expr, runtime: &Runtime, host: &mut CollectingHost) -> Result<Value, EvalError> {
    Action::compute(Scope::new(), Arc::new(expr)).eval(runtime, host)
}

#[test]
fn test_let_binds_for_body_only() {
    let expr = Expr::list([
        Expr::let_in("x", Expr::lit(1), Expr::lookup("x")).item(),
        Expr::let_in(
            "x",
            Expr::lit(2),
            Expr::let_in("x", Expr::lit(3), Expr::lookup("x")),
        )
        .item(),
    ]);
    assert_eq!(
        eval_expr(expr).unwrap(),
        Value::seq([Value::from(1), Value::from(3)])
    );
    assert!(matches!(
        eval_expr(Expr::lookup("x")),
        Err(EvalError::Unbound(_))
    ));
}

#[test]
fn test_list_splices_by_depth() {
    let nested = Value::seq([
        Value::seq([Value::from(1), Value::from(2)]),
        Value::seq([Value::from(3)]),
    ]);
    let expr = Expr::list([
        Expr::lit("head").item(),
        Expr::lit(nested.clone()).splice(2),
        Expr::lit(nested).splice(1),
    ]);
    assert_eq!(
        eval_expr(expr).unwrap().repr(),
        r#"["head", 1, 2, 3, [1, 2], [3]]"#
    );
}

#[test]
fn test_splicing_a_scalar_is_a_type_error() {
    let expr = Expr::list([Expr::lit(1).splice(1)]);
    assert!(matches!(eval_expr(expr), Err(EvalError::Type { .. })));
}

#[test]
fn test_calling_a_non_function_fails() {
    let expr = Expr::Call {
        callee: Box::new(Expr::lit(3)),
        args: Vec::new(),
    };
    assert!(matches!(eval_expr(expr), Err(EvalError::NotCallable(_))));
}

#[test]
fn test_counter_yields_successive_integers() {
    let expr = Expr::let_in(
        "next",
        Expr::call("Counter", []),
        Expr::list([
            Expr::call("next", []).item(),
            Expr::call("next", []).item(),
            Expr::call("next", []).item(),
        ]),
    );
    assert_eq!(eval_expr(expr).unwrap().repr(), "[0, 1, 2]");
}

#[test]
fn test_effects_reach_the_host() {
    let expr = Expr::then(
        Expr::call("put", [Expr::lit("msg")]),
        Expr::then(Expr::call("write", [Expr::lit("out")]), Expr::call("exit", [])),
    );
    let mut host = CollectingHost::new();
    eval_with(expr, &Runtime::new(), &mut host).unwrap();
    assert_eq!(host.messages, vec![Value::str("msg")]);
    assert_eq!(host.output, "out");
    assert!(host.exited);
    assert!(!host.killed);
}

#[test]
fn test_runtime_resolves_component_state() {
    let mut g = GrammarBuilder::new("Holder");
    let any = g.any();
    let value = g.action(Expr::call("increment", [Expr::lookup("count")]));
    let body = g.seq([any, value]);
    g.define("main", body);
    let grammar = Arc::new(g.build("main").unwrap());

    let component = Arc::new(Component::new(grammar).with_state("count", 41));
    let runtime = Runtime::new().for_component(component.clone());

    let action = component.accept(&Value::seq([Value::from(0)])).unwrap();
    let result = action.eval(&runtime, &mut CollectingHost::new()).unwrap();
    assert_eq!(result, Value::from(42));
}

#[test]
fn test_matched_bindings_shadow_runtime_names() {
    let mut g = GrammarBuilder::new("Shadow");
    let any = g.any();
    let len = g.bind("len", any);
    let out = g.action(Expr::lookup("len"));
    let body = g.seq([len, out]);
    g.define("main", body);
    let grammar = g.build("main").unwrap();

    let runtime = Runtime::new().with_global("len", "global");
    let action = grammar.match_main(vec![Value::str("matched")]).unwrap();
    let result = action.eval(&runtime, &mut CollectingHost::new()).unwrap();
    assert_eq!(result, Value::str("matched"));
}

#[test]
fn test_star_evaluates_each_repetition_in_order() {
    // main = (any:x -> put(x))*
    let mut g = GrammarBuilder::new("Each");
    let any = g.any();
    let x = g.bind("x", any);
    let put = g.action(Expr::call("put", [Expr::lookup("x")]));
    let item = g.seq([x, put]);
    let scoped = g.scoped(item);
    let body = g.star(scoped);
    g.define("main", body);
    let grammar = g.build("main").unwrap();

    let action = grammar
        .match_main(vec![Value::from(1), Value::from(2)])
        .unwrap();
    let mut host = CollectingHost::new();
    let result = action.eval(&Runtime::new(), &mut host).unwrap();
    assert_eq!(host.messages, vec![Value::from(1), Value::from(2)]);
    assert_eq!(result, Value::seq([Value::Nil, Value::Nil]));
}
