//! End-to-end summaries of small programs
//!
//! Each test builds a program, asks a `LinkComputer` for a summary and checks
//! the rendered links. Rendering is relative: fields of `this` have no prefix,
//! parameters render as `index:name`.

mod common;

use common::*;
use linkgraph_ir::errors::Phase;
use linkgraph_ir::features::linkage::SummaryCodec;
use linkgraph_ir::shared::models::{
    Expression, Index, MethodBuilder, MethodRef, ParameterizedType, Statement, TypeInfo, TypeName,
    Variable,
};
use linkgraph_ir::LinkNature;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ============================================================================
// Fields and elements
// ============================================================================

#[test]
fn test_array_element_getter() {
    let (mut builder, _lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let info = info.field("ts", t.clone().with_arrays(1));
    let ts = info.field_variable("ts").unwrap();

    let get = MethodBuilder::new(&info.name, "get")
        .parameter("i", ParameterizedType::int())
        .returns(t);
    let i = get.parameter_variable(0);
    let get = get
        .body(body(vec![ret(var(&Variable::element(ts, Index::Variable(i))))]))
        .build();
    let id = get.id.clone();
    builder.add_type(info).add_method(get);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_eq!(return_links(&summary), "←ts[0:i],∈ts");
    assert!(!summary.is_modifying());
}

#[test]
fn test_identity_links_return_to_parameter() {
    let (mut builder, _lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "id")
        .parameter("t", t.clone())
        .returns(t);
    let p = m.parameter_variable(0);
    let m = m.body(body(vec![ret(var(&p))])).build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    assert_eq!(available(&computer, &id).to_string(), "[-] --> ←0:t");
}

#[test]
fn test_local_copy_of_parameter_is_identical() {
    let (mut builder, _lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "pass")
        .parameter("t", t.clone())
        .returns(t.clone());
    let p = m.parameter_variable(0);
    let local = Variable::local("u", t);
    let m = m
        .body(body(vec![declare(&local, var(&p)), ret(var(&local))]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let local_links = computer.links_for(&id, "0", &local).unwrap().to_string();
    assert!(local_links.split(',').any(|l| l == "≡0:t"), "got {local_links}");

    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["←0:t"]);
    // the local itself never leaves the method
    assert!(!return_links(&summary).split(',').any(|l| l.ends_with('u')));
}

#[test]
fn test_branches_merge_return_links() {
    let (mut builder, _lib) = program_with_library();
    let name = TypeName::new("a.C");
    let c = ParameterizedType::class(&name);
    let info = TypeInfo::new("a.C").field("a", c.clone()).field("b", c.clone());
    let a = info.field_variable("a").unwrap();
    let b = info.field_variable("b").unwrap();

    let with_else = MethodBuilder::new(&name, "pick")
        .parameter("flag", ParameterizedType::boolean())
        .returns(c.clone());
    let flag = with_else.parameter_variable(0);
    let with_else = with_else
        .body(body(vec![Statement::If {
            condition: var(&flag),
            then_block: body(vec![ret(var(&a))]),
            else_block: Some(body(vec![ret(var(&b))])),
        }]))
        .build();

    let fall_through = MethodBuilder::new(&name, "pickOr")
        .parameter("flag", ParameterizedType::boolean())
        .returns(c);
    let flag = fall_through.parameter_variable(0);
    let fall_through = fall_through
        .body(body(vec![
            Statement::If {
                condition: var(&flag),
                then_block: body(vec![ret(var(&a))]),
                else_block: None,
            },
            ret(var(&b)),
        ]))
        .build();

    let ids = [with_else.id.clone(), fall_through.id.clone()];
    builder
        .add_type(info)
        .add_method(with_else)
        .add_method(fall_through);

    let computer = computer(builder);
    for id in &ids {
        let summary = available(&computer, id);
        assert_return_contains(&summary, &["←a", "←b"]);
    }
}

#[test]
fn test_for_each_element_reaches_return() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C");
    let m = MethodBuilder::new(&info.name, "first")
        .parameter("xs", lib.item_type().with_arrays(1))
        .returns(lib.item_type());
    let xs = m.parameter_variable(0);
    let x = Variable::local("x", lib.item_type());
    let m = m
        .body(body(vec![
            Statement::ForEach {
                variable: x.clone(),
                iterable: var(&xs),
                body: body(vec![ret(var(&x))]),
            },
            ret(Expression::null()),
        ]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["∈0:xs"]);
    // the loop variable is local to the body
    assert!(!return_links(&summary).contains("←x"));

    let loop_links = computer.links_for(&id, "0", &x).unwrap().to_string();
    assert!(loop_links.split(',').any(|l| l == "∈0:xs"), "got {loop_links}");
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_copy_constructor_shares_elements() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "copy")
        .parameter("in", lib.list_of(t.clone()))
        .returns(lib.list_of(t.clone()));
    let input = m.parameter_variable(0);
    let m = m
        .body(body(vec![ret(Expression::new_object(
            lib.array_list_of(t),
            Some(&lib.array_list_copy),
            vec![var(&input)],
        ))]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["§ts⊆0:in.§ts"]);
    // the copy is a new object
    assert!(!return_links(&summary).contains("←0:in"));
}

#[test]
fn test_dependent_copy_constructor_shares_mutation() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "wrap")
        .parameter("in", lib.list_of(t.clone()))
        .returns(lib.list_of(t.clone()));
    let input = m.parameter_variable(0);
    let m = m
        .body(body(vec![ret(Expression::new_object(
            lib.linked_list_of(t),
            Some(&lib.linked_list_copy),
            vec![var(&input)],
        ))]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["§ts⊆0:in.§ts", "§m≡0:in.§m"]);
    assert!(!return_links(&summary).contains("←0:in"));
}

#[test]
fn test_dependent_view_shares_elements() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "view")
        .parameter("in", lib.list_of(t.clone()))
        .returns(lib.list_of(t));
    let input = m.parameter_variable(0);
    let m = m
        .body(body(vec![ret(Expression::call(
            &lib.list_view,
            Some(var(&input)),
            vec![],
        ))]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["§ts~0:in.§ts", "§m≡0:in.§m"]);
    assert!(!summary.is_modifying());
}

#[test]
fn test_varargs_arguments_are_elements() {
    let (mut builder, lib) = program_with_library();
    let util = TypeInfo::new("a.Util");
    let first = MethodBuilder::new(&util.name, "first")
        .varargs("xs", lib.item_type().with_arrays(1))
        .returns(lib.item_type())
        .static_method();
    let xs = first.parameter_variable(0);
    let first = first
        .body(body(vec![ret(var(&Variable::element(xs, Index::Constant(0))))]))
        .build();
    let first_id = first.id.clone();

    let caller = TypeInfo::new("a.C");
    let pick = MethodBuilder::new(&caller.name, "pick")
        .parameter("a", lib.item_type())
        .parameter("b", lib.item_type())
        .returns(lib.item_type());
    let (a, b) = (pick.parameter_variable(0), pick.parameter_variable(1));
    let pick = pick
        .body(body(vec![ret(Expression::call(
            &first_id,
            None,
            vec![var(&a), var(&b)],
        ))]))
        .build();
    let id = pick.id.clone();
    builder
        .add_type(util)
        .add_type(caller)
        .add_method(first)
        .add_method(pick);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["←0:a", "←1:b"]);
}

#[test]
fn test_modifying_call_marks_parameter() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C");
    let put = MethodBuilder::new(&info.name, "put")
        .parameter("list", lib.list_of(lib.item_type()))
        .parameter("x", lib.item_type());
    let (list, x) = (put.parameter_variable(0), put.parameter_variable(1));
    let put = put
        .body(body(vec![expr(Expression::call(
            &lib.list_add,
            Some(var(&list)),
            vec![var(&x)],
        ))]))
        .build();
    let id = put.id.clone();
    builder.add_type(info).add_method(put);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert!(summary.is_modifying());
    assert!(summary.modified().contains(&list));
    assert_parameter_contains(&summary, 1, "∈0:list.§$s");
}

#[test]
fn test_supplier_lambda_returns_captured_value() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C");
    let run = MethodBuilder::new(&info.name, "run")
        .parameter("y", lib.item_type())
        .returns(lib.item_type());
    let y = run.parameter_variable(0);

    let lambda = MethodBuilder::new(&info.name, "lambda$0")
        .returns(lib.item_type())
        .lambda()
        .body(body(vec![ret(var(&y))]))
        .build();
    let s = Variable::local("s", lib.supplier_of(lib.item_type()));
    let run = run
        .body(body(vec![
            declare(&s, Expression::lambda(&lambda.id, lib.supplier_of(lib.item_type()))),
            ret(Expression::call(&lib.supplier_get, Some(var(&s)), vec![])),
        ]))
        .build();
    let id = run.id.clone();
    builder.add_type(info).add_method(lambda).add_method(run);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    assert_return_contains(&summary, &["←0:y"]);
}

// ============================================================================
// Recursion, failures, export
// ============================================================================

fn mutually_recursive() -> (linkgraph_ir::ProgramBuilder, MethodRef, MethodRef) {
    let (mut builder, _lib) = program_with_library();
    let name = TypeName::new("a.C");
    let c = ParameterizedType::class(&name);
    let a = MethodBuilder::new(&name, "a")
        .parameter("x", c.clone())
        .returns(c.clone())
        .static_method();
    let b = MethodBuilder::new(&name, "b")
        .parameter("x", c.clone())
        .returns(c)
        .static_method();
    let (a_id, b_id) = (a.id(), b.id());
    let (ax, bx) = (a.parameter_variable(0), b.parameter_variable(0));
    let a = a
        .body(body(vec![ret(Expression::call(&b_id, None, vec![var(&ax)]))]))
        .build();
    let b = b
        .body(body(vec![ret(Expression::call(&a_id, None, vec![var(&bx)]))]))
        .build();
    builder.add_type(TypeInfo::new("a.C")).add_method(a).add_method(b);
    (builder, a_id, b_id)
}

#[test]
fn test_mutual_recursion_is_cut_off() {
    let (builder, a, b) = mutually_recursive();
    let computer = computer(builder);

    let first = available(&computer, &a);
    assert!(computer.stats().recursion_cutoffs >= 1);
    let again = available(&computer, &a);
    assert!(Arc::ptr_eq(&first, &again));
    available(&computer, &b);
}

#[test]
fn test_mutual_recursion_from_several_threads() {
    let (builder, a, b) = mutually_recursive();
    let computer = Arc::new(computer(builder));

    let handles: Vec<_> = [a.clone(), b.clone(), a, b]
        .into_iter()
        .map(|id| {
            let computer = Arc::clone(&computer);
            std::thread::spawn(move || computer.summary(&id).unwrap().is_available())
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

#[test]
fn test_unknown_method_reference_is_unavailable() {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C");
    let m = MethodBuilder::new(&info.name, "broken")
        .body(body(vec![expr(Expression::method_reference(
            &MethodRef::new("a.C.missing()"),
            None,
            lib.supplier_of(lib.item_type()),
        ))]))
        .build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    assert_unavailable(&computer, &id, Phase::Expression);
    assert!(computer.failure(&id).is_some());
    assert_eq!(computer.stats().failures, 1);
}

#[test]
fn test_summary_exports_as_json() {
    let (mut builder, _lib) = program_with_library();
    let info = TypeInfo::new("a.C").type_parameter("T");
    let t = ParameterizedType::type_parameter(&info.tp("T").unwrap());
    let m = MethodBuilder::new(&info.name, "id")
        .parameter("t", t.clone())
        .returns(t);
    let p = m.parameter_variable(0);
    let m = m.body(body(vec![ret(var(&p))])).build();
    let id = m.id.clone();
    builder.add_type(info).add_method(m);

    let computer = computer(builder);
    let summary = available(&computer, &id);
    let json = SummaryCodec::to_json(&id, &summary).unwrap();
    let record = SummaryCodec::from_json(&json).unwrap();

    assert_eq!(record.method, id.as_str());
    assert_eq!(record.parameters.len(), 1);
    let rv = record.return_value.unwrap();
    assert_eq!(rv.len(), 1);
    assert_eq!(rv[0].nature(), Some(LinkNature::IS_ASSIGNED_FROM));
    assert_eq!(rv[0].to, "0:t");
}

#[test]
fn test_analyze_types_on_worker_pool() {
    let (mut builder, lib) = program_with_library();
    let mut names = Vec::new();
    for name in ["a.C", "a.D"] {
        let info = TypeInfo::new(name);
        let m = MethodBuilder::new(&info.name, "id")
            .parameter("x", lib.item_type())
            .returns(lib.item_type());
        let x = m.parameter_variable(0);
        names.push(info.name.clone());
        builder.add_type(info).add_method(m.body(body(vec![ret(var(&x))])).build());
    }

    let config = linkgraph_ir::config::LinkConfig::default()
        .parallel(true)
        .num_workers(2);
    let computer = computer_with(builder, config);
    let result = computer.analyze_types(&names).unwrap();

    assert_eq!(result.len(), 2);
    for methods in result.values() {
        assert_eq!(methods.len(), 1);
        assert!(methods.values().all(|o| o.is_available()));
    }
    assert_eq!(computer.stats().source_computations, 2);
}
