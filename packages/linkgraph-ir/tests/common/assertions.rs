//! Summary assertions

use linkgraph_ir::errors::Phase;
use linkgraph_ir::shared::models::MethodRef;
use linkgraph_ir::{LinkComputer, MethodLinkedVariables, SummaryOutcome};
use std::sync::Arc;

/// Summary of `method`; panics when it is unavailable
pub fn available(computer: &LinkComputer, method: &MethodRef) -> Arc<MethodLinkedVariables> {
    match computer.summary(method) {
        Ok(SummaryOutcome::Available(s)) => s,
        Ok(SummaryOutcome::Unavailable(record)) => {
            panic!("Expected a summary of {method}, unavailable: {record}")
        }
        Err(e) => panic!("Expected a summary of {method}, got error: {e}"),
    }
}

pub fn assert_unavailable(computer: &LinkComputer, method: &MethodRef, phase: Phase) {
    match computer.summary(method) {
        Ok(SummaryOutcome::Unavailable(record)) => assert_eq!(
            record.phase, phase,
            "Expected {method} to fail in phase {phase}, got {record}"
        ),
        other => panic!("Expected {method} to be unavailable, got {other:?}"),
    }
}

/// Rendered return links of `summary`
pub fn return_links(summary: &MethodLinkedVariables) -> String {
    summary
        .of_return()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn assert_return_contains(summary: &MethodLinkedVariables, fragments: &[&str]) {
    let rendered = return_links(summary);
    for fragment in fragments {
        assert!(
            rendered.split(',').any(|l| l == *fragment),
            "Expected return links to contain '{fragment}', got '{rendered}'"
        );
    }
}

pub fn assert_parameter_contains(summary: &MethodLinkedVariables, index: usize, fragment: &str) {
    let rendered = summary
        .of_parameter(index)
        .map(|l| l.to_string())
        .unwrap_or_default();
    assert!(
        rendered.split(',').any(|l| l == fragment),
        "Expected links of parameter {index} to contain '{fragment}', got '{rendered}'"
    );
}
