//! State shared by everything that analyzes one method body

use super::link_computer::LinkComputer;
use super::recursion::AnalysisTask;
use super::shallow::receiver;
use crate::config::LinkConfig;
use crate::errors::Result;
use crate::features::linkage::domain::MethodLinkedVariables;
use crate::features::linkage::ports::{HiddenContentProvider, MethodFactProvider, TypeModel};
use crate::shared::models::{MethodInfo, MethodRef, Variable};
use std::cell::Cell;
use std::sync::Arc;
use tracing::debug;

pub struct MethodContext<'c> {
    computer: &'c LinkComputer,
    task: &'c AnalysisTask,
    method: Arc<MethodInfo>,
    this: Option<Variable>,
    names: Cell<u32>,
}

impl<'c> MethodContext<'c> {
    pub fn new(computer: &'c LinkComputer, task: &'c AnalysisTask, method: Arc<MethodInfo>) -> Self {
        let this = receiver(computer.model(), &method);
        Self {
            computer,
            task,
            method,
            this,
            names: Cell::new(0),
        }
    }

    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    pub fn id(&self) -> &MethodRef {
        &self.method.id
    }

    pub fn this(&self) -> Option<&Variable> {
        self.this.as_ref()
    }

    pub fn model(&self) -> &dyn TypeModel {
        self.computer.model()
    }

    pub fn hidden(&self) -> &dyn HiddenContentProvider {
        self.computer.hidden()
    }

    pub fn facts(&self) -> &dyn MethodFactProvider {
        self.computer.facts()
    }

    pub fn config(&self) -> &LinkConfig {
        self.computer.config()
    }

    /// A name unique within this method, e.g. `$__rv3`
    pub fn fresh(&self, prefix: &str) -> String {
        let n = self.names.get();
        self.names.set(n + 1);
        format!("{}{}", prefix, n)
    }

    /// Summary of a callee; an unavailable one degrades to the conservative summary
    pub fn callee_summary(&self, callee: &MethodInfo) -> Result<Arc<MethodLinkedVariables>> {
        match self.computer.summary_in(&callee.id, self.task) {
            Ok(summary) => Ok(summary),
            Err(e) if e.is_unsupported() => {
                debug!(
                    "summary of {} unavailable in {}, assuming the worst: {}",
                    callee.id, self.method.id, e
                );
                let this = receiver(self.model(), callee);
                Ok(Arc::new(MethodLinkedVariables::conservative(callee, this.as_ref())))
            }
            Err(e) => Err(e),
        }
    }
}
