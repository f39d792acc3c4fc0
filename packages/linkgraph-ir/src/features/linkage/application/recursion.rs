//! Recursion control for summary computation
//!
//! A method is computed from source by at most one task at a time. A task is
//! one top-level request; it carries the chain of methods it is currently
//! computing. Acquiring a method fails when:
//! - the method is already on the task's own chain (self or mutual recursion)
//! - another task owns it
//!
//! Either way the caller substitutes a shallow summary instead of waiting, so
//! no task ever blocks on another one.

use crate::shared::models::MethodRef;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::cell::RefCell;

pub type TaskId = u64;

/// One top-level request and the methods it is computing, outermost first
#[derive(Debug)]
pub struct AnalysisTask {
    id: TaskId,
    chain: RefCell<Vec<MethodRef>>,
}

impl AnalysisTask {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            chain: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn depth(&self) -> usize {
        self.chain.borrow().len()
    }

    pub fn is_computing(&self, method: &MethodRef) -> bool {
        self.chain.borrow().contains(method)
    }

    /// Push `method` on the chain until the frame is dropped
    pub fn enter(&self, method: &MethodRef) -> ChainFrame<'_> {
        self.chain.borrow_mut().push(method.clone());
        ChainFrame { task: self }
    }
}

pub struct ChainFrame<'t> {
    task: &'t AnalysisTask,
}

impl Drop for ChainFrame<'_> {
    fn drop(&mut self) {
        self.task.chain.borrow_mut().pop();
    }
}

/// Outcome of `RecursionGuard::try_acquire`
pub enum Acquire<'g> {
    /// The caller computes the method; ownership ends when the token drops
    Owned(OwnerToken<'g>),
    /// The method is an ancestor on the caller's own chain
    Reentrant,
    /// Another task is computing the method
    Contended(TaskId),
}

#[derive(Debug, Default)]
pub struct RecursionGuard {
    owners: Mutex<FxHashMap<MethodRef, TaskId>>,
}

impl RecursionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, method: &MethodRef, task: &AnalysisTask) -> Acquire<'_> {
        if task.is_computing(method) {
            return Acquire::Reentrant;
        }
        let mut owners = self.owners.lock();
        match owners.get(method) {
            Some(owner) if *owner == task.id() => Acquire::Reentrant,
            Some(owner) => Acquire::Contended(*owner),
            None => {
                owners.insert(method.clone(), task.id());
                Acquire::Owned(OwnerToken {
                    guard: self,
                    method: method.clone(),
                })
            }
        }
    }

    pub fn owner(&self, method: &MethodRef) -> Option<TaskId> {
        self.owners.lock().get(method).copied()
    }

    /// Number of methods currently being computed
    pub fn in_progress(&self) -> usize {
        self.owners.lock().len()
    }

    fn release(&self, method: &MethodRef) {
        self.owners.lock().remove(method);
    }
}

pub struct OwnerToken<'g> {
    guard: &'g RecursionGuard,
    method: MethodRef,
}

impl OwnerToken<'_> {
    pub fn method(&self) -> &MethodRef {
        &self.method
    }
}

impl Drop for OwnerToken<'_> {
    fn drop(&mut self) {
        self.guard.release(&self.method);
    }
}
