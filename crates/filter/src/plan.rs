//! Compiled, reusable filter plans.

use std::sync::Arc;

use tracing::{debug, warn};

use recflow_core::{Entity, Item, Properties, User};

use crate::error::{CompileError, Result};
use crate::operator::{compile, FilterOperator};
use crate::schema::{Domain, FilterParamConfig};

/// Ordered user-domain and item-domain operators, compiled once per
/// configuration load and shared across every (user, item) pair.
///
/// A plan holds no mutable state; it is `Send + Sync` and can be evaluated
/// concurrently without synchronization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPlan {
    user_ops: Vec<FilterOperator>,
    item_ops: Vec<FilterOperator>,
}

impl FilterPlan {
    /// Compile descriptors in order. Top-level descriptors without a
    /// `Domain` target the item. Fails on the first invalid descriptor.
    pub fn compile(configs: &[FilterParamConfig]) -> std::result::Result<Self, CompileError> {
        let mut plan = Self::default();
        for config in configs {
            let op = compile(config, Domain::Item)?;
            match op.domain() {
                Domain::User => plan.user_ops.push(op),
                Domain::Item => plan.item_ops.push(op),
            }
        }
        debug!(
            user_ops = plan.user_ops.len(),
            item_ops = plan.item_ops.len(),
            "compiled filter plan"
        );
        Ok(plan)
    }

    pub fn user_ops(&self) -> &[FilterOperator] {
        &self.user_ops
    }

    pub fn item_ops(&self) -> &[FilterOperator] {
        &self.item_ops
    }

    pub fn len(&self) -> usize {
        self.user_ops.len() + self.item_ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ops.is_empty() && self.item_ops.is_empty()
    }

    /// `true` only if every operator passes. User-domain operators run
    /// first; evaluation stops at the first rejection or error.
    pub fn evaluate(&self, user: &Properties, item: &Properties) -> Result<bool> {
        for op in &self.user_ops {
            if !op.evaluate(user, user, item)? {
                return Ok(false);
            }
        }
        for op in &self.item_ops {
            if !op.evaluate(item, user, item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Admission decision for one candidate. Evaluation errors reject the
    /// item and are logged.
    pub fn admit(&self, user: &User, item: &Item) -> bool {
        if self.is_empty() {
            return true;
        }
        self.admit_with(&user.properties(), item)
    }

    /// Keep the candidates [`admit`](Self::admit) accepts, in order.
    pub fn retain(&self, user: &User, items: Vec<Arc<Item>>) -> Vec<Arc<Item>> {
        if self.is_empty() {
            return items;
        }
        let user_props = user.properties();
        let before = items.len();
        let kept: Vec<_> = items
            .into_iter()
            .filter(|item| self.admit_with(&user_props, item))
            .collect();
        debug!(
            user_id = %user.id(),
            candidates = before,
            admitted = kept.len(),
            "filtered candidates"
        );
        kept
    }

    fn admit_with(&self, user_props: &Properties, item: &Item) -> bool {
        match self.evaluate(user_props, &item.features()) {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(item_id = %item.id(), error = %e, "filter evaluation failed, rejecting item");
                false
            }
        }
    }
}
