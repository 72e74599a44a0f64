// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fake target for tests

use async_trait::async_trait;

use crate::target::{SqlTarget, TargetError};

/// Records every statement; optionally fails at a fixed index
#[derive(Debug, Default)]
pub struct FakeTarget {
    pub statements: Vec<String>,
    fail_at: Option<usize>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `index`-th execute call (zero-based)
    pub fn failing_at(index: usize) -> Self {
        Self {
            statements: Vec::new(),
            fail_at: Some(index),
        }
    }
}

#[async_trait]
impl SqlTarget for FakeTarget {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError> {
        if self.fail_at == Some(self.statements.len()) {
            return Err(TargetError("injected failure".to_string()));
        }
        self.statements.push(sql.to_string());
        Ok(())
    }
}
