//! Ordered fallback strategies
//!
//! Consumers that want "try this, then that" chains build a
//! [`FallbackChain`] instead of nesting error handlers. Strategies run in
//! order; a failure or a rejected result moves on to the next one.

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{CatalogError, CatalogResult};

type Strategy<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, CatalogResult<T>> + Send + 'a>;
type Acceptor<'a, T> = Box<dyn Fn(&T) -> bool + Send + Sync + 'a>;

/// Ordered list of named strategies producing a `T`
pub struct FallbackChain<'a, T> {
    name: &'static str,
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
    accept: Option<Acceptor<'a, T>>,
}

impl<'a, T: Send + 'a> FallbackChain<'a, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strategies: Vec::new(),
            accept: None,
        }
    }

    /// Append a strategy; strategies run in insertion order
    pub fn strategy<F, Fut>(mut self, label: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = CatalogResult<T>> + Send + 'a,
    {
        let boxed: Strategy<'a, T> = Box::new(move || strategy().boxed());
        self.strategies.push((label, boxed));
        self
    }

    /// Reject successful results that fail `predicate` (e.g. empty lists)
    pub fn accept<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'a,
    {
        self.accept = Some(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies until one produces an accepted result
    pub async fn run(self) -> CatalogResult<T> {
        let Self {
            name,
            strategies,
            accept,
        } = self;

        for (label, strategy) in strategies {
            match strategy().await {
                Ok(value) if accept.as_ref().is_none_or(|accept| accept(&value)) => {
                    tracing::debug!(chain = name, strategy = label, "Fallback strategy succeeded");
                    return Ok(value);
                }
                Ok(_) => {
                    tracing::debug!(chain = name, strategy = label, "Fallback result rejected");
                }
                Err(e) => {
                    tracing::warn!(chain = name, strategy = label, error = %e, "Fallback strategy failed");
                }
            }
        }

        Err(CatalogError::Exhausted(name.to_string()))
    }

    /// Run strategies, returning `default` when all of them fail
    pub async fn run_or(self, default: T) -> T {
        self.run().await.unwrap_or(default)
    }
}
