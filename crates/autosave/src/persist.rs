//! The injected persistence capability

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Authoritative save of a value
///
/// Implementations decide create-vs-update semantics. The coordinator never
/// assumes a call is idempotent and never runs two at once.
#[async_trait]
pub trait Persister<T>: Send + Sync {
    async fn persist(&self, value: T) -> Result<()>;
}

#[async_trait]
impl<T, P> Persister<T> for Arc<P>
where
    T: Send + 'static,
    P: Persister<T> + ?Sized,
{
    async fn persist(&self, value: T) -> Result<()> {
        (**self).persist(value).await
    }
}

/// Persister backed by an async closure, see [`persist_fn`]
#[derive(Clone)]
pub struct FnPersister<F> {
    f: F,
}

/// Wrap an async closure as a [`Persister`]
///
/// ```ignore
/// let persister = persist_fn(|draft: Draft| async move { api.update(&draft).await });
/// ```
pub fn persist_fn<F>(f: F) -> FnPersister<F> {
    FnPersister { f }
}

#[async_trait]
impl<T, F, Fut> Persister<T> for FnPersister<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn persist(&self, value: T) -> Result<()> {
        (self.f)(value).await
    }
}
