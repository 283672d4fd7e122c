//! Factories stored in the dispatch registry.

use crate::model::endpoint::Endpoint;
use crate::sender::contract::{SendResult, Sender};
use crate::store::report_store::{ReportStore, StorageParams, StoreResult};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type BuildSender = dyn Fn(&Endpoint) -> SendResult<Box<dyn Sender>> + Send + Sync;
type BuildReportStore = dyn Fn(&StorageParams) -> StoreResult<Box<dyn ReportStore>> + Send + Sync;

/// Builds a sender bound to one destination endpoint.
#[derive(Clone)]
pub struct SenderFactory(Arc<BuildSender>);

impl SenderFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Endpoint) -> SendResult<Box<dyn Sender>> + Send + Sync + 'static,
    {
        Self(Arc::new(build))
    }

    pub fn build(&self, endpoint: &Endpoint) -> SendResult<Box<dyn Sender>> {
        (self.0)(endpoint)
    }

    /// Whether both handles point at the same factory.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for SenderFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SenderFactory(..)")
    }
}

/// Builds a report store bound to storage parameters.
#[derive(Clone)]
pub struct ReportStoreFactory(Arc<BuildReportStore>);

impl ReportStoreFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&StorageParams) -> StoreResult<Box<dyn ReportStore>> + Send + Sync + 'static,
    {
        Self(Arc::new(build))
    }

    pub fn build(&self, params: &StorageParams) -> StoreResult<Box<dyn ReportStore>> {
        (self.0)(params)
    }

    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for ReportStoreFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReportStoreFactory(..)")
    }
}
