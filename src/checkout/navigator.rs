use std::sync::Mutex;

use crate::cache::lock::mutex_lock;
use crate::types::SaleId;

const SOURCE: &str = "checkout::navigator";

/// Screens the checkout flow can move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SaleSummary(SaleId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::SaleSummary(id) => format!("/checkout/{id}"),
        }
    }
}

/// Receives navigation requests from the checkout flow.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Records every route it is asked to show. The latest wins.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        mutex_lock(&self.routes, SOURCE, "current").last().copied()
    }

    pub fn history(&self) -> Vec<Route> {
        mutex_lock(&self.routes, SOURCE, "history").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        mutex_lock(&self.routes, SOURCE, "navigate").push(route);
    }
}
