//! Read queries and write options

use crate::store::{Filter, SortSpec};

/// Query accepted by [`Engine::read`](super::Engine::read)
#[derive(Debug, Clone, Default)]
pub struct ReadQuery {
    /// Required; an absent filter is a bad request
    pub filter: Option<Filter>,
    pub sort: Option<SortSpec>,
    /// Zero-based page index
    pub page: Option<usize>,
    /// Page size; zero is a bad request
    pub size: Option<usize>,
}

impl ReadQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: usize, size: usize) -> Self {
        self.page = Some(page);
        self.size = Some(size);
        self
    }
}

/// Options for [`Engine::update`](super::Engine::update)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Evaluate `submit` gates in place of `write` gates where declared
    pub submit: bool,
}

impl UpdateOptions {
    pub fn write() -> Self {
        Self { submit: false }
    }

    pub fn submit() -> Self {
        Self { submit: true }
    }
}
