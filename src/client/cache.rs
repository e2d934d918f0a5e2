use std::collections::{HashMap, HashSet};

use crate::client::api_client::{Business, Report};
use crate::shared::types::PaginatedResponse;

/// Identity of a cached list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Businesses,
    AllReports,
    BusinessReports(i64),
}

/// Loaded pages of one list, in page order
#[derive(Debug, Clone, PartialEq)]
pub enum PageSet {
    Businesses(Vec<PaginatedResponse<Business>>),
    Reports(Vec<PaginatedResponse<Report>>),
}

/// Record type that can live in a [`PageSet`]
pub trait CachedRecord: Clone {
    fn record_id(&self) -> i64;
    fn pages(set: &PageSet) -> Option<&[PaginatedResponse<Self>]>;
    fn pages_mut(set: &mut PageSet) -> Option<&mut Vec<PaginatedResponse<Self>>>;
    fn page_set(pages: Vec<PaginatedResponse<Self>>) -> PageSet;
}

impl CachedRecord for Business {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn pages(set: &PageSet) -> Option<&[PaginatedResponse<Self>]> {
        match set {
            PageSet::Businesses(pages) => Some(pages),
            PageSet::Reports(_) => None,
        }
    }

    fn pages_mut(set: &mut PageSet) -> Option<&mut Vec<PaginatedResponse<Self>>> {
        match set {
            PageSet::Businesses(pages) => Some(pages),
            PageSet::Reports(_) => None,
        }
    }

    fn page_set(pages: Vec<PaginatedResponse<Self>>) -> PageSet {
        PageSet::Businesses(pages)
    }
}

impl CachedRecord for Report {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn pages(set: &PageSet) -> Option<&[PaginatedResponse<Self>]> {
        match set {
            PageSet::Reports(pages) => Some(pages),
            PageSet::Businesses(_) => None,
        }
    }

    fn pages_mut(set: &mut PageSet) -> Option<&mut Vec<PaginatedResponse<Self>>> {
        match set {
            PageSet::Reports(pages) => Some(pages),
            PageSet::Businesses(_) => None,
        }
    }

    fn page_set(pages: Vec<PaginatedResponse<Self>>) -> PageSet {
        PageSet::Reports(pages)
    }
}

/// Exact copy of one cache entry, restored wholesale
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    key: QueryKey,
    entry: Option<PageSet>,
    stale: bool,
}

impl CacheSnapshot {
    pub fn key(&self) -> QueryKey {
        self.key
    }
}

/// Session cache of fetched list pages
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, PageSet>,
    stale: HashSet<QueryKey>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fetched page. A first page starts the list over; later pages
    /// replace the same page number or are appended in order.
    pub fn store_page<T: CachedRecord>(&mut self, key: QueryKey, page: PaginatedResponse<T>) {
        if page.meta.page <= 1 {
            self.entries.insert(key, T::page_set(vec![page]));
            self.stale.remove(&key);
            return;
        }

        match self.entries.get_mut(&key).and_then(T::pages_mut) {
            Some(pages) => match pages.iter().position(|p| p.meta.page >= page.meta.page) {
                Some(i) if pages[i].meta.page == page.meta.page => pages[i] = page,
                Some(i) => pages.insert(i, page),
                None => pages.push(page),
            },
            None => {
                self.entries.insert(key, T::page_set(vec![page]));
            }
        }
    }

    pub fn pages<T: CachedRecord>(&self, key: QueryKey) -> Option<&[PaginatedResponse<T>]> {
        self.entries.get(&key).and_then(T::pages)
    }

    pub(crate) fn pages_mut<T: CachedRecord>(
        &mut self,
        key: QueryKey,
    ) -> Option<&mut Vec<PaginatedResponse<T>>> {
        self.entries.get_mut(&key).and_then(T::pages_mut)
    }

    /// All loaded records of a list, in display order
    pub fn records<T: CachedRecord>(&self, key: QueryKey) -> Vec<T> {
        self.pages::<T>(key)
            .map(|pages| pages.iter().flat_map(|p| p.data.iter().cloned()).collect())
            .unwrap_or_default()
    }

    /// Cached total of a list, taken from its first page
    pub fn total(&self, key: QueryKey) -> Option<i64> {
        match self.entries.get(&key)? {
            PageSet::Businesses(pages) => pages.first().map(|p| p.meta.total),
            PageSet::Reports(pages) => pages.first().map(|p| p.meta.total),
        }
    }

    /// Mark a list for refetch. Its pages stay visible until replaced.
    pub fn invalidate(&mut self, key: QueryKey) {
        if self.entries.contains_key(&key) {
            self.stale.insert(key);
        }
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.stale.contains(&key)
    }

    pub fn snapshot(&self, key: QueryKey) -> CacheSnapshot {
        CacheSnapshot {
            key,
            entry: self.entries.get(&key).cloned(),
            stale: self.stale.contains(&key),
        }
    }

    pub fn restore(&mut self, snapshot: CacheSnapshot) {
        let CacheSnapshot { key, entry, stale } = snapshot;
        match entry {
            Some(entry) => {
                self.entries.insert(key, entry);
            }
            None => {
                self.entries.remove(&key);
            }
        }
        if stale {
            self.stale.insert(key);
        } else {
            self.stale.remove(&key);
        }
    }
}
