//! Per-run bookkeeping of every URL the crawl has touched
//!
//! A URL is reserved before it is queued, so concurrent discovery by several
//! pages of the same batch queues it only once. After its fetch it is either
//! committed as a page or moved to the error set.

use std::collections::{BTreeMap, HashMap};

use crate::crawler::FetchError;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Queued for fetching at this depth
    Reserved { depth: u32 },
    /// Index into the page arena
    Fetched(usize),
}

/// Seen-set, result arena and error set of one run
#[derive(Debug, Default)]
pub struct Frontier {
    slots: HashMap<String, Slot>,
    pages: Vec<Page>,
    errors: BTreeMap<String, FetchError>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the URL is queued, fetched or failed
    pub fn is_seen(&self, url: &str) -> bool {
        self.slots.contains_key(url) || self.errors.contains_key(url)
    }

    /// Claims a URL for fetching at `depth`
    ///
    /// Returns false if the URL was already seen in this run; the first
    /// reservation wins, which keeps every page at its shallowest depth.
    pub fn reserve(&mut self, url: &str, depth: u32) -> bool {
        if self.is_seen(url) {
            return false;
        }

        self.slots.insert(url.to_string(), Slot::Reserved { depth });
        true
    }

    /// Depth a URL was reserved at, if it is still waiting for its fetch
    pub fn reserved_depth(&self, url: &str) -> Option<u32> {
        match self.slots.get(url) {
            Some(Slot::Reserved { depth }) => Some(*depth),
            _ => None,
        }
    }

    /// Records a successful fetch
    pub fn commit(&mut self, page: Page) {
        match self.slots.get(&page.url) {
            Some(Slot::Fetched(idx)) => {
                let idx = *idx;
                self.pages[idx] = page;
            }
            _ => {
                let idx = self.pages.len();
                self.slots.insert(page.url.clone(), Slot::Fetched(idx));
                self.pages.push(page);
            }
        }
    }

    /// Records a failed fetch, dropping the reservation
    pub fn fail(&mut self, url: &str, error: FetchError) {
        self.slots.remove(url);
        self.errors.insert(url.to_string(), error);
    }

    pub fn page(&self, url: &str) -> Option<&Page> {
        match self.slots.get(url) {
            Some(Slot::Fetched(idx)) => self.pages.get(*idx),
            _ => None,
        }
    }

    /// Pages in commit order
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn errors(&self) -> &BTreeMap<String, FetchError> {
        &self.errors
    }

    /// Consumes the frontier, returning its pages and errors
    pub fn into_parts(self) -> (Vec<Page>, BTreeMap<String, FetchError>) {
        (self.pages, self.errors)
    }
}
