use hashbrown::{HashMap, hash_map::Entry};

use crate::{
    message::{LogRecord, ResponseSnapshot},
    types::RequestId,
};

use super::indices::VecIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    MissingRecord(RequestId),
    AlreadyExists(RequestId),
    DuplicateId(RequestId),
}

#[derive(Debug, Default)]
pub struct RequestStore {
    records: HashMap<RequestId, LogRecord>,
    order: Vec<RequestId>,
    by_host: VecIndex<String>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from recovered records. Two records sharing an id is store
    /// corruption, not a caller error.
    pub fn from_records(records: Vec<LogRecord>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for record in records {
            let id = record.id;
            store
                .insert(record)
                .map_err(|_| StoreError::DuplicateId(id))?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, record: LogRecord) -> Result<&LogRecord, StoreError> {
        let id = record.id;
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                self.by_host
                    .entry(record.host.key())
                    .or_default()
                    .push(id);
                // Ids normally arrive ascending; pre-allocated ids may not.
                let idx = self.order.partition_point(|&existing| existing < id);
                self.order.insert(idx, id);
                Ok(slot.insert(record))
            }
        }
    }

    /// Attaches `response` in place and returns a clone of the updated
    /// record. A second attach for the same id overwrites the first.
    pub fn attach_response(
        &mut self,
        id: RequestId,
        response: ResponseSnapshot,
    ) -> Result<LogRecord, StoreError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StoreError::MissingRecord(id))?;
        record.response = Some(response);
        Ok(record.clone())
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: RequestId) -> Option<&LogRecord> {
        self.records.get(&id)
    }

    pub fn get_cloned(&self, id: RequestId) -> Option<LogRecord> {
        self.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_id(&self) -> Option<RequestId> {
        self.order.last().copied()
    }

    pub fn all_records(&self) -> Vec<&LogRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn all_records_cloned(&self) -> Vec<LogRecord> {
        self.all_records().into_iter().cloned().collect()
    }

    pub fn matching<F>(&self, filter: F) -> Vec<&LogRecord>
    where
        F: Fn(&LogRecord) -> bool,
    {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|record| filter(record))
            .collect()
    }

    pub fn matching_cloned<F>(&self, filter: F) -> Vec<LogRecord>
    where
        F: Fn(&LogRecord) -> bool,
    {
        self.matching(filter).into_iter().cloned().collect()
    }

    pub fn for_host(&self, host_key: &str) -> Vec<&LogRecord> {
        self.by_host
            .get(host_key)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn for_host_cloned(&self, host_key: &str) -> Vec<LogRecord> {
        self.for_host(host_key).into_iter().cloned().collect()
    }

    pub fn recent(&self, n: usize) -> Vec<&LogRecord> {
        let len = self.order.len();
        let start = len.saturating_sub(n);
        self.order[start..]
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn recent_cloned(&self, n: usize) -> Vec<LogRecord> {
        self.recent(n).into_iter().cloned().collect()
    }

    pub fn ordered_ids(&self) -> &[RequestId] {
        &self.order
    }
}
