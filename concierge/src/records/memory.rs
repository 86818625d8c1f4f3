//! In-memory record store with seeded travel data
//!
//! The default collaborator for demos and tests. Mutations are counted
//! so tests can assert that a denied approval touched nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Domain, Filter, Record, RecordError, RecordStore};

/// Process-local record store, one table per domain
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Domain, Vec<Record>>>,
    next_id: AtomicU64,
    mutations: AtomicU64,
}

impl MemoryRecordStore {
    /// Empty store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
            mutations: AtomicU64::new(0),
        }
    }

    /// Store pre-populated with a small travel dataset
    pub fn seeded() -> Self {
        let mut tables = HashMap::new();

        tables.insert(
            Domain::Flight,
            vec![
                Record::new("LX0112")
                    .with("departure_airport", "CDG")
                    .with("arrival_airport", "BSL")
                    .with("scheduled_departure", "2026-09-01T08:25:00Z")
                    .with("seat", "18C")
                    .with("ticket_no", "7240005432906569")
                    .with("passenger_id", "3442 587242")
                    .with("status", "booked"),
                Record::new("LX0038")
                    .with("departure_airport", "ZRH")
                    .with("arrival_airport", "JFK")
                    .with("scheduled_departure", "2026-09-03T13:10:00Z")
                    .with("status", "available"),
                Record::new("LX1482")
                    .with("departure_airport", "ZRH")
                    .with("arrival_airport", "BSL")
                    .with("scheduled_departure", "2026-09-02T06:40:00Z")
                    .with("status", "available"),
            ],
        );

        tables.insert(
            Domain::Hotel,
            vec![
                Record::new("h-1")
                    .with("name", "Hilton Basel")
                    .with("location", "Basel")
                    .with("price_tier", "Luxury")
                    .with("status", "available"),
                Record::new("h-2")
                    .with("name", "Holiday Inn Basel")
                    .with("location", "Basel")
                    .with("price_tier", "Upper Midscale")
                    .with("status", "available"),
                Record::new("h-3")
                    .with("name", "Hyatt Regency Zurich")
                    .with("location", "Zurich")
                    .with("price_tier", "Upscale")
                    .with("status", "available"),
            ],
        );

        tables.insert(
            Domain::CarRental,
            vec![
                Record::new("c-1")
                    .with("name", "Europcar")
                    .with("location", "Basel")
                    .with("price_tier", "Economy")
                    .with("status", "available"),
                Record::new("c-2")
                    .with("name", "Avis")
                    .with("location", "Basel")
                    .with("price_tier", "Luxury")
                    .with("status", "available"),
                Record::new("c-3")
                    .with("name", "Hertz")
                    .with("location", "Zurich")
                    .with("price_tier", "Midsize")
                    .with("status", "available"),
            ],
        );

        tables.insert(
            Domain::Excursion,
            vec![
                Record::new("e-1")
                    .with("name", "Basel Old Town Walking Tour")
                    .with("location", "Basel")
                    .with("keywords", "history, architecture")
                    .with("status", "available"),
                Record::new("e-2")
                    .with("name", "Rhine River Cruise")
                    .with("location", "Basel")
                    .with("keywords", "scenic, river")
                    .with("status", "available"),
                Record::new("e-3")
                    .with("name", "Lucerne Day Trip")
                    .with("location", "Lucerne")
                    .with("keywords", "outdoor, scenic")
                    .with("status", "available"),
            ],
        );

        Self {
            tables: RwLock::new(tables),
            next_id: AtomicU64::new(1000),
            mutations: AtomicU64::new(0),
        }
    }

    /// Total create/update/cancel operations performed
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, domain: Domain, filter: &Filter) -> Result<Vec<Record>, RecordError> {
        debug!(%domain, "MemoryRecordStore::find: called");
        let tables = self.tables.read().await;
        let records = tables.get(&domain).map(Vec::as_slice).unwrap_or(&[]);
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn create(&self, domain: Domain, mut payload: Record) -> Result<Record, RecordError> {
        debug!(%domain, id = %payload.id, "MemoryRecordStore::create: called");
        if payload.id.is_empty() {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            payload.id = format!("{domain}-{n}");
        }

        let mut tables = self.tables.write().await;
        let table = tables.entry(domain).or_default();
        if table.iter().any(|r| r.id == payload.id) {
            return Err(RecordError::Conflict(format!(
                "{domain} record {} already exists",
                payload.id
            )));
        }

        table.push(payload.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(payload)
    }

    async fn update(&self, domain: Domain, id: &str, payload: serde_json::Value) -> Result<Record, RecordError> {
        debug!(%domain, %id, "MemoryRecordStore::update: called");
        let mut tables = self.tables.write().await;
        let table = tables.entry(domain).or_default();

        let record = table.iter_mut().find(|r| r.id == id).ok_or(RecordError::NotFound {
            domain,
            id: id.to_string(),
        })?;

        if let serde_json::Value::Object(fields) = payload {
            for (key, value) in fields {
                record.fields.insert(key, value);
            }
        }

        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn cancel(&self, domain: Domain, id: &str) -> Result<Record, RecordError> {
        debug!(%domain, %id, "MemoryRecordStore::cancel: called");
        let mut tables = self.tables.write().await;
        let table = tables.entry(domain).or_default();

        let record = table.iter_mut().find(|r| r.id == id).ok_or(RecordError::NotFound {
            domain,
            id: id.to_string(),
        })?;

        record.fields.insert("status".to_string(), "cancelled".into());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_empty_domain_returns_empty() {
        let store = MemoryRecordStore::new();
        let results = store.find(Domain::Hotel, &Filter::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = MemoryRecordStore::new();
        let created = store
            .create(Domain::Hotel, Record::new("h-9").with("location", "Bern"))
            .await
            .unwrap();
        assert_eq!(created.id, "h-9");

        let results = store
            .find(Domain::Hotel, &Filter::new().contains("location", "bern"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_id_when_missing() {
        let store = MemoryRecordStore::new();
        let created = store.create(Domain::CarRental, Record::new("")).await.unwrap();
        assert!(created.id.starts_with("car-rental-"));
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let store = MemoryRecordStore::new();
        store.create(Domain::Hotel, Record::new("h-1")).await.unwrap();
        let result = store.create(Domain::Hotel, Record::new("h-1")).await;
        assert!(matches!(result, Err(RecordError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_missing_record_not_found() {
        let store = MemoryRecordStore::new();
        let result = store
            .update(Domain::Flight, "nope", serde_json::json!({"seat": "1A"}))
            .await;
        assert!(matches!(result, Err(RecordError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryRecordStore::new();
        store
            .create(Domain::Flight, Record::new("LX1").with("seat", "18C"))
            .await
            .unwrap();

        let updated = store
            .update(Domain::Flight, "LX1", serde_json::json!({"seat": "2A"}))
            .await
            .unwrap();
        assert_eq!(updated.str_field("seat"), Some("2A"));
    }

    #[tokio::test]
    async fn test_cancel_marks_status() {
        let store = MemoryRecordStore::new();
        store
            .create(Domain::Excursion, Record::new("e-9").with("status", "booked"))
            .await
            .unwrap();

        let cancelled = store.cancel(Domain::Excursion, "e-9").await.unwrap();
        assert_eq!(cancelled.str_field("status"), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_mutation_count_tracks_writes() {
        let store = MemoryRecordStore::new();
        assert_eq!(store.mutation_count(), 0);

        store.create(Domain::Hotel, Record::new("h-1")).await.unwrap();
        store
            .update(Domain::Hotel, "h-1", serde_json::json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(store.mutation_count(), 2);

        // Reads never count
        store.find(Domain::Hotel, &Filter::new()).await.unwrap();
        assert_eq!(store.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_seeded_store_has_passenger_ticket() {
        let store = MemoryRecordStore::seeded();
        let results = store
            .find(Domain::Flight, &Filter::new().eq("passenger_id", "3442 587242"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "LX0112");
    }
}
