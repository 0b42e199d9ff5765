//! Generic list controller shared by every CRUD screen.
//!
//! State machine: `Idle -> Loading -> Loaded | Error`. Changing the page,
//! page size, search text, a filter or the sort marks the controller dirty;
//! the next [`ListController::refresh`] re-enters `Loading`. Rows are cleared
//! when a fetch starts.
//!
//! Each fetch carries a generation number. A response whose generation is no
//! longer the latest is dropped, so a slow answer to an old query cannot
//! overwrite a newer one.

use log::{debug, error, info, warn};
use opd_core::backend::ResourceBackend;
use opd_core::error::{ApiError, Result};
use opd_core::pagination::{ListQuery, Page, PageInfo, Sort};
use opd_core::resource::{Resource, Validate};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct ListController<R: Resource> {
    query: ListQuery,
    state: LoadState,
    rows: Vec<R>,
    info: PageInfo,
    generation: u64,
    dirty: bool,
}

/// Message shown to the user for a failed action.
pub fn user_message(e: &ApiError, fallback: &str) -> String {
    match e {
        ApiError::Rejected { .. } | ApiError::Decode(_) => {
            e.server_message().unwrap_or(fallback).to_string()
        }
        other => other.to_string(),
    }
}

impl<R: Resource> ListController<R> {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: ListQuery::with_page_size(page_size),
            state: LoadState::Idle,
            rows: Vec::new(),
            info: PageInfo::default(),
            generation: 0,
            dirty: true,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn info(&self) -> &PageInfo {
        &self.info
    }

    pub fn needs_fetch(&self) -> bool {
        self.dirty
    }

    fn touch(&mut self, changed: bool) -> bool {
        if changed {
            self.dirty = true;
        }
        changed
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        let changed = self.query.page != page;
        self.query.page = page;
        self.touch(changed)
    }

    /// Changing anything but the page goes back to page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        let changed = self.query.page_size != page_size;
        if changed {
            self.query.page_size = page_size;
            self.query.page = 1;
        }
        self.touch(changed)
    }

    pub fn set_search(&mut self, search: &str) -> bool {
        let search = Some(search.to_string()).filter(|s| !s.trim().is_empty());
        let changed = self.query.search != search;
        if changed {
            self.query.search = search;
            self.query.page = 1;
        }
        self.touch(changed)
    }

    /// Set or clear (`None` / empty) a resource filter.
    pub fn set_filter(&mut self, key: &str, value: Option<&str>) -> bool {
        let value = value.filter(|v| !v.is_empty()).map(str::to_string);
        let changed = self.query.filters.get(key) != value.as_ref();
        if changed {
            match value {
                Some(v) => self.query.filters.insert(key.to_string(), v),
                None => self.query.filters.remove(key),
            };
            self.query.page = 1;
        }
        self.touch(changed)
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) -> bool {
        let changed = self.query.sort != sort;
        if changed {
            self.query.sort = sort;
            self.query.page = 1;
        }
        self.touch(changed)
    }

    /// Start a fetch: clears rows, enters `Loading`, supersedes older tickets.
    pub fn begin_fetch(&mut self) -> (FetchTicket, ListQuery) {
        self.generation += 1;
        self.rows.clear();
        self.state = LoadState::Loading;
        self.dirty = false;
        (
            FetchTicket {
                generation: self.generation,
            },
            self.query.clone(),
        )
    }

    /// Apply a fetch result. Returns false when the ticket was stale.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Page<R>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "[OPD] list: dropping stale {} response (generation {} < {})",
                R::LABEL,
                ticket.generation,
                self.generation
            );
            return false;
        }
        match result {
            Ok(page) => {
                self.rows = page.rows;
                self.info = page.info;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                let message = user_message(&e, &format!("Failed to load {} list", R::LABEL));
                error!("[OPD] list: {} fetch failed: {}", R::LABEL, e);
                self.rows.clear();
                self.info = PageInfo::default();
                self.state = LoadState::Error(message);
            }
        }
        true
    }

    /// Fetch the current query and apply the result.
    pub async fn refresh<B: ResourceBackend>(&mut self, backend: &B) -> Result<()> {
        let (ticket, query) = self.begin_fetch();
        let result = backend.list::<R>(&query).await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.finish_fetch(ticket, result);
        outcome
    }

    /// Refresh only if something changed since the last fetch.
    pub async fn refresh_if_needed<B: ResourceBackend>(&mut self, backend: &B) -> Result<()> {
        if self.needs_fetch() {
            self.refresh(backend).await
        } else {
            Ok(())
        }
    }

    async fn relist<B: ResourceBackend>(&mut self, backend: &B) {
        if let Err(e) = self.refresh(backend).await {
            warn!("[OPD] list: reload after change failed: {}", e);
        }
    }

    pub async fn create<B: ResourceBackend>(&mut self, backend: &B, payload: &R::Create) -> Result<()> {
        payload.validate()?;
        backend.create::<R>(payload).await.inspect_err(|e| {
            error!("[OPD] list: create {} failed: {}", R::LABEL, e);
        })?;
        info!("[OPD] list: {} created", R::LABEL);
        self.relist(backend).await;
        Ok(())
    }

    pub async fn update<B: ResourceBackend>(
        &mut self,
        backend: &B,
        id: i64,
        payload: &R::Update,
    ) -> Result<()> {
        payload.validate()?;
        backend.update::<R>(id, payload).await.inspect_err(|e| {
            error!("[OPD] list: update {} {} failed: {}", R::LABEL, id, e);
        })?;
        info!("[OPD] list: {} {} updated", R::LABEL, id);
        self.relist(backend).await;
        Ok(())
    }

    /// Delete after `confirm` agrees. Returns `Ok(false)` when declined.
    pub async fn delete<B, F>(&mut self, backend: &B, id: i64, confirm: F) -> Result<bool>
    where
        B: ResourceBackend,
        F: FnOnce(&str) -> bool,
    {
        let prompt = format!("Delete {} {}?", R::LABEL, id);
        if !confirm(&prompt) {
            debug!("[OPD] list: delete {} {} cancelled", R::LABEL, id);
            return Ok(false);
        }
        backend.delete::<R>(id).await.inspect_err(|e| {
            error!("[OPD] list: delete {} {} failed: {}", R::LABEL, id, e);
        })?;
        info!("[OPD] list: {} {} deleted", R::LABEL, id);
        self.relist(backend).await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_core::letters::{Company, CreateCompany, LetterNumber, LetterNumberForm};
    use opd_core::pagination::{ListEnvelope, SortDirection};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// Serves a fixed JSON body for lists and records every call.
    #[derive(Default)]
    struct FakeBackend {
        list_body: RefCell<Value>,
        fail_list: RefCell<Option<ApiError>>,
        fail_write: RefCell<Option<ApiError>>,
        calls: RefCell<Vec<String>>,
    }

    impl ResourceBackend for FakeBackend {
        async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Page<R>> {
            self.calls
                .borrow_mut()
                .push(format!("list {} page={}", R::PATH, query.page));
            if let Some(e) = self.fail_list.borrow().clone() {
                return Err(e);
            }
            let envelope: ListEnvelope<R> = serde_json::from_value(self.list_body.borrow().clone())?;
            Ok(envelope.into_page(query))
        }

        async fn create<R: Resource>(&self, payload: &R::Create) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("create {} {}", R::PATH, serde_json::to_string(payload)?));
            match self.fail_write.borrow().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn update<R: Resource>(&self, id: i64, _payload: &R::Update) -> Result<()> {
            self.calls.borrow_mut().push(format!("update {} {}", R::PATH, id));
            match self.fail_write.borrow().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn delete<R: Resource>(&self, id: i64) -> Result<()> {
            self.calls.borrow_mut().push(format!("delete {} {}", R::PATH, id));
            Ok(())
        }
    }

    fn companies_body() -> Value {
        json!({
            "data": [{"id": 1, "code": "KPC", "name": "Kaltim"}, {"id": 2, "code": "ABC", "name": "Abc"}],
            "meta": {"pagination": {"page": 1, "pageSize": 10, "totalCount": 2, "totalPages": 1}}
        })
    }

    #[tokio::test]
    async fn refresh_loads_rows_and_pagination() {
        let backend = FakeBackend::default();
        *backend.list_body.borrow_mut() = companies_body();
        let mut controller: ListController<Company> = ListController::new(10);
        assert_eq!(controller.state(), &LoadState::Idle);
        assert!(controller.needs_fetch());

        controller.refresh(&backend).await.unwrap();
        assert_eq!(controller.state(), &LoadState::Loaded);
        assert_eq!(controller.rows().len(), 2);
        assert_eq!(controller.info().total_count, 2);
        assert!(!controller.needs_fetch());
    }

    #[tokio::test]
    async fn failure_clears_rows_and_keeps_message() {
        let backend = FakeBackend::default();
        *backend.list_body.borrow_mut() = companies_body();
        let mut controller: ListController<Company> = ListController::new(10);
        controller.refresh(&backend).await.unwrap();

        *backend.fail_list.borrow_mut() = Some(ApiError::Rejected {
            status: 500,
            message: "Database unavailable".to_string(),
        });
        controller.set_page(2);
        assert!(controller.refresh(&backend).await.is_err());
        assert!(controller.rows().is_empty());
        assert_eq!(
            controller.state(),
            &LoadState::Error("Database unavailable".to_string())
        );
    }

    #[tokio::test]
    async fn failure_without_server_message_uses_list_fallback() {
        let backend = FakeBackend::default();
        *backend.fail_list.borrow_mut() = Some(ApiError::from_status(502, "<html>bad gateway</html>"));
        let mut controller: ListController<Company> = ListController::new(10);
        assert!(controller.refresh(&backend).await.is_err());
        assert_eq!(
            controller.state(),
            &LoadState::Error("Failed to load company list".to_string())
        );

        *backend.fail_list.borrow_mut() = Some(ApiError::Unauthorized);
        assert!(controller.refresh(&backend).await.is_err());
        assert_eq!(
            controller.state(),
            &LoadState::Error("Session expired. Please log in again.".to_string())
        );
    }

    #[test]
    fn query_changes_mark_dirty_and_reset_page() {
        let mut controller: ListController<Company> = ListController::new(10);
        let _ = controller.begin_fetch();
        assert!(!controller.needs_fetch());

        assert!(controller.set_page(3));
        assert!(controller.needs_fetch());
        assert!(!controller.set_page(3));

        assert!(controller.set_search("kal"));
        assert_eq!(controller.query().page, 1);
        assert!(!controller.set_search("kal"));

        controller.set_page(2);
        assert!(controller.set_filter("isActive", Some("true")));
        assert_eq!(controller.query().page, 1);
        assert!(controller.set_filter("isActive", None));
        assert!(!controller.set_filter("isActive", Some("")));

        assert!(controller.set_sort(Some(Sort {
            field: "name".to_string(),
            direction: SortDirection::Asc,
        })));
        assert!(controller.set_page_size(25));
        assert_eq!(controller.query().page_size, 25);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut controller: ListController<Company> = ListController::new(10);
        let (old_ticket, _) = controller.begin_fetch();
        controller.set_search("abc");
        let (new_ticket, _) = controller.begin_fetch();

        let newer: ListEnvelope<Company> =
            serde_json::from_value(json!([{"id": 2, "code": "ABC", "name": "Abc"}])).unwrap();
        assert!(controller.finish_fetch(new_ticket, Ok(newer.into_page(&ListQuery::default()))));

        let older: ListEnvelope<Company> = serde_json::from_value(companies_body()).unwrap();
        assert!(!controller.finish_fetch(old_ticket, Ok(older.into_page(&ListQuery::default()))));

        assert_eq!(controller.rows().len(), 1);
        assert_eq!(controller.rows()[0].code, "ABC");
    }

    #[tokio::test]
    async fn create_validates_before_network() {
        let backend = FakeBackend::default();
        *backend.list_body.borrow_mut() = json!([]);
        let mut controller: ListController<LetterNumber> = ListController::new(10);
        let form = LetterNumberForm {
            company_id: 0,
            document_type_id: 1,
            letter_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            subject: "Subject".to_string(),
            recipient: "Recipient".to_string(),
            notes: None,
        };
        let err = controller.create(&backend, &form).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(backend.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn create_then_relists() {
        let backend = FakeBackend::default();
        *backend.list_body.borrow_mut() = companies_body();
        let mut controller: ListController<Company> = ListController::new(10);
        let form = CreateCompany {
            code: "NEW".to_string(),
            name: "New Co".to_string(),
            address: None,
        };
        controller.create(&backend, &form).await.unwrap();
        let calls = backend.calls.borrow();
        assert!(calls[0].starts_with("create companies"));
        assert_eq!(calls[1], "list companies page=1");
        assert_eq!(controller.state(), &LoadState::Loaded);
    }

    #[tokio::test]
    async fn create_failure_surfaces_server_message() {
        let backend = FakeBackend::default();
        *backend.fail_write.borrow_mut() = Some(ApiError::from_status(
            409,
            r#"{"data":{"message":"Company code already exists"}}"#,
        ));
        let mut controller: ListController<Company> = ListController::new(10);
        let form = CreateCompany {
            code: "KPC".to_string(),
            name: "Dup".to_string(),
            address: None,
        };
        let err = controller.create(&backend, &form).await.unwrap_err();
        assert_eq!(err.to_string(), "Company code already exists");
        assert_eq!(backend.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let backend = FakeBackend::default();
        *backend.list_body.borrow_mut() = companies_body();
        let mut controller: ListController<Company> = ListController::new(10);

        let mut prompt_seen = String::new();
        let deleted = controller
            .delete(&backend, 2, |prompt| {
                prompt_seen = prompt.to_string();
                false
            })
            .await
            .unwrap();
        assert!(!deleted);
        assert_eq!(prompt_seen, "Delete company 2?");
        assert!(backend.calls.borrow().is_empty());

        assert!(controller.delete(&backend, 2, |_| true).await.unwrap());
        let calls = backend.calls.borrow();
        assert_eq!(calls[0], "delete companies 2");
        assert_eq!(calls[1], "list companies page=1");
    }
}
