use std::sync::Arc;

use tracing::instrument;

use crate::domain::Member;
use crate::repository::member::MemberRepository;
use crate::repository::user::RepositoryError;
use crate::util::query::{ListQuery, QueryOptions, RawListQuery};
use crate::util::response::PagedData;
use crate::util::{AppError, error::InternalError};

pub const MEMBER_MAX_PAGE_SIZE: u32 = 100;

pub fn member_query_options() -> QueryOptions {
    QueryOptions {
        search_field: "nama".to_string(),
        default_sort_by: "id".to_string(),
        max_limit: Some(MEMBER_MAX_PAGE_SIZE),
        ..QueryOptions::default()
    }
}

pub struct MemberService<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    repository: Arc<M>,
    options: QueryOptions,
}

impl<M> MemberService<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    pub fn new(repository: M) -> Self {
        Self {
            repository: Arc::new(repository),
            options: member_query_options(),
        }
    }

    #[instrument(skip(self, raw))]
    pub async fn list(&self, raw: &RawListQuery) -> Result<PagedData<Member>, AppError> {
        let query = ListQuery::parse(raw, &self.options);
        tracing::debug!(
            page = query.pagination.page,
            limit = query.pagination.limit,
            sort_by = %query.sort.sort_by,
            searching = !query.filter.is_empty(),
            "listing members"
        );

        let page = self.repository.list(&query).await.map_err(|err| match err {
            RepositoryError::Database(err) => AppError::from(err),
            RepositoryError::Domain(err) => {
                tracing::error!(error = %err, "stored member record is invalid");
                AppError::from(InternalError::Unknown)
            }
        })?;

        Ok(PagedData::new(page.items, &query.pagination, page.total))
    }
}
