use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use super::user::RepositoryError;
use crate::domain::Member;
use crate::domain::member::member_column;
use crate::util::query::ListQuery;

const DEFAULT_COLUMN: &str = "id";
const DEFAULT_SEARCH_COLUMN: &str = "nama";

#[derive(Debug, Clone)]
pub struct MemberPage {
    pub items: Vec<Member>,
    pub total: u64,
}

#[async_trait]
pub trait MemberRepository {
    async fn list(&self, query: &ListQuery) -> Result<MemberPage, RepositoryError>;
}

#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
        if let (Some(condition), Some(pattern)) =
            (query.filter.condition(), query.filter.ilike_pattern())
        {
            let column = member_column(&condition.field).unwrap_or(DEFAULT_SEARCH_COLUMN);
            builder.push(format!(" WHERE {column} ILIKE "));
            builder.push_bind(pattern);
        }
    }

    fn map_row(row: &PgRow) -> Result<Member, sqlx::Error> {
        Ok(Member {
            id: row.try_get("id")?,
            nama: row.try_get("nama")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            household_id: row.try_get("household_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn list(&self, query: &ListQuery) -> Result<MemberPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members");
        Self::push_filter(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let sort_column = member_column(&query.sort.sort_by).unwrap_or_else(|| {
            tracing::debug!(sort_by = %query.sort.sort_by, "unsortable member column, using id");
            DEFAULT_COLUMN
        });

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT id, nama, email, phone, household_id, created_at FROM members",
        );
        Self::push_filter(&mut select, query);
        select.push(format!(
            " ORDER BY {sort_column} {}, id ASC LIMIT ",
            query.sort.sort_order.as_sql()
        ));
        select.push_bind(i64::from(query.pagination.limit));
        select.push(" OFFSET ");
        select.push_bind(query.pagination.skip as i64);

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(Self::map_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MemberPage {
            items,
            total: total.max(0) as u64,
        })
    }
}
