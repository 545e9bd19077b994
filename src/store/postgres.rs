use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::model::{value_text, Constraint, SpellFilter};
use crate::store::traits::{Document, SpellStore, StoreError};

/// Document store backed by a single JSONB table. All filtering happens in
/// SQL against the stored document, so the database stays the sole durable
/// owner of spell records.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// One bound parameter of a compiled filter clause. Paths bind as text[]
/// (consumed by `#>`/`#>>`), membership sets as text[] for `ANY`/`?|`.
enum SqlBind {
    Text(String),
    TextArray(Vec<String>),
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the spells table and the unique identity index. The index on
    /// (lowercased name, system) is the authoritative uniqueness enforcement
    /// point; the catalog's existence check is only a fast path.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS spells (
                id BIGSERIAL PRIMARY KEY,
                data JSONB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create spells table")?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS spells_identity_idx
             ON spells ((lower(data ->> 'name')), ((data #>> '{metadata,system}')))",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create spell identity index")?;

        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn path_segments(field_path: &str) -> Vec<String> {
    field_path.split('.').map(str::to_string).collect()
}

/// Compile a filter into a WHERE clause plus its bind list. Equality matches
/// the document's text form of the field; membership matches a scalar against
/// the supplied set or, for stored string lists, intersects it via `?|`.
fn compile_where(filter: &SpellFilter) -> (String, Vec<SqlBind>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    for (path, constraint) in filter.constraints() {
        let path_param = binds.len() + 1;
        binds.push(SqlBind::TextArray(path_segments(path)));
        let value_param = binds.len() + 1;

        match constraint {
            Constraint::Equals(value) => {
                binds.push(SqlBind::Text(value_text(value)));
                clauses.push(format!("data #>> ${} = ${}", path_param, value_param));
            }
            Constraint::MemberOf(values) => {
                binds.push(SqlBind::TextArray(values.iter().map(value_text).collect()));
                clauses.push(format!(
                    "(data #>> ${p} = ANY(${v}) OR data #> ${p} ?| ${v})",
                    p = path_param,
                    v = value_param
                ));
            }
        }
    }

    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

#[async_trait::async_trait]
impl SpellStore for PostgresStore {
    async fn query(&self, filter: &SpellFilter) -> Result<Vec<Document>, StoreError> {
        let (clause, binds) = compile_where(filter);
        let sql = format!("SELECT data FROM spells{}", clause);

        let mut query = sqlx::query_scalar::<_, Document>(&sql);
        for bind in binds {
            query = match bind {
                SqlBind::Text(s) => query.bind(s),
                SqlBind::TextArray(v) => query.bind(v),
            };
        }
        let docs = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to query spell documents")?;

        Ok(docs)
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO spells (data) VALUES ($1)")
            .bind(doc)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(StoreError::Backend(
                anyhow::Error::new(e).context("Failed to insert spell document"),
            )),
        }
    }

    async fn delete(&self, filter: &SpellFilter) -> Result<(), StoreError> {
        let (clause, binds) = compile_where(filter);
        let sql = format!("DELETE FROM spells{}", clause);

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = match bind {
                SqlBind::Text(s) => query.bind(s),
                SqlBind::TextArray(v) => query.bind(v),
            };
        }
        let deleted = query
            .execute(&self.pool)
            .await
            .context("Failed to delete spell documents")?;
        log::debug!("deleted {} spell document(s)", deleted.rows_affected());

        Ok(())
    }

    async fn distinct_values(&self, field_path: &str) -> Result<Vec<Document>, StoreError> {
        // List-valued fields contribute their elements, scalars themselves.
        let docs = sqlx::query_scalar::<_, Document>(
            "SELECT DISTINCT elem FROM spells,
             LATERAL jsonb_array_elements(
                 CASE WHEN jsonb_typeof(data #> $1) = 'array'
                      THEN data #> $1
                      ELSE jsonb_build_array(data #> $1)
                 END
             ) AS elem
             WHERE data #> $1 IS NOT NULL",
        )
        .bind(path_segments(field_path))
        .fetch_all(&self.pool)
        .await
        .context("Failed to collect distinct field values")?;

        Ok(docs)
    }

    async fn field_names(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT key FROM spells,
             LATERAL jsonb_object_keys(
                 CASE WHEN jsonb_typeof(data -> 'attributes') = 'object'
                      THEN data -> 'attributes'
                      ELSE '{}'::jsonb
                 END
             ) AS key",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list attribute field names")?;

        Ok(names)
    }
}
