//! # Document Sequence Repository
//!
//! Allocates human-readable document numbers from the per-(prefix,
//! year-month) counter rows. The counter mutation is a single atomic
//! upsert-with-increment so two concurrent callers can never receive the
//! same sequence number for the same bucket; serialization is delegated to
//! the storage engine's row-level atomicity, not an application lock.

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};

use crate::docno;
use crate::models::doc_sequence;

/// Repository for document number allocation.
///
/// Generic over the connection so allocation can run inside a caller's
/// transaction; rollback behavior is then the caller's decision.
pub struct DocSequenceRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DocSequenceRepository<'a, C> {
    /// Create a new DocSequenceRepository with the given connection
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Allocate the next document number for `prefix`, bucketed by `date`.
    ///
    /// Buckets by the supplied business date, not the wall clock. On first
    /// use of a bucket the counter row is created with `last_seq = 1`;
    /// afterwards the row is incremented by exactly 1. Both cases are one
    /// `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement.
    pub async fn allocate(&self, prefix: &str, date: NaiveDate) -> Result<String, DbErr> {
        let year_month = docno::year_month(date);

        let counter = doc_sequence::Entity::insert(doc_sequence::ActiveModel {
            prefix: Set(prefix.to_string()),
            year_month: Set(year_month.clone()),
            last_seq: Set(1),
        })
        .on_conflict(
            OnConflict::columns([
                doc_sequence::Column::Prefix,
                doc_sequence::Column::YearMonth,
            ])
            .value(
                doc_sequence::Column::LastSeq,
                Expr::col(doc_sequence::Column::LastSeq).add(1),
            )
            .to_owned(),
        )
        .exec_with_returning(self.db)
        .await?;

        Ok(docno::format_document_no(
            prefix,
            &year_month,
            counter.last_seq,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::{Database, DatabaseConnection};

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn first_allocation_starts_at_one() {
        let db = setup_test_db().await;
        let repo = DocSequenceRepository::new(&db);

        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let number = repo.allocate("SO", date).await.unwrap();

        assert_eq!(number, "SO-202406-00001");
    }

    #[tokio::test]
    async fn sequential_allocations_are_contiguous() {
        let db = setup_test_db().await;
        let repo = DocSequenceRepository::new(&db);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        for expected in 1..=42 {
            let number = repo.allocate("SO", date).await.unwrap();
            assert_eq!(
                number,
                format!("SO-202406-{:05}", expected),
                "allocation {} out of order",
                expected
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_are_distinct_and_contiguous() {
        let db = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let db = db.clone();
            tasks.spawn(async move {
                DocSequenceRepository::new(&db)
                    .allocate("SO", date)
                    .await
                    .unwrap()
            });
        }

        let mut numbers = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            numbers.push(joined.unwrap());
        }

        // Zero-padded numbers of equal width sort lexicographically.
        numbers.sort();
        let expected: Vec<String> = (1..=16).map(|n| format!("SO-202406-{:05}", n)).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn buckets_are_independent() {
        let db = setup_test_db().await;
        let repo = DocSequenceRepository::new(&db);

        let june = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let july = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        assert_eq!(repo.allocate("SO", june).await.unwrap(), "SO-202406-00001");
        assert_eq!(repo.allocate("SO", july).await.unwrap(), "SO-202407-00001");
        assert_eq!(repo.allocate("PO", june).await.unwrap(), "PO-202406-00001");
        assert_eq!(repo.allocate("SO", june).await.unwrap(), "SO-202406-00002");
    }
}
