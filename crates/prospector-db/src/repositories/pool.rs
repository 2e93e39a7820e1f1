use crate::models::DbPool;
use crate::Result;
use prospector_core::types::PoolDetail;
use sqlx::SqlitePool;
use tracing::warn;

pub struct PoolRepository;

impl PoolRepository {
    /// Insert a pool or, when the address already exists, refresh its
    /// reserves and `updated_at` only. Idempotent.
    pub async fn upsert(pool: &SqlitePool, detail: &PoolDetail) -> Result<()> {
        let row = DbPool::from_detail(detail);
        sqlx::query(
            r#"
            INSERT INTO pools (id, protocol, token0, token1, fee, reserve0, reserve1)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                reserve0 = excluded.reserve0,
                reserve1 = excluded.reserve1,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&row.id)
        .bind(&row.protocol)
        .bind(&row.token0)
        .bind(&row.token1)
        .bind(row.fee)
        .bind(&row.reserve0)
        .bind(&row.reserve1)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Snapshot of the whole catalogue. Rows that no longer parse are
    /// skipped with a warning instead of poisoning the snapshot.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<PoolDetail>> {
        let rows = sqlx::query_as::<_, DbPool>(
            "SELECT id, protocol, token0, token1, fee, reserve0, reserve1 FROM pools",
        )
        .fetch_all(pool)
        .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_detail() {
                Ok(detail) => details.push(detail),
                Err(e) => warn!(error = %e, "Skipping corrupt pool row"),
            }
        }
        Ok(details)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pools")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabasePool;
    use alloy_primitives::{Address, U256};
    use prospector_core::types::Protocol;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    fn sample_pool(reserve0: u64, reserve1: u64) -> PoolDetail {
        PoolDetail {
            address: addr(0xAA),
            token0: addr(1),
            token1: addr(2),
            fee: 0.30,
            protocol: Protocol::V2Like,
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
        }
    }

    async fn memory_db() -> DatabasePool {
        let db = DatabasePool::new(":memory:").await.expect("open :memory:");
        db.migrate().await.expect("migrate");
        db
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_refreshes_reserves() {
        let db = memory_db().await;

        PoolRepository::upsert(db.inner(), &sample_pool(100, 200))
            .await
            .expect("first insert");
        PoolRepository::upsert(db.inner(), &sample_pool(111, 222))
            .await
            .expect("second insert");

        assert_eq!(PoolRepository::count(db.inner()).await.expect("count"), 1);

        let pools = PoolRepository::list(db.inner()).await.expect("list");
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].address, addr(0xAA));
        assert_eq!(pools[0].reserve0, U256::from(111u64));
        assert_eq!(pools[0].reserve1, U256::from(222u64));
        // Identity fields are untouched by the conflict path.
        assert_eq!(pools[0].token0, addr(1));
        assert_eq!(pools[0].protocol, Protocol::V2Like);
    }

    #[tokio::test]
    async fn list_returns_every_protocol_family() {
        let db = memory_db().await;

        for (n, protocol) in [
            (1u8, Protocol::V1Like),
            (2, Protocol::V2Like),
            (3, Protocol::V3),
            (4, Protocol::V4),
        ] {
            let mut pool = sample_pool(10, 20);
            pool.address = addr(n);
            pool.protocol = protocol;
            PoolRepository::upsert(db.inner(), &pool).await.expect("insert");
        }

        let mut protocols: Vec<Protocol> = PoolRepository::list(db.inner())
            .await
            .expect("list")
            .into_iter()
            .map(|p| p.protocol)
            .collect();
        protocols.sort_by_key(|p| p.as_str());
        assert_eq!(protocols.len(), 4);
    }

    #[tokio::test]
    async fn wei_scale_reserves_survive_the_round_trip() {
        let db = memory_db().await;

        let mut pool = sample_pool(0, 0);
        pool.reserve0 = U256::from(10u64).pow(U256::from(30u64));
        pool.reserve1 = U256::MAX;
        PoolRepository::upsert(db.inner(), &pool).await.expect("insert");

        let listed = PoolRepository::list(db.inner()).await.expect("list");
        assert_eq!(listed[0].reserve0, pool.reserve0);
        assert_eq!(listed[0].reserve1, U256::MAX);
    }
}
