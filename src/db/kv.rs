//! # 키-값(KV) 저장소
//!
//! 문자열 키로 JSON 직렬화된 값을 읽고/쓰고/지웁니다.
//! 뮤지션 트래커가 상태 전체를 하나의 값으로 저장할 때 사용합니다.
//!
//! 쓰기는 `with_backoff`로 감싸서 일시적인 실패(SQLITE_BUSY 등)를 몇 번 더 시도합니다.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::services::retry::{with_backoff, DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY};

/// get / set / remove 세 가지 동작만 가진 저장소
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// `kv_store` 테이블을 쓰는 구현
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        // 같은 키가 있으면 값만 덮어씁니다 (upsert)
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// 값을 읽어 `T`로 역직렬화합니다. 키가 없으면 `Ok(None)`.
pub async fn get_json<T: DeserializeOwned, K: KvStore>(
    store: &K,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// 값을 JSON으로 직렬화해 저장합니다. 실패하면 지수 백오프로 재시도합니다.
pub async fn set_json<T: Serialize + ?Sized, K: KvStore>(
    store: &K,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    let raw = raw.as_str();
    with_backoff("kv write", DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY, move || {
        store.set(key, raw)
    })
    .await
}

/// 테스트용 메모리 저장소
#[cfg(test)]
#[derive(Default)]
pub struct MemoryKvStore {
    map: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 처음 `failures`번의 쓰기는 실패하는 저장소
    struct FlakyStore {
        inner: MemoryKvStore,
        failures: AtomicU32,
    }

    impl KvStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(AppError::Internal("storage busy".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn sqlite_store_roundtrip() {
        let store = SqliteKvStore::new(crate::db::test_pool().await);

        assert_eq!(store.get("k").await.unwrap(), None);
        set_json(&store, "k", &vec![1, 2, 3]).await.unwrap();
        set_json(&store, "k", &vec![4]).await.unwrap();

        let value: Option<Vec<i32>> = get_json(&store, "k").await.unwrap();
        assert_eq!(value, Some(vec![4]));

        store.remove("k").await.unwrap();
        let value: Option<Vec<i32>> = get_json(&store, "k").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_json_retries_transient_failures() {
        let store = FlakyStore {
            inner: MemoryKvStore::default(),
            failures: AtomicU32::new(2),
        };
        set_json(&store, "k", "hello").await.unwrap();
        let value: Option<String> = get_json(&store, "k").await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn set_json_gives_up_after_three_attempts() {
        let store = FlakyStore {
            inner: MemoryKvStore::default(),
            failures: AtomicU32::new(5),
        };
        assert!(set_json(&store, "k", "hello").await.is_err());
        assert_eq!(store.failures.load(Ordering::SeqCst), 2);
    }
}
