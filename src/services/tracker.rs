//! # 뮤지션 트래커 상태 컨테이너
//!
//! 전역 가변 상태 대신, 상태를 값으로 받아 새 상태를 돌려주는 **순수 리듀서**로
//! 일정/할 일의 추가·수정·삭제를 처리합니다.
//!
//! ```text
//! load_state() ──▶ reduce(state, action) ──▶ save_state()
//!      (KV)            (순수 함수)              (KV + 백오프 재시도)
//! ```
//!
//! `reduce`는 I/O를 하지 않으므로 저장소 없이 테스트할 수 있습니다.
//! 새 항목의 ID는 호출자가 넘긴 `new_id` 클로저로 만듭니다.
//!
//! 불러오기부터 저장까지는 사용자별 잠금(`UserLocks`) 안에서 실행됩니다.
//! 같은 사용자의 동작이 동시에 들어와도 차례로 적용되어 앞선 동작이 사라지지 않습니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db::kv::{self, KvStore};
use crate::error::AppError;
use crate::models::{TrackerAction, TrackerEvent, TrackerState, TrackerTask};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Title must not be empty")]
    EmptyTitle,
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(..) => AppError::NotFound,
            TrackerError::UnknownEvent(_) => AppError::invalid("event_id", err.to_string()),
            TrackerError::EmptyTitle => AppError::invalid("title", err.to_string()),
        }
    }
}

fn clean_title(title: String) -> Result<String, TrackerError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(TrackerError::EmptyTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

fn ensure_event(state: &TrackerState, event_id: Option<&str>) -> Result<(), TrackerError> {
    match event_id {
        Some(id) if !state.events.iter().any(|e| e.id == id) => {
            Err(TrackerError::UnknownEvent(id.to_string()))
        }
        _ => Ok(()),
    }
}

/// 동작 하나를 적용한 새 상태를 돌려줍니다.
///
/// 실패하면 입력 상태는 버려지므로, 호출자는 원래 상태를 다시 불러와야 합니다.
pub fn reduce(
    mut state: TrackerState,
    action: TrackerAction,
    new_id: impl FnOnce() -> String,
) -> Result<TrackerState, TrackerError> {
    match action {
        TrackerAction::AddEvent {
            title,
            kind,
            starts_at,
            venue,
        } => {
            state.events.push(TrackerEvent {
                id: new_id(),
                title: clean_title(title)?,
                kind,
                starts_at,
                venue,
            });
            state.events.sort_by_key(|e| e.starts_at);
        }

        TrackerAction::UpdateEvent {
            id,
            title,
            starts_at,
            venue,
        } => {
            let event = state
                .events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or(TrackerError::NotFound("Event", id))?;
            if let Some(title) = title {
                event.title = clean_title(title)?;
            }
            if let Some(starts_at) = starts_at {
                event.starts_at = starts_at;
            }
            if let Some(venue) = venue {
                event.venue = venue;
            }
            state.events.sort_by_key(|e| e.starts_at);
        }

        TrackerAction::DeleteEvent { id } => {
            let before = state.events.len();
            state.events.retain(|e| e.id != id);
            if state.events.len() == before {
                return Err(TrackerError::NotFound("Event", id));
            }
            // 딸린 할 일은 지우지 않고 연결만 끊습니다.
            for task in state.tasks.iter_mut() {
                if task.event_id.as_deref() == Some(id.as_str()) {
                    task.event_id = None;
                }
            }
        }

        TrackerAction::AddTask {
            title,
            kind,
            event_id,
            due_date,
        } => {
            ensure_event(&state, event_id.as_deref())?;
            state.tasks.push(TrackerTask {
                id: new_id(),
                title: clean_title(title)?,
                kind,
                event_id,
                done: false,
                due_date,
            });
        }

        TrackerAction::UpdateTask {
            id,
            title,
            event_id,
            due_date,
        } => {
            if let Some(Some(event_id)) = &event_id {
                ensure_event(&state, Some(event_id.as_str()))?;
            }
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(TrackerError::NotFound("Task", id))?;
            if let Some(title) = title {
                task.title = clean_title(title)?;
            }
            if let Some(event_id) = event_id {
                task.event_id = event_id;
            }
            if let Some(due_date) = due_date {
                task.due_date = due_date;
            }
        }

        TrackerAction::ToggleTask { id } => {
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(TrackerError::NotFound("Task", id))?;
            task.done = !task.done;
        }

        TrackerAction::DeleteTask { id } => {
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            if state.tasks.len() == before {
                return Err(TrackerError::NotFound("Task", id));
            }
        }
    }

    Ok(state)
}

/// 사용자 ID별 비동기 잠금
///
/// 잠금은 `.await`를 넘어 유지되므로 `tokio::sync::Mutex`를 씁니다.
/// 아무도 쥐고 있지 않은 항목은 다음 `acquire` 때 정리됩니다.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

fn state_key(user_id: &str) -> String {
    format!("tracker:{user_id}")
}

/// 저장된 상태를 읽습니다. 처음 쓰는 사용자는 빈 상태입니다.
pub async fn load_state<K: KvStore>(store: &K, user_id: &str) -> Result<TrackerState, AppError> {
    Ok(kv::get_json(store, &state_key(user_id))
        .await?
        .unwrap_or_default())
}

pub async fn save_state<K: KvStore>(
    store: &K,
    user_id: &str,
    state: &TrackerState,
) -> Result<(), AppError> {
    kv::set_json(store, &state_key(user_id), state).await
}

/// 상태 불러오기 → 리듀서 적용 → 저장을 한 번에 처리합니다.
pub async fn dispatch<K: KvStore>(
    store: &K,
    locks: &UserLocks,
    user_id: &str,
    action: TrackerAction,
) -> Result<TrackerState, AppError> {
    let _guard = locks.acquire(user_id).await;
    let state = load_state(store, user_id).await?;
    let next = reduce(state, action, || uuid::Uuid::now_v7().to_string())?;
    save_state(store, user_id, &next).await?;
    Ok(next)
}

/// 사용자의 트래커 상태를 통째로 지웁니다.
pub async fn reset<K: KvStore>(
    store: &K,
    locks: &UserLocks,
    user_id: &str,
) -> Result<(), AppError> {
    let _guard = locks.acquire(user_id).await;
    store.remove(&state_key(user_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::kv::{MemoryKvStore, SqliteKvStore};
    use crate::models::{EventKind, TaskKind};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn apply(state: TrackerState, action: TrackerAction, id: &str) -> TrackerState {
        reduce(state, action, || id.to_string()).unwrap()
    }

    fn seeded() -> TrackerState {
        let state = apply(
            TrackerState::default(),
            TrackerAction::AddEvent {
                title: "Friday gig".into(),
                kind: EventKind::Gig,
                starts_at: Utc.with_ymd_and_hms(2026, 3, 13, 20, 0, 0).unwrap(),
                venue: Some("Blue Room".into()),
            },
            "e1",
        );
        let state = apply(
            state,
            TrackerAction::AddTask {
                title: "Run the setlist".into(),
                kind: TaskKind::Rehearsal,
                event_id: Some("e1".into()),
                due_date: None,
            },
            "t1",
        );
        apply(
            state,
            TrackerAction::AddTask {
                title: "Scales".into(),
                kind: TaskKind::Practice,
                event_id: None,
                due_date: NaiveDate::from_ymd_opt(2026, 3, 12),
            },
            "t2",
        )
    }

    #[test]
    fn deleting_event_unlinks_tasks() {
        let state = apply(seeded(), TrackerAction::DeleteEvent { id: "e1".into() }, "-");
        assert!(state.events.is_empty());
        assert_eq!(state.tasks.len(), 2);
        assert!(state.tasks.iter().all(|t| t.event_id.is_none()));
    }

    #[test]
    fn task_with_unknown_event_is_rejected() {
        let result = reduce(
            seeded(),
            TrackerAction::AddTask {
                title: "Soundcheck".into(),
                kind: TaskKind::Rehearsal,
                event_id: Some("nope".into()),
                due_date: None,
            },
            || "t3".into(),
        );
        assert_eq!(result, Err(TrackerError::UnknownEvent("nope".into())));
    }

    #[test]
    fn toggle_and_delete_task() {
        let state = apply(seeded(), TrackerAction::ToggleTask { id: "t2".into() }, "-");
        assert!(state.tasks.iter().find(|t| t.id == "t2").unwrap().done);

        let state = apply(state, TrackerAction::DeleteTask { id: "t2".into() }, "-");
        assert_eq!(state.tasks.len(), 1);

        let missing = reduce(state, TrackerAction::DeleteTask { id: "t2".into() }, || "-".into());
        assert_eq!(missing, Err(TrackerError::NotFound("Task", "t2".into())));
    }

    #[test]
    fn update_task_can_clear_event_link() {
        let state = apply(
            seeded(),
            TrackerAction::UpdateTask {
                id: "t1".into(),
                title: Some("  Full run  ".into()),
                event_id: Some(None),
                due_date: None,
            },
            "-",
        );
        let task = state.tasks.iter().find(|t| t.id == "t1").unwrap();
        assert_eq!(task.title, "Full run");
        assert_eq!(task.event_id, None);
    }

    #[test]
    fn events_stay_sorted_by_start() {
        let state = apply(
            seeded(),
            TrackerAction::AddEvent {
                title: "Tuesday rehearsal".into(),
                kind: EventKind::Rehearsal,
                starts_at: Utc.with_ymd_and_hms(2026, 3, 10, 19, 0, 0).unwrap(),
                venue: None,
            },
            "e2",
        );
        let ids: Vec<&str> = state.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e2", "e1"]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let result = reduce(
            TrackerState::default(),
            TrackerAction::AddTask {
                title: "   ".into(),
                kind: TaskKind::Practice,
                event_id: None,
                due_date: None,
            },
            || "t".into(),
        );
        assert_eq!(result, Err(TrackerError::EmptyTitle));
    }

    #[test]
    fn action_json_uses_type_tag() {
        let action: TrackerAction =
            serde_json::from_str(r#"{"type":"toggle_task","id":"t1"}"#).unwrap();
        assert_eq!(action, TrackerAction::ToggleTask { id: "t1".into() });
    }

    #[tokio::test]
    async fn dispatch_persists_between_calls() {
        let store = MemoryKvStore::default();
        let locks = UserLocks::new();
        let state = dispatch(
            &store,
            &locks,
            "u1",
            TrackerAction::AddTask {
                title: "Learn intro riff".into(),
                kind: TaskKind::Practice,
                event_id: None,
                due_date: None,
            },
        )
        .await
        .unwrap();
        let id = state.tasks[0].id.clone();

        dispatch(&store, &locks, "u1", TrackerAction::ToggleTask { id })
            .await
            .unwrap();

        let loaded = load_state(&store, "u1").await.unwrap();
        assert_eq!(loaded.tasks.len(), 1);
        assert!(loaded.tasks[0].done);
        assert_eq!(load_state(&store, "u2").await.unwrap(), TrackerState::default());

        reset(&store, &locks, "u1").await.unwrap();
        assert_eq!(load_state(&store, "u1").await.unwrap(), TrackerState::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatches_all_persist() {
        let store = Arc::new(SqliteKvStore::new(crate::db::test_pool().await));
        let locks = Arc::new(UserLocks::new());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                let locks = Arc::clone(&locks);
                tokio::spawn(async move {
                    dispatch(
                        store.as_ref(),
                        &locks,
                        "u1",
                        TrackerAction::AddTask {
                            title: format!("Practice {i}"),
                            kind: TaskKind::Practice,
                            event_id: None,
                            due_date: None,
                        },
                    )
                    .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let state = load_state(store.as_ref(), "u1").await.unwrap();
        assert_eq!(state.tasks.len(), 10);
    }
}
