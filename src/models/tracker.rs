//! # 뮤지션 트래커 모델
//!
//! 합주(rehearsal)·공연(gig) 일정과, 그 일정에 딸린 합주/연습 할 일을 담습니다.
//! 전체 상태는 하나의 JSON 값으로 KV 저장소(`tracker:{user_id}`)에 저장됩니다.
//!
//! 할 일은 `event_id`로 일정에 연결될 수 있고, 일정이 삭제되면
//! 연결만 끊어지고 할 일 자체는 남습니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::double_option;
use crate::services::filter::Searchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Rehearsal,
    Gig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Rehearsal,
    Practice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    pub starts_at: DateTime<Utc>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerTask {
    pub id: String,
    pub title: String,
    pub kind: TaskKind,
    pub event_id: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub due_date: Option<NaiveDate>,
}

impl Searchable for TrackerTask {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

/// 트래커 전체 상태
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    pub events: Vec<TrackerEvent>,
    #[serde(default)]
    pub tasks: Vec<TrackerTask>,
}

/// 트래커 상태를 바꾸는 동작 — `POST /api/tracker/actions`의 본문
///
/// ```json
/// { "type": "add_task", "title": "Scales", "kind": "PRACTICE" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerAction {
    AddEvent {
        title: String,
        kind: EventKind,
        starts_at: DateTime<Utc>,
        venue: Option<String>,
    },
    UpdateEvent {
        id: String,
        title: Option<String>,
        starts_at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "double_option")]
        venue: Option<Option<String>>,
    },
    DeleteEvent {
        id: String,
    },
    AddTask {
        title: String,
        kind: TaskKind,
        event_id: Option<String>,
        due_date: Option<NaiveDate>,
    },
    UpdateTask {
        id: String,
        title: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        event_id: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        due_date: Option<Option<NaiveDate>>,
    },
    ToggleTask {
        id: String,
    },
    DeleteTask {
        id: String,
    },
}

/// `GET /api/tracker?q=scales`
#[derive(Debug, Default, Deserialize)]
pub struct TrackerQuery {
    pub q: Option<String>,
}
