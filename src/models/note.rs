//! # 노트 모델
//!
//! 개발 중 메모를 남기는 간단한 노트입니다. 프로젝트에 연결할 수 있으며,
//! 프로젝트가 삭제되면 `project_id`만 NULL이 되고 노트는 남습니다.

use serde::{Deserialize, Serialize};

use crate::models::double_option;
use crate::services::filter::Searchable;

/// `notes` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub content: String,
    /// SQLite에는 BOOLEAN이 없어 INTEGER 0/1로 저장되지만, sqlx가 bool로 변환합니다.
    pub pinned: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Searchable for Note {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.content.as_str()]
    }
}

/// `POST /api/notes`
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub project_id: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

/// `PATCH /api/notes/{id}` — 포함된 필드만 바뀝니다.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub pinned: Option<bool>,
    /// 필드 없음 = 그대로, null = 프로젝트 연결 해제, 문자열 = 해당 프로젝트로 이동
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<String>>,
}

/// `GET /api/notes?q=검색어&project_id=...`
#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    pub q: Option<String>,
    pub project_id: Option<String>,
}
