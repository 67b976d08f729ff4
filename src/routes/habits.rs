//! # 습관 API 라우트 핸들러
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/habits | 습관 목록 (연속 일수, 오늘 체크 여부 포함) |
//! | POST | /api/habits | 습관 생성 |
//! | PATCH | /api/habits/{id} | 이름/설명 변경 |
//! | DELETE | /api/habits/{id} | 삭제 (체크 기록도 함께 삭제) |
//! | POST | /api/habits/{id}/check?date= | 체크 (기본 오늘) |
//! | DELETE | /api/habits/{id}/check?date= | 체크 취소 |
//!
//! 연속 일수는 출시 연속 일수와 같은 계산기를 씁니다.
//! 체크한 날 하나를 "출시 1회"로 봅니다.

use axum::extract::{Path, State};
use chrono::{NaiveDate, Utc};

use crate::{
    db,
    error::{AppError, FieldErrors},
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::*,
    response::{ApiResponse, Deleted},
    routes::AppState,
    services::streak::{compute_streak, ShipDay},
};

const MAX_NAME_LEN: usize = 100;

async fn habit_view(state: &AppState, habit: Habit, today: NaiveDate) -> Result<HabitView, AppError> {
    let days = db::list_habit_dates(&state.pool, &habit.id)
        .await?
        .iter()
        .map(|d| parse_date(d).map(|date| ShipDay::new(date, 1)))
        .collect::<Result<Vec<_>, _>>()?;

    let checked_today = days.iter().any(|d| d.date == today);
    Ok(HabitView {
        streak: compute_streak(&days, today),
        checked_today,
        habit,
    })
}

async fn load_owned_habit(state: &AppState, user: &AuthUser, id: &str) -> Result<Habit, AppError> {
    let habit = db::get_habit(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    user.ensure_owns(&habit.user_id)?;
    Ok(habit)
}

fn validate_name(errors: &mut FieldErrors, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        errors.add("name", "Name is required");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("Name must be at most {MAX_NAME_LEN} characters"));
    }
}

/// 체크 날짜 — 없으면 오늘, 미래 날짜는 422
fn check_date(query: &CheckQuery, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let date = query.date.unwrap_or(today);
    if date > today {
        return Err(AppError::invalid("date", "Date must not be in the future"));
    }
    Ok(date)
}

pub async fn list_habits(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<HabitView>>, AppError> {
    let today = Utc::now().date_naive();
    let habits = db::list_habits(&state.pool, &user.user_id).await?;

    let mut views = Vec::with_capacity(habits.len());
    for habit in habits {
        views.push(habit_view(&state, habit, today).await?);
    }
    Ok(ApiResponse::ok(views))
}

pub async fn create_habit(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateHabitRequest>,
) -> Result<ApiResponse<HabitView>, AppError> {
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, &req.name);
    errors.into_result()?;

    let habit = db::create_habit(&state.pool, &user.user_id, &req).await?;
    let view = habit_view(&state, habit, Utc::now().date_naive()).await?;
    Ok(ApiResponse::created(view))
}

pub async fn update_habit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateHabitRequest>,
) -> Result<ApiResponse<HabitView>, AppError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = req.name.as_deref() {
        validate_name(&mut errors, name);
    }
    errors.into_result()?;

    load_owned_habit(&state, &user, &id).await?;
    let habit = db::update_habit(&state.pool, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    let view = habit_view(&state, habit, Utc::now().date_naive()).await?;
    Ok(ApiResponse::ok(view))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    load_owned_habit(&state, &user, &id).await?;
    if !db::delete_habit(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::ok(Deleted::new(id)))
}

/// 같은 날 두 번 체크해도 기록은 하나입니다.
pub async fn check_habit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<CheckQuery>,
) -> Result<ApiResponse<HabitView>, AppError> {
    let today = Utc::now().date_naive();
    let date = check_date(&query, today)?;
    let habit = load_owned_habit(&state, &user, &id).await?;

    db::check_habit(&state.pool, &id, &format_date(date)).await?;
    Ok(ApiResponse::ok(habit_view(&state, habit, today).await?))
}

pub async fn uncheck_habit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<CheckQuery>,
) -> Result<ApiResponse<HabitView>, AppError> {
    let today = Utc::now().date_naive();
    let date = check_date(&query, today)?;
    let habit = load_owned_habit(&state, &user, &id).await?;

    db::uncheck_habit(&state.pool, &id, &format_date(date)).await?;
    Ok(ApiResponse::ok(habit_view(&state, habit, today).await?))
}
