//! # 세션 타이머
//!
//! 진행 중(ACTIVE)인 코딩 세션의 경과 시간을 1초 간격으로 올리고,
//! `sync_every` tick마다 저장소(`DurationSink`)에 경과 시간을 기록합니다.
//!
//! ## 수명 주기
//! ```text
//! start() ──▶ [tokio 작업: 1초마다 on_tick()] ──▶ stop() (토큰 취소 후 작업 종료까지 대기)
//!                      │
//!                      └─ sync_every tick마다 sink.persist() — 실패하면 경고 로그만 남김
//! ```
//!
//! 저장 실패는 세션을 멈추지 않습니다. 다음 동기화 차례에 최신 값으로 다시 기록됩니다.
//! `stop()`이 돌아온 뒤에는 이 타이머의 쓰기가 더 이상 일어나지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

const TICK: Duration = Duration::from_secs(1);

/// 경과 시간을 저장하는 대상
///
/// 서버에서는 `coding_sessions.duration_seconds`를 갱신하는 DB 구현을 씁니다.
pub trait DurationSink: Send + Sync + 'static {
    fn persist(
        &self,
        session_id: &str,
        elapsed_seconds: i64,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// 타이머 작업과 핸들이 함께 보는 카운터
#[derive(Debug)]
struct TickCounter {
    elapsed: AtomicI64,
    ticks: AtomicU64,
    sync_every: u64,
}

impl TickCounter {
    fn on_tick(&self) -> Option<i64> {
        let elapsed = self.elapsed.fetch_add(1, Ordering::SeqCst) + 1;
        let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        (ticks % self.sync_every == 0).then_some(elapsed)
    }
}

/// 세션 하나의 타이머
pub struct SessionTimer {
    session_id: String,
    counter: Arc<TickCounter>,
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// `initial_elapsed`: 이미 누적된 경과 시간 (일시정지 후 재개할 때 사용)
    pub fn new(session_id: impl Into<String>, initial_elapsed: i64, sync_every: u64) -> Self {
        Self {
            session_id: session_id.into(),
            counter: Arc::new(TickCounter {
                elapsed: AtomicI64::new(initial_elapsed.max(0)),
                ticks: AtomicU64::new(0),
                sync_every: sync_every.max(1),
            }),
            token: None,
            task: None,
        }
    }

    pub fn elapsed(&self) -> i64 {
        self.counter.elapsed.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// 1초가 지났을 때의 처리. 동기화할 차례이면 기록할 경과 시간을 돌려줍니다.
    pub fn on_tick(&self) -> Option<i64> {
        self.counter.on_tick()
    }

    /// 백그라운드 tick 작업을 시작합니다. 이미 실행 중이면 아무 일도 하지 않습니다.
    pub fn start<S: DurationSink>(&mut self, sink: Arc<S>) {
        if self.is_running() {
            return;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let counter = Arc::clone(&self.counter);
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            // interval()의 첫 tick은 즉시 발생하므로 1초 뒤부터 시작합니다.
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Some(elapsed) = counter.on_tick() {
                            if let Err(e) = sink.persist(&session_id, elapsed).await {
                                tracing::warn!(
                                    session_id = %session_id,
                                    elapsed,
                                    "Failed to sync session duration: {}",
                                    e
                                );
                            }
                        }
                    }
                }
            }
            tracing::debug!(session_id = %session_id, "Session timer stopped");
        });

        tracing::debug!(session_id = %self.session_id, "Session timer started");
        self.token = Some(token);
        self.task = Some(task);
    }

    /// 타이머를 멈추고 최종 경과 시간을 돌려줍니다.
    ///
    /// 진행 중이던 `sink.persist()`가 있으면 끝날 때까지 기다립니다.
    /// 그래서 호출자가 이어서 저장하는 값이 늦게 도착한 동기화에 덮이지 않습니다.
    pub async fn stop(&mut self) -> i64 {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(session_id = %self.session_id, "Session timer task failed: {}", e);
            }
        }
        self.elapsed()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

/// 실행 중인 세션 타이머 목록
///
/// 잠금은 `.await` 없이 짧게만 잡습니다. 타이머를 맵에서 꺼낸 뒤 잠금 밖에서 멈춥니다.
#[derive(Default)]
pub struct TimerRegistry {
    timers: Mutex<HashMap<String, SessionTimer>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionTimer>> {
        // 다른 스레드가 패닉했어도 맵 자체는 일관된 상태이므로 계속 사용합니다.
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 세션 타이머를 새로 시작합니다.
    ///
    /// 같은 세션의 기존 타이머는 취소만 하므로, 기존 값을 덮어쓸 때는 먼저 `stop()`을 기다립니다.
    pub fn start<S: DurationSink>(
        &self,
        session_id: &str,
        initial_elapsed: i64,
        sync_every: u64,
        sink: Arc<S>,
    ) {
        let mut timer = SessionTimer::new(session_id, initial_elapsed, sync_every);
        timer.start(sink);
        // 이전 타이머는 Drop에서 취소됩니다.
        self.lock().insert(session_id.to_string(), timer);
    }

    /// 타이머를 멈추고 제거합니다. 실행 중인 타이머가 없으면 None.
    pub async fn stop(&self, session_id: &str) -> Option<i64> {
        let timer = self.lock().remove(session_id);
        match timer {
            Some(mut timer) => Some(timer.stop().await),
            None => None,
        }
    }

    pub fn elapsed(&self, session_id: &str) -> Option<i64> {
        self.lock().get(session_id).map(SessionTimer::elapsed)
    }

    pub fn running_count(&self) -> usize {
        self.lock().len()
    }

    /// 서버 종료 시 모든 타이머를 멈추고 (세션 ID, 최종 경과 시간) 목록을 돌려줍니다.
    pub async fn stop_all(&self) -> Vec<(String, i64)> {
        let timers: Vec<(String, SessionTimer)> = self.lock().drain().collect();
        let mut stopped = Vec::with_capacity(timers.len());
        for (id, mut timer) in timers {
            let elapsed = timer.stop().await;
            stopped.push((id, elapsed));
        }
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, i64)>>,
    }

    impl DurationSink for RecordingSink {
        async fn persist(&self, session_id: &str, elapsed_seconds: i64) -> Result<(), AppError> {
            self.writes
                .lock()
                .unwrap()
                .push((session_id.to_string(), elapsed_seconds));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FailingSink {
        attempts: AtomicU64,
    }

    impl DurationSink for FailingSink {
        async fn persist(&self, _session_id: &str, _elapsed: i64) -> Result<(), AppError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Internal("network down".to_string()))
        }
    }

    /// 기록 전에 잠깐 멈추는 느린 저장소
    #[derive(Default)]
    struct SlowSink {
        writes: Mutex<Vec<i64>>,
    }

    impl DurationSink for SlowSink {
        async fn persist(&self, _session_id: &str, elapsed_seconds: i64) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_millis(800)).await;
            self.writes.lock().unwrap().push(elapsed_seconds);
            Ok(())
        }
    }

    #[test]
    fn on_tick_requests_sync_every_n_ticks() {
        let timer = SessionTimer::new("s1", 100, 3);
        assert_eq!(timer.on_tick(), None);
        assert_eq!(timer.on_tick(), None);
        assert_eq!(timer.on_tick(), Some(103));
        assert_eq!(timer.elapsed(), 103);
    }

    #[tokio::test(start_paused = true)]
    async fn syncs_every_sixty_seconds() {
        let sink = Arc::new(RecordingSink::default());
        let mut timer = SessionTimer::new("s1", 0, 60);
        timer.start(Arc::clone(&sink));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(125_500)).await;
        let elapsed = timer.stop().await;

        assert_eq!(elapsed, 125);
        assert!(!timer.is_running());
        let writes = sink.writes.lock().unwrap().clone();
        assert_eq!(writes, vec![("s1".to_string(), 60), ("s1".to_string(), 120)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_counting() {
        let sink = Arc::new(RecordingSink::default());
        let mut timer = SessionTimer::new("s1", 0, 60);
        timer.start(sink);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let stopped_at = timer.stop().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(stopped_at, 10);
        assert_eq!(timer.elapsed(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_sync_keeps_session_running() {
        let sink = Arc::new(FailingSink::default());
        let mut timer = SessionTimer::new("s1", 0, 60);
        timer.start(Arc::clone(&sink));

        tokio::time::sleep(Duration::from_millis(130_500)).await;

        assert!(timer.is_running());
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(timer.stop().await, 130);
    }

    #[tokio::test(start_paused = true)]
    async fn registry_resumes_from_initial_elapsed() {
        let registry = TimerRegistry::new();
        let sink = Arc::new(RecordingSink::default());

        registry.start("s1", 300, 60, Arc::clone(&sink));
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(registry.elapsed("s1"), Some(305));

        assert_eq!(registry.stop("s1").await, Some(305));
        assert_eq!(registry.stop("s1").await, None);
        assert_eq!(registry.running_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_reports_final_elapsed() {
        let registry = TimerRegistry::new();
        let sink = Arc::new(RecordingSink::default());
        registry.start("a", 0, 60, Arc::clone(&sink));
        registry.start("b", 100, 60, Arc::clone(&sink));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let mut stopped = registry.stop_all().await;
        stopped.sort();

        assert_eq!(stopped, vec![("a".to_string(), 3), ("b".to_string(), 103)]);
        assert_eq!(registry.running_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_in_flight_sync() {
        let sink = Arc::new(SlowSink::default());
        let mut timer = SessionTimer::new("s1", 0, 60);
        timer.start(Arc::clone(&sink));

        // 60초 동기화가 저장소 안에서 기다리는 중에 멈춥니다.
        tokio::time::sleep(Duration::from_millis(60_300)).await;
        let elapsed = timer.stop().await;

        assert_eq!(elapsed, 60);
        let at_stop = sink.writes.lock().unwrap().clone();
        assert_eq!(at_stop, vec![60]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*sink.writes.lock().unwrap(), at_stop);
    }
}
