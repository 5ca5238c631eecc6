//! Daily broadcast scheduler.
//!
//! One tokio task per job; each task sleeps until the next local occurrence
//! of its time-of-day in the configured timezone, resolves its payload at
//! fire time, and delivers it through the channel.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use prorab_core::{
    catalog, config::ScheduleConfig, error::ProrabError, message::OutgoingMessage, traits::Channel,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// What a scheduled job broadcasts when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Morning,
    Night,
    Random,
}

impl BroadcastKind {
    /// Resolve the payload. Random picks a fresh filler message on every
    /// firing, never a value captured at registration time.
    fn resolve(&self) -> &'static str {
        match self {
            Self::Morning => catalog::MORNING,
            Self::Night => catalog::NIGHT,
            Self::Random => catalog::random_filler(),
        }
    }
}

/// Daily broadcast scheduler. Holds the sending capability explicitly;
/// timer tasks never reach for global state.
pub struct Scheduler {
    channel: Arc<dyn Channel>,
    config: ScheduleConfig,
    jobs: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(channel: Arc<dyn Channel>, config: ScheduleConfig) -> Self {
        Self {
            channel,
            config,
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// The (time-of-day, payload kind) table derived from config.
    fn job_table(&self) -> Result<Vec<(NaiveTime, BroadcastKind)>, ProrabError> {
        let mut table = vec![
            (self.config.morning_time()?, BroadcastKind::Morning),
            (self.config.night_time()?, BroadcastKind::Night),
        ];
        for &hour in &self.config.random_hours {
            let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| {
                ProrabError::Config(format!("invalid broadcast hour {hour} in schedule"))
            })?;
            table.push((time, BroadcastKind::Random));
        }
        Ok(table)
    }

    /// Register the daily jobs for `chat_id`, cancelling any previously
    /// registered set first. Invoking this twice leaves exactly one set of
    /// daily triggers. Returns the number of jobs registered.
    pub async fn register(&self, chat_id: &str) -> Result<usize, ProrabError> {
        if chat_id.is_empty() {
            return Err(ProrabError::Config("CHAT_ID is not set".into()));
        }
        let tz = self.config.tz()?;
        let table = self.job_table()?;

        let mut jobs = self.jobs.lock().await;
        for handle in jobs.drain(..) {
            handle.abort();
        }

        for (time, kind) in table {
            let channel = self.channel.clone();
            let chat = chat_id.to_string();
            jobs.push(tokio::spawn(async move {
                loop {
                    let fire_at = next_fire(Utc::now().with_timezone(&tz), time);
                    let wait = (fire_at - Utc::now().with_timezone(&tz))
                        .to_std()
                        .unwrap_or_default();
                    tokio::time::sleep(wait).await;

                    let msg = OutgoingMessage::text(&chat, kind.resolve());
                    if let Err(e) = channel.send(msg).await {
                        error!("broadcast {kind:?} delivery failed: {e}");
                    } else {
                        info!("broadcast {kind:?} delivered to {chat}");
                    }
                }
            }));
        }

        info!(
            "registered {} daily broadcasts for chat {chat_id} ({})",
            jobs.len(),
            self.config.timezone
        );
        Ok(jobs.len())
    }

    /// Whether a job set is currently registered.
    pub async fn is_registered(&self) -> bool {
        !self.jobs.lock().await.is_empty()
    }

    /// Abort all registered jobs.
    pub async fn cancel_all(&self) {
        let mut jobs = self.jobs.lock().await;
        for handle in jobs.drain(..) {
            handle.abort();
        }
    }
}

/// Next occurrence of `at` strictly after `now`, in `now`'s timezone.
/// Skips forward a day when the local time does not exist (DST gap).
fn next_fire(now: DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    now + chrono::Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prorab_core::message::IncomingMessage;

    struct NullChannel;

    #[async_trait]
    impl Channel for NullChannel {
        fn name(&self) -> &str {
            "null"
        }

        async fn start(
            &self,
        ) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, ProrabError> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }

        async fn send(&self, _message: OutgoingMessage) -> Result<Option<i64>, ProrabError> {
            Ok(None)
        }

        async fn stop(&self) -> Result<(), ProrabError> {
            Ok(())
        }
    }

    fn moscow(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Moscow
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_next_fire_later_today() {
        let now = moscow(2025, 3, 10, 7, 0);
        let at = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let fire = next_fire(now, at);
        assert_eq!(fire, moscow(2025, 3, 10, 8, 0));
    }

    #[test]
    fn test_next_fire_time_already_past_rolls_to_tomorrow() {
        let now = moscow(2025, 3, 10, 9, 30);
        let at = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let fire = next_fire(now, at);
        assert_eq!(fire, moscow(2025, 3, 11, 8, 0));
    }

    #[test]
    fn test_next_fire_exact_boundary_rolls_forward() {
        let now = moscow(2025, 3, 10, 8, 0);
        let at = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        // Strictly after: firing at 08:00:00 schedules the next day.
        assert_eq!(next_fire(now, at), moscow(2025, 3, 11, 8, 0));
    }

    #[test]
    fn test_job_table_covers_all_slots() {
        let scheduler = Scheduler::new(Arc::new(NullChannel), ScheduleConfig::default());
        let table = scheduler.job_table().unwrap();
        // Morning, night, and six random slots.
        assert_eq!(table.len(), 8);
        assert_eq!(
            table
                .iter()
                .filter(|(_, k)| *k == BroadcastKind::Random)
                .count(),
            6
        );
    }

    #[test]
    fn test_job_table_rejects_bad_hour() {
        let config = ScheduleConfig {
            random_hours: vec![25],
            ..Default::default()
        };
        let scheduler = Scheduler::new(Arc::new(NullChannel), config);
        assert!(scheduler.job_table().is_err());
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let scheduler = Scheduler::new(Arc::new(NullChannel), ScheduleConfig::default());
        let first = scheduler.register("-100500").await.unwrap();
        let second = scheduler.register("-100500").await.unwrap();
        // Re-registration replaces the job set instead of stacking a second one.
        assert_eq!(first, second);
        assert_eq!(scheduler.jobs.lock().await.len(), first);
        assert!(scheduler.is_registered().await);

        scheduler.cancel_all().await;
        assert!(!scheduler.is_registered().await);
    }

    #[tokio::test]
    async fn test_register_requires_chat_id() {
        let scheduler = Scheduler::new(Arc::new(NullChannel), ScheduleConfig::default());
        let err = scheduler.register("").await.unwrap_err();
        assert!(matches!(err, ProrabError::Config(_)));
        assert!(!scheduler.is_registered().await);
    }

    #[test]
    fn test_broadcast_payloads() {
        assert_eq!(BroadcastKind::Morning.resolve(), catalog::MORNING);
        assert_eq!(BroadcastKind::Night.resolve(), catalog::NIGHT);
        assert!(catalog::FILLER.contains(&BroadcastKind::Random.resolve()));
    }
}
