// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event reporting pipeline.
//!
//! Transitions from the region provider are turned into durable queued
//! reports and sent to the backend in debounced batches. A round that
//! fails leaves the queue untouched; a successful response drives id
//! reconciliation, campaign lifecycle updates, and the published
//! "events reported" notification.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use geomon_core::traits::{GeoStore, ReportTransport, TransitionSink};
use geomon_core::types::{
    EventReportBody, EventReportEntry, EventReportResponse, GeoReport, Message, MessagePayload,
    RegionTransition, SdkEvent,
};
use geomon_core::GeomonError;

use crate::batcher::Batcher;
use crate::seen::SeenReporter;

#[derive(Clone)]
pub struct GeoReporter {
    store: Arc<dyn GeoStore>,
    transport: Arc<dyn ReportTransport>,
    batcher: Arc<Batcher>,
    /// Guards against overlapping report rounds.
    sending: Arc<AtomicBool>,
    events: broadcast::Sender<SdkEvent>,
    seen: SeenReporter,
}

impl GeoReporter {
    pub fn new(
        store: Arc<dyn GeoStore>,
        transport: Arc<dyn ReportTransport>,
        events: broadcast::Sender<SdkEvent>,
        batch_delay: Duration,
    ) -> Self {
        let seen = SeenReporter::new(
            Arc::clone(&store),
            Arc::clone(&transport),
            events.clone(),
            batch_delay,
        );
        Self {
            store,
            transport,
            batcher: Arc::new(Batcher::new(batch_delay)),
            sending: Arc::new(AtomicBool::new(false)),
            events,
            seen,
        }
    }

    pub fn seen_reporter(&self) -> &SeenReporter {
        &self.seen
    }

    /// Appends a report to the durable queue and schedules a batch send.
    pub async fn record_event(&self, report: GeoReport) -> Result<(), GeomonError> {
        self.store.add_unreported_events(&[report]).await?;
        self.schedule_report();
        Ok(())
    }

    fn schedule_report(&self) {
        let this = self.clone();
        self.batcher.submit(async move {
            this.report().await;
        });
    }

    /// Runs one report round. Never propagates errors: a failed round is
    /// logged and the queue is left intact for the next trigger.
    pub async fn report(&self) {
        if self.sending.swap(true, Ordering::SeqCst) {
            debug!("report round already in flight");
            return;
        }
        // Clears the flag even if the round future is dropped mid-send;
        // a stuck flag would silently stop all future rounds.
        let _guard = SendingGuard(Arc::clone(&self.sending));
        if let Err(error) = self.run_round().await {
            warn!(%error, "report round failed; unreported events retained");
        }
    }

    async fn run_round(&self) -> Result<(), GeomonError> {
        let snapshot = self.store.unreported_events().await?;
        if snapshot.is_empty() {
            debug!("no unreported events");
            return Ok(());
        }
        let body = build_batch(&snapshot);
        let response = self.transport.send_event_reports(&body).await?;
        info!(reports = snapshot.len(), "event report batch accepted");
        self.apply_response(snapshot, response).await
    }

    async fn apply_response(
        &self,
        snapshot: Vec<GeoReport>,
        response: EventReportResponse,
    ) -> Result<(), GeomonError> {
        if !response.finished_campaign_ids.is_empty() {
            self.store
                .add_finished_campaign_ids(&response.finished_campaign_ids)
                .await?;
        }
        if !response.suspended_campaign_ids.is_empty() {
            self.store
                .add_suspended_campaign_ids(&response.suspended_campaign_ids)
                .await?;
        }

        if !response.message_ids.is_empty() {
            self.store.update_message_ids(&response.message_ids).await?;
        }

        // Reports for campaigns the backend has since finished or suspended
        // are still acknowledged (removed from the queue) but left out of
        // the published notification.
        let finished = self.store.finished_campaign_ids().await?;
        let suspended = self.store.suspended_campaign_ids().await?;
        let reported: Vec<GeoReport> = snapshot
            .iter()
            .filter(|r| {
                !finished.contains(&r.campaign_id) && !suspended.contains(&r.campaign_id)
            })
            .cloned()
            .collect();

        let sent_ids: Vec<String> = snapshot.iter().map(|r| r.message_id.clone()).collect();
        self.store.remove_unreported_events(&sent_ids).await?;

        if !reported.is_empty() {
            let _ = self.events.send(SdkEvent::EventsReported(reported));
        }

        self.seen
            .on_reports_confirmed(&snapshot, &response.message_ids)
            .await;
        if self.store.unreported_events().await?.is_empty() {
            self.seen.flush().await;
        }
        Ok(())
    }

    /// Matches a transition against stored signaling messages and queues one
    /// report per triggered campaign, each carrying a freshly generated
    /// message the notification layer can display.
    async fn process_transition(&self, transition: &RegionTransition) -> Result<(), GeomonError> {
        let finished = self.store.finished_campaign_ids().await?;
        let suspended = self.store.suspended_campaign_ids().await?;
        let messages = self.store.find_all_messages().await?;

        let mut generated = Vec::new();
        let mut reports = Vec::new();
        for message in &messages {
            let Some(geo) = &message.geo else { continue };
            let Some(area) = geo
                .areas
                .iter()
                .find(|a| a.is_valid() && a.id == transition.area_id)
            else {
                continue;
            };
            if suspended.contains(&geo.campaign_id) {
                continue;
            }
            if !geo.is_eligible(&finished, transition.occurred_at)
                || geo.is_expired(transition.occurred_at)
            {
                continue;
            }
            if !geo.triggers_on(transition.event) {
                continue;
            }

            let sdk_message_id = Uuid::new_v4().to_string();
            generated.push(Message {
                id: sdk_message_id.clone(),
                body: message.body.clone(),
                geo: Some(geo.clone()),
                created_at: transition.occurred_at,
            });
            reports.push(GeoReport {
                campaign_id: geo.campaign_id.clone(),
                message_id: sdk_message_id,
                signaling_message_id: message.id.clone(),
                event: transition.event,
                area: area.clone(),
                occurred_at: transition.occurred_at,
                location: transition.location,
            });
        }

        if reports.is_empty() {
            debug!(area_id = %transition.area_id, event = %transition.event, "transition matched no campaign");
            return Ok(());
        }
        info!(
            area_id = %transition.area_id,
            event = %transition.event,
            campaigns = reports.len(),
            "queueing geofence event reports"
        );
        self.store.save_messages(&generated).await?;
        self.store.add_unreported_events(&reports).await?;
        self.schedule_report();
        Ok(())
    }
}

struct SendingGuard(Arc<AtomicBool>);

impl Drop for SendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransitionSink for GeoReporter {
    async fn handle_transition(&self, transition: RegionTransition) -> Result<(), GeomonError> {
        self.process_transition(&transition).await
    }
}

/// Builds the wire batch: one payload entry per distinct signaling message
/// (first-seen order) and one report entry per queued event, each with its
/// own occurred-minus-now timestamp delta.
fn build_batch(snapshot: &[GeoReport]) -> EventReportBody {
    let now_ms = Utc::now().timestamp_millis();
    let mut messages: Vec<MessagePayload> = Vec::new();
    for report in snapshot {
        if !messages
            .iter()
            .any(|m| m.message_id == report.signaling_message_id)
        {
            messages.push(MessagePayload {
                message_id: report.signaling_message_id.clone(),
            });
        }
    }
    let reports = snapshot
        .iter()
        .map(|report| EventReportEntry {
            event: report.event,
            geo_area_id: report.area.id.clone(),
            message_id: report.signaling_message_id.clone(),
            sdk_message_id: report.message_id.clone(),
            campaign_id: report.campaign_id.clone(),
            timestamp_delta: report.occurred_at.timestamp_millis() - now_ms,
        })
        .collect();
    EventReportBody { messages, reports }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};

    use chrono::{TimeZone, Utc};
    use tokio::sync::Mutex;

    use geomon_config::model::StorageConfig;
    use geomon_core::types::{Area, Geo, GeoEventType, GeoLatLng, SeenReportBody, TriggerSetting};
    use geomon_storage::SqliteStore;

    struct MockTransport {
        fail: AtomicBool,
        send_delay: Mutex<Duration>,
        response: Mutex<EventReportResponse>,
        event_bodies: Mutex<Vec<EventReportBody>>,
        seen_bodies: Mutex<Vec<SeenReportBody>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                send_delay: Mutex::new(Duration::ZERO),
                response: Mutex::new(EventReportResponse::default()),
                event_bodies: Mutex::new(Vec::new()),
                seen_bodies: Mutex::new(Vec::new()),
            }
        }

        async fn set_response(&self, response: EventReportResponse) {
            *self.response.lock().await = response;
        }
    }

    #[async_trait]
    impl ReportTransport for MockTransport {
        async fn send_event_reports(
            &self,
            body: &EventReportBody,
        ) -> Result<EventReportResponse, GeomonError> {
            let delay = *self.send_delay.lock().await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(GeomonError::Transport {
                    message: "service unavailable".into(),
                    source: None,
                });
            }
            self.event_bodies.lock().await.push(body.clone());
            Ok(self.response.lock().await.clone())
        }

        async fn send_seen_reports(&self, body: &SeenReportBody) -> Result<(), GeomonError> {
            self.seen_bodies.lock().await.push(body.clone());
            Ok(())
        }
    }

    async fn temp_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
        let config = StorageConfig {
            database_path: dir
                .path()
                .join("geomon.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::new(config);
        store.initialize().await.unwrap();
        Arc::new(store)
    }

    fn area(id: &str) -> Area {
        Area {
            id: id.into(),
            title: Some("office".into()),
            latitude: 52.52,
            longitude: 13.405,
            radius: 200,
        }
    }

    fn signaling_message(id: &str, campaign_id: &str, area_id: &str) -> Message {
        Message {
            id: id.into(),
            body: Some("welcome".into()),
            geo: Some(Geo {
                campaign_id: campaign_id.into(),
                start: None,
                expiry: None,
                areas: vec![area(area_id)],
                triggers: vec![TriggerSetting {
                    event: GeoEventType::Entry,
                    dwell_minutes: None,
                }],
            }),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn queued_report(message_id: &str, campaign_id: &str, occurred_at: chrono::DateTime<Utc>) -> GeoReport {
        GeoReport {
            campaign_id: campaign_id.into(),
            message_id: message_id.into(),
            signaling_message_id: "signal-1".into(),
            event: GeoEventType::Entry,
            area: area("area-1"),
            occurred_at,
            location: GeoLatLng {
                latitude: 52.52,
                longitude: 13.405,
            },
        }
    }

    fn reporter(
        store: Arc<SqliteStore>,
        transport: Arc<MockTransport>,
    ) -> (GeoReporter, broadcast::Receiver<SdkEvent>) {
        let (events, rx) = broadcast::channel(16);
        let reporter = GeoReporter::new(store, transport, events, Duration::from_millis(10));
        (reporter, rx)
    }

    #[tokio::test]
    async fn empty_queue_sends_nothing_and_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let transport = Arc::new(MockTransport::new());
        let (reporter, mut rx) = reporter(store, transport.clone());

        reporter.report().await;

        assert!(transport.event_bodies.lock().await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_round_retains_the_queue_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let now = Utc::now();
        let queued = vec![
            queued_report("sdk-1", "campaign-1", now),
            queued_report("sdk-2", "campaign-2", now),
        ];
        store.add_unreported_events(&queued).await.unwrap();

        let transport = Arc::new(MockTransport::new());
        transport.fail.store(true, Ordering::SeqCst);
        let (reporter, mut rx) = reporter(store.clone(), transport);

        reporter.report().await;

        let remaining: HashSet<String> = store
            .unreported_events()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.message_id)
            .collect();
        assert_eq!(
            remaining,
            HashSet::from(["sdk-1".to_owned(), "sdk-2".to_owned()])
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_round_renames_removes_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let message = signaling_message("signal-1", "campaign-1", "area-1");
        let generated = Message {
            id: "sdk-1".into(),
            ..message.clone()
        };
        store
            .save_messages(&[message, generated])
            .await
            .unwrap();
        let now = Utc::now();
        store
            .add_unreported_events(&[queued_report("sdk-1", "campaign-1", now)])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        transport
            .set_response(EventReportResponse {
                message_ids: HashMap::from([("sdk-1".to_owned(), "server-1".to_owned())]),
                ..Default::default()
            })
            .await;
        let (reporter, mut rx) = reporter(store.clone(), transport.clone());

        reporter.report().await;

        // Queue drained, generated message renamed to its canonical id.
        assert!(store.unreported_events().await.unwrap().is_empty());
        let ids: HashSet<String> = store
            .find_all_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(
            ids,
            HashSet::from(["signal-1".to_owned(), "server-1".to_owned()])
        );

        match rx.try_recv().unwrap() {
            SdkEvent::EventsReported(reports) => {
                assert_eq!(reports.len(), 1);
                assert_eq!(reports[0].message_id, "sdk-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn suspended_campaign_reports_are_removed_but_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let now = Utc::now();
        store
            .add_unreported_events(&[
                queued_report("sdk-1", "campaign-c", now),
                queued_report("sdk-2", "campaign-c", now + chrono::Duration::seconds(1)),
                queued_report("sdk-3", "campaign-c", now + chrono::Duration::seconds(2)),
            ])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        transport
            .set_response(EventReportResponse {
                suspended_campaign_ids: vec!["campaign-c".to_owned()],
                ..Default::default()
            })
            .await;
        let (reporter, mut rx) = reporter(store.clone(), transport);

        reporter.report().await;

        assert!(store.unreported_events().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(
            store
                .suspended_campaign_ids()
                .await
                .unwrap()
                .contains("campaign-c")
        );
    }

    #[tokio::test]
    async fn finished_campaign_reports_are_removed_but_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let now = Utc::now();
        store
            .add_unreported_events(&[
                queued_report("sdk-1", "campaign-done", now),
                queued_report("sdk-2", "campaign-live", now),
            ])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        transport
            .set_response(EventReportResponse {
                finished_campaign_ids: vec!["campaign-done".to_owned()],
                ..Default::default()
            })
            .await;
        let (reporter, mut rx) = reporter(store.clone(), transport);

        reporter.report().await;

        assert!(store.unreported_events().await.unwrap().is_empty());
        match rx.try_recv().unwrap() {
            SdkEvent::EventsReported(reports) => {
                assert_eq!(reports.len(), 1);
                assert_eq!(reports[0].campaign_id, "campaign-live");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_carries_pairwise_distinct_deltas_for_distinct_timestamps() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let snapshot = vec![
            queued_report("sdk-1", "campaign-1", base),
            queued_report("sdk-2", "campaign-1", base + chrono::Duration::milliseconds(250)),
            queued_report("sdk-3", "campaign-1", base + chrono::Duration::milliseconds(500)),
        ];

        let body = build_batch(&snapshot);

        assert_eq!(body.reports.len(), 3);
        let deltas: HashSet<i64> = body.reports.iter().map(|r| r.timestamp_delta).collect();
        assert_eq!(deltas.len(), 3);
        // One payload entry per distinct signaling message.
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].message_id, "signal-1");
    }

    #[tokio::test]
    async fn event_recorded_during_a_slow_round_does_not_stall_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        let transport = Arc::new(MockTransport::new());
        *transport.send_delay.lock().await = Duration::from_millis(300);
        let (reporter, mut rx) = reporter(store.clone(), transport.clone());

        let now = Utc::now();
        reporter
            .record_event(queued_report("sdk-1", "campaign-1", now))
            .await
            .unwrap();

        // First round is mid-send when the second event lands.
        tokio::time::sleep(Duration::from_millis(100)).await;
        reporter
            .record_event(queued_report("sdk-2", "campaign-1", now))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        // The in-flight round completed and published its report; the
        // second event is still queued, not lost.
        assert_eq!(transport.event_bodies.lock().await.len(), 1);
        match rx.try_recv().unwrap() {
            SdkEvent::EventsReported(reports) => {
                assert_eq!(reports.len(), 1);
                assert_eq!(reports[0].message_id, "sdk-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        let remaining = store.unreported_events().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message_id, "sdk-2");

        // A later round drains the leftover event.
        reporter.report().await;
        assert!(store.unreported_events().await.unwrap().is_empty());
        match rx.try_recv().unwrap() {
            SdkEvent::EventsReported(reports) => {
                assert_eq!(reports[0].message_id, "sdk-2");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transition_generates_message_and_queues_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        store
            .save_messages(&[signaling_message("signal-1", "campaign-1", "area-1")])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        transport.fail.store(true, Ordering::SeqCst);
        let (reporter, _rx) = reporter(store.clone(), transport);

        reporter
            .handle_transition(RegionTransition {
                area_id: "area-1".into(),
                event: GeoEventType::Entry,
                occurred_at: Utc::now(),
                location: GeoLatLng {
                    latitude: 52.52,
                    longitude: 13.405,
                },
            })
            .await
            .unwrap();

        let queued = store.unreported_events().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].campaign_id, "campaign-1");
        assert_eq!(queued[0].signaling_message_id, "signal-1");
        assert_eq!(queued[0].area.id, "area-1");

        // A displayable copy of the signaling message was stored under the
        // report's SDK message id.
        let messages = store.find_all_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.id == queued[0].message_id));
    }

    #[tokio::test]
    async fn transition_for_suspended_campaign_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        store
            .save_messages(&[signaling_message("signal-1", "campaign-1", "area-1")])
            .await
            .unwrap();
        store
            .add_suspended_campaign_ids(&["campaign-1".to_owned()])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        let (reporter, _rx) = reporter(store.clone(), transport);

        reporter
            .handle_transition(RegionTransition {
                area_id: "area-1".into(),
                event: GeoEventType::Entry,
                occurred_at: Utc::now(),
                location: GeoLatLng {
                    latitude: 52.52,
                    longitude: 13.405,
                },
            })
            .await
            .unwrap();

        assert!(store.unreported_events().await.unwrap().is_empty());
        assert_eq!(store.find_all_messages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transition_for_untriggered_event_type_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        store
            .save_messages(&[signaling_message("signal-1", "campaign-1", "area-1")])
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        let (reporter, _rx) = reporter(store.clone(), transport);

        reporter
            .handle_transition(RegionTransition {
                area_id: "area-1".into(),
                event: GeoEventType::Exit,
                occurred_at: Utc::now(),
                location: GeoLatLng {
                    latitude: 52.52,
                    longitude: 13.405,
                },
            })
            .await
            .unwrap();

        assert!(store.unreported_events().await.unwrap().is_empty());
    }
}
