use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    rsvp_mutations: AtomicU64,
    waitlisted: AtomicU64,
    promotions: AtomicU64,
    capacity_rejections: AtomicU64,
    notifications_sent: AtomicU64,
    notification_failures: AtomicU64,
}

impl Metrics {
    pub fn record_mutation(&self) {
        self.rsvp_mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_waitlisted(&self) {
        self.waitlisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notifications_sent(&self, count: usize) {
        self.notifications_sent
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_notification_failure(&self) {
        self.notification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn promotions(&self) -> u64 {
        self.promotions.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let mutations = self.rsvp_mutations.load(Ordering::Relaxed);
        let waitlisted = self.waitlisted.load(Ordering::Relaxed);
        let promotions = self.promotions.load(Ordering::Relaxed);
        let rejections = self.capacity_rejections.load(Ordering::Relaxed);
        let sent = self.notifications_sent.load(Ordering::Relaxed);
        let failures = self.notification_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE hearth_rsvp_mutations_total counter\n\
hearth_rsvp_mutations_total {}\n\
# TYPE hearth_waitlisted_total counter\n\
hearth_waitlisted_total {}\n\
# TYPE hearth_waitlist_promotions_total counter\n\
hearth_waitlist_promotions_total {}\n\
# TYPE hearth_capacity_rejections_total counter\n\
hearth_capacity_rejections_total {}\n\
# TYPE hearth_notifications_sent_total counter\n\
hearth_notifications_sent_total {}\n\
# TYPE hearth_notification_failures_total counter\n\
hearth_notification_failures_total {}\n",
            mutations, waitlisted, promotions, rejections, sent, failures
        )
    }
}
