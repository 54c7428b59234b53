use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    messages_total: AtomicU64,
    itineraries_total: AtomicU64,
    follow_ups_total: AtomicU64,
    user_errors_total: AtomicU64,
    hotel_fallback_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub messages_total: u64,
    pub itineraries_total: u64,
    pub follow_ups_total: u64,
    pub user_errors_total: u64,
    pub hotel_fallback_total: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_message(&self) {
        self.messages_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_itinerary(&self) {
        self.itineraries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_follow_up(&self) {
        self.follow_ups_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_user_error(&self) {
        self.user_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_hotel_fallback(&self) {
        self.hotel_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_total: self.messages_total.load(Ordering::Relaxed),
            itineraries_total: self.itineraries_total.load(Ordering::Relaxed),
            follow_ups_total: self.follow_ups_total.load(Ordering::Relaxed),
            user_errors_total: self.user_errors_total.load(Ordering::Relaxed),
            hotel_fallback_total: self.hotel_fallback_total.load(Ordering::Relaxed),
        }
    }
}

/// JSON logs on stderr; stdout belongs to the conversation.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=warn,voyage_agents=warn,voyage_storage=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
