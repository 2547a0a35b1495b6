//! Structured request/response events.
//!
//! The client reports to an `Observer` at three points: a request is about
//! to be sent, a response has been classified, and an error is about to be
//! returned. `TracingObserver` forwards to `tracing`; `RecordingObserver`
//! keeps events in memory so callers can assert on them.

use std::sync::{Mutex, PoisonError};

use crate::http::HttpMethod;

/// One observable point in a request's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RequestIssued {
        method: HttpMethod,
        endpoint: String,
        url: String,
        has_body: bool,
    },
    ResponseClassified {
        method: HttpMethod,
        endpoint: String,
        status: u16,
    },
    ErrorProduced {
        endpoint: String,
        error: String,
    },
}

pub trait Observer: Send + Sync {
    fn observe(&self, event: &Event);
}

/// Forwards events to `tracing` at debug level, errors at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &Event) {
        match event {
            Event::RequestIssued {
                method,
                endpoint,
                url,
                has_body,
            } => tracing::debug!(%method, %endpoint, %url, has_body, "sending request"),
            Event::ResponseClassified {
                method,
                endpoint,
                status,
            } => tracing::debug!(%method, %endpoint, status, "response received"),
            Event::ErrorProduced { endpoint, error } => {
                tracing::warn!(%endpoint, %error, "request failed")
            }
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.observe(&Event::ErrorProduced {
            endpoint: "a".into(),
            error: "first".into(),
        });
        observer.observe(&Event::ResponseClassified {
            method: HttpMethod::Get,
            endpoint: "b".into(),
            status: 200,
        });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::ErrorProduced { error, .. } if error == "first"));
        assert!(matches!(&events[1], Event::ResponseClassified { status: 200, .. }));
    }
}
