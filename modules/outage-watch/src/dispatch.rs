use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use pge_outage_client::TIMESTAMP_FORMAT;
use tracing::{debug, info};

use crate::journal::{Journal, LogLevel};
use crate::matcher::{evaluate, SearchTerm};
use crate::notify::{Notification, NotifyBackend};
use crate::types::{Address, OutageRecord};

pub const SUBJECT: &str = "Powiadomienie o wylaczeniu pradu";

const NONE_LABEL: &str = "(brak)";

/// What happened to one tick's record list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Records run through the matcher before stopping.
    pub evaluated: usize,
    /// Index of the record a notification was attempted for.
    pub notified: Option<usize>,
    /// Whether the backend accepted the notification.
    pub delivered: bool,
}

/// Turns matched records into at most one notification per tick.
pub struct Dispatcher {
    notifier: Arc<dyn NotifyBackend>,
    journal: Arc<dyn Journal>,
    street_name: String,
    city_name: String,
}

impl Dispatcher {
    pub fn new(
        notifier: Arc<dyn NotifyBackend>,
        journal: Arc<dyn Journal>,
        street_name: &str,
        city_name: &str,
    ) -> Self {
        Self {
            notifier,
            journal,
            street_name: street_name.trim().to_string(),
            city_name: city_name.trim().to_string(),
        }
    }

    /// Scan records in order. The first record matching by description or
    /// street triggers one notification and ends the scan; later records are
    /// not evaluated.
    pub async fn dispatch(
        &self,
        records: &[OutageRecord],
        term: &SearchTerm,
        now: NaiveDateTime,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        if term.is_blank() {
            debug!("Search term is blank, matching disabled");
            return outcome;
        }

        for (index, record) in records.iter().enumerate() {
            outcome.evaluated += 1;
            let hit = evaluate(record, term);

            if hit.description_hit {
                let msg = format!("Outage in {}! Found in description!", self.street_name);
                self.journal.record_message(now, LogLevel::Info, &msg).await;
            }
            if hit.address_hit {
                let msg = format!("Outage in {}! Found in street name!", self.street_name);
                self.journal.record_message(now, LogLevel::Info, &msg).await;
            }

            if hit.is_hit() {
                outcome.notified = Some(index);
                outcome.delivered = self.notify(record, now).await;
                break;
            }
        }

        outcome
    }

    async fn notify(&self, record: &OutageRecord, now: NaiveDateTime) -> bool {
        let notification = Notification {
            subject: SUBJECT.to_string(),
            body: build_body(now, record, &self.street_name, &self.city_name),
        };

        if !self.notifier.is_enabled() {
            info!("Notifications disabled, outage match not sent");
            self.journal
                .record_message(now, LogLevel::Info, "Notifications disabled, e-mail not sent.")
                .await;
            return false;
        }

        match self.notifier.send(&notification).await {
            Ok(()) => {
                let msg = format!(
                    "Email sent successfully: {} to {}\n{}",
                    notification.subject,
                    self.notifier.recipients().join(", "),
                    notification.body
                );
                self.journal.record_message(now, LogLevel::Info, &msg).await;
                true
            }
            Err(e) => {
                let msg = format!("Failed to send email: {e}");
                self.journal.record_message(now, LogLevel::Error, &msg).await;
                false
            }
        }
    }
}

/// Time left until the outage starts, or until it ends when already in
/// progress. Zero once it is over. Truncated to whole minutes.
pub fn remaining(now: NaiveDateTime, start_at: NaiveDateTime, stop_at: NaiveDateTime) -> Duration {
    if now < start_at {
        start_at - now
    } else if now < stop_at {
        stop_at - now
    } else {
        Duration::zero()
    }
}

pub fn format_remaining(now: NaiveDateTime, start_at: NaiveDateTime, stop_at: NaiveDateTime) -> String {
    let total_minutes = remaining(now, start_at, stop_at).num_minutes();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("dni: {days}, godzin: {hours}, minut: {minutes}")
    } else {
        format!("godzin: {hours}, minut: {minutes}")
    }
}

pub fn format_addresses(addresses: &[Address]) -> String {
    if addresses.is_empty() {
        return "Brak adresow".to_string();
    }

    addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            format!(
                "{}. Ulica: {}, numery: {}",
                i + 1,
                address.street_name().unwrap_or(NONE_LABEL),
                address.numbers.as_deref().unwrap_or(NONE_LABEL),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_body(now: NaiveDateTime, record: &OutageRecord, street_name: &str, city_name: &str) -> String {
    let place = if city_name.is_empty() {
        street_name.to_string()
    } else {
        format!("{street_name} ({city_name})")
    };
    let revoked_label = if record.revoked { "Tak" } else { "Nie" };

    format!(
        "Cześć,\n\n\
         Zbliża się wyłączenie planowe prądu dla Twojej ulicy: {place}.\n\
         Nastąpi ono od {start} do {stop}.\n\
         POZOSTAŁY CZAS: {remaining}.\n\n\
         Szczegóły przerwy:\n\
         Opis: {description}\n\
         Odwołane: {revoked_label}\n\
         Opis odwołania: {revoked_description}\n\
         Adresy:\n\
         {addresses}\n\n\
         Pozdro,\n\
         Admin\n",
        start = record.start_at.format(TIMESTAMP_FORMAT),
        stop = record.stop_at.format(TIMESTAMP_FORMAT),
        remaining = format_remaining(now, record.start_at, record.stop_at),
        description = record.description,
        revoked_description = record.revoked_description.as_deref().unwrap_or(NONE_LABEL),
        addresses = format_addresses(&record.addresses),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressTeryt;
    use chrono::NaiveDate;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn record() -> OutageRecord {
        OutageRecord {
            description: "Prace eksploatacyjne".into(),
            start_at: dt(5, 8, 0),
            stop_at: dt(5, 14, 0),
            revoked: false,
            revoked_description: None,
            addresses: vec![
                Address {
                    numbers: Some("1-15".into()),
                    teryt: Some(AddressTeryt {
                        street_name: Some("Kwiatowa".into()),
                    }),
                },
                Address::default(),
            ],
        }
    }

    #[test]
    fn remaining_before_start_counts_days() {
        // 25h05m before start
        let now = dt(4, 6, 55);
        assert_eq!(format_remaining(now, dt(5, 8, 0), dt(5, 14, 0)), "dni: 1, godzin: 1, minut: 5");
    }

    #[test]
    fn remaining_during_outage_counts_to_stop() {
        let now = dt(5, 9, 30);
        assert_eq!(format_remaining(now, dt(5, 8, 0), dt(5, 14, 0)), "godzin: 4, minut: 30");
    }

    #[test]
    fn remaining_after_stop_is_zero() {
        let now = dt(6, 0, 0);
        assert_eq!(remaining(now, dt(5, 8, 0), dt(5, 14, 0)), Duration::zero());
        assert_eq!(format_remaining(now, dt(5, 8, 0), dt(5, 14, 0)), "godzin: 0, minut: 0");
    }

    #[test]
    fn remaining_truncates_seconds() {
        let now = dt(5, 7, 0) + Duration::seconds(59);
        assert_eq!(format_remaining(now, dt(5, 8, 0), dt(5, 14, 0)), "godzin: 0, minut: 59");
    }

    #[test]
    fn addresses_are_numbered_with_placeholders() {
        assert_eq!(
            format_addresses(&record().addresses),
            "1. Ulica: Kwiatowa, numery: 1-15\n2. Ulica: (brak), numery: (brak)"
        );
        assert_eq!(format_addresses(&[]), "Brak adresow");
    }

    #[test]
    fn body_contains_summary() {
        let mut r = record();
        r.revoked = true;
        r.revoked_description = Some("Prace przeniesione".into());

        let body = build_body(dt(5, 6, 0), &r, "Kwiatowa", "Lublin");
        assert!(body.contains("Twojej ulicy: Kwiatowa (Lublin)."));
        assert!(body.contains("od 2025-03-05 08:00:00 do 2025-03-05 14:00:00"));
        assert!(body.contains("POZOSTAŁY CZAS: godzin: 2, minut: 0."));
        assert!(body.contains("Odwołane: Tak\nOpis odwołania: Prace przeniesione\n"));
        assert!(body.contains("Adresy:\n1. Ulica: Kwiatowa, numery: 1-15\n"));
        assert!(body.ends_with("Pozdro,\nAdmin\n"));
    }

    #[test]
    fn body_without_city() {
        let body = build_body(dt(5, 6, 0), &record(), "Kwiatowa", "");
        assert!(body.contains("Twojej ulicy: Kwiatowa.\n"));
        assert!(body.contains("Odwołane: Nie\nOpis odwołania: (brak)\n"));
    }
}
