use crate::core::soap::XmlWriter;
use crate::domain::model::LoginTicketRequest;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

pub const DEFAULT_WINDOW_MINUTES: i64 = 10;

impl LoginTicketRequest {
    /// 建立 TRA：有效區間為 now ± window，uniqueId 取 Unix 秒數
    pub fn new(service: &str, now: DateTime<Utc>, window: Duration) -> Self {
        let now = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);

        Self {
            unique_id: now.timestamp().max(0) as u64,
            generation_time: now - window,
            expiration_time: now + window,
            service: service.to_string(),
        }
    }

    pub fn to_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.raw(r#"<?xml version="1.0" encoding="UTF-8"?>"#)
            .raw(r#"<loginTicketRequest version="1.0">"#)
            .open("header")
            .leaf("uniqueId", self.unique_id)
            .leaf(
                "generationTime",
                self.generation_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .leaf(
                "expirationTime",
                self.expiration_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .close("header")
            .leaf("service", &self.service)
            .close("loginTicketRequest");
        w.finish()
    }
}
