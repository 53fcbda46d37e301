use crate::core::soap::{find, parse_of, text_of};
use crate::domain::model::{AccessTicket, Credentials};
use crate::utils::error::{AfipError, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use roxmltree::Document;

impl AccessTicket {
    /// 解析 WSAA 回傳的 loginTicketResponse
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml.trim()).map_err(|e| AfipError::InvalidTicket {
            message: format!("not a valid XML document: {}", e),
        })?;
        let root = find(doc.root(), "loginTicketResponse").ok_or_else(|| {
            AfipError::InvalidTicket {
                message: "missing <loginTicketResponse>".to_string(),
            }
        })?;

        let required = |name: &str| {
            text_of(root, name).ok_or_else(|| AfipError::InvalidTicket {
                message: format!("missing <{}>", name),
            })
        };

        let token = required("token")?;
        let sign = required("sign")?;
        let expiration_time = parse_timestamp(&required("expirationTime")?)?;
        let generation_time = text_of(root, "generationTime")
            .map(|t| parse_timestamp(&t))
            .transpose()?;

        Ok(Self {
            source: text_of(root, "source"),
            destination: text_of(root, "destination"),
            unique_id: parse_of(root, "uniqueId").ok().flatten(),
            generation_time,
            expiration_time,
            token,
            sign,
            raw_xml: xml.to_string(),
        })
    }

    /// A ticket is usable while `expiration - margin` is still in the future.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expiration_time.with_timezone(&Utc) - margin > now
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expiration_time.with_timezone(&Utc) - now
    }

    pub fn credentials(&self, cuit: u64) -> Credentials {
        Credentials {
            token: self.token.clone(),
            sign: self.sign.clone(),
            cuit,
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|e| AfipError::InvalidTicket {
        message: format!("bad timestamp '{}': {}", value, e),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_ticket_xml(expiration: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<loginTicketResponse version="1.0">
    <header>
        <source>CN=wsaahomo, O=AFIP, C=AR, SERIALNUMBER=CUIT 33693450239</source>
        <destination>SERIALNUMBER=CUIT 20431255570, CN=fletes</destination>
        <uniqueId>1719759600</uniqueId>
        <generationTime>2025-06-30T12:00:00.000-03:00</generationTime>
        <expirationTime>{}</expirationTime>
    </header>
    <credentials>
        <token>PD94bWwgdmVyc2lvbj0iMS4wIiBlbmNvZGluZz0iVVRGLTgiIHN0YW5kYWxvbmU9InllcyI</token>
        <sign>Yk9Dx8Yw3lPBi3e6VqZJjC0dQmGvV5Q9p8vRk+2sNmk=</sign>
    </credentials>
</loginTicketResponse>"#,
            expiration
        )
    }

    #[test]
    fn test_parse_ticket() {
        let ticket =
            AccessTicket::from_xml(&sample_ticket_xml("2025-07-01T00:00:00.000-03:00")).unwrap();
        assert_eq!(ticket.unique_id, Some(1719759600));
        assert!(ticket.token.starts_with("PD94bWwg"));
        assert_eq!(ticket.sign, "Yk9Dx8Yw3lPBi3e6VqZJjC0dQmGvV5Q9p8vRk+2sNmk=");
        assert_eq!(
            ticket.expiration_time.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 7, 1, 3, 0, 0).unwrap()
        );
        assert!(ticket.source.unwrap().contains("wsaahomo"));
    }

    #[test]
    fn test_validity_uses_declared_expiration() {
        let ticket =
            AccessTicket::from_xml(&sample_ticket_xml("2025-06-30T12:00:00-03:00")).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 6, 30, 14, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 6, 30, 15, 0, 0).unwrap();

        assert!(ticket.is_valid_at(before, Duration::zero()));
        assert!(!ticket.is_valid_at(after, Duration::zero()));
        assert!(!ticket.is_valid_at(before, Duration::minutes(5)));
        assert_eq!(ticket.remaining(before), Duration::minutes(1));
    }

    #[test]
    fn test_missing_credentials_is_invalid() {
        let xml = "<loginTicketResponse><header><expirationTime>2025-06-30T12:00:00-03:00</expirationTime></header></loginTicketResponse>";
        match AccessTicket::from_xml(xml) {
            Err(AfipError::InvalidTicket { message }) => assert!(message.contains("token")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            AccessTicket::from_xml("not xml at all"),
            Err(AfipError::InvalidTicket { .. })
        ));
    }
}
