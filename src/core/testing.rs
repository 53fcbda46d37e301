//! In-memory fakes for the domain ports, used by unit tests.

use crate::domain::ports::{CmsSigner, SoapTransport, TicketStore};
use crate::utils::error::{AfipError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub action: String,
    pub envelope: String,
}

/// Answers calls with queued bodies, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(body.into());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SoapTransport for ScriptedTransport {
    async fn call(&self, url: &str, action: &str, envelope: String) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            action: action.to_string(),
            envelope,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AfipError::malformed("no scripted reply left"))
    }
}

/// "Signs" by prefixing the content, so tests can decode what was signed.
#[derive(Default)]
pub struct FakeSigner {
    calls: AtomicUsize,
}

impl FakeSigner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CmsSigner for FakeSigner {
    async fn sign(&self, content: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut signed = b"CMS:".to_vec();
        signed.extend_from_slice(content);
        Ok(signed)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tickets: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with(self, service: &str, xml: impl Into<String>) -> Self {
        self.tickets
            .lock()
            .unwrap()
            .insert(service.to_string(), xml.into());
        self
    }

    pub fn get(&self, service: &str) -> Option<String> {
        self.tickets.lock().unwrap().get(service).cloned()
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn load(&self, service: &str) -> Result<Option<String>> {
        Ok(self.get(service))
    }

    async fn save(&self, service: &str, ticket_xml: &str) -> Result<()> {
        self.tickets
            .lock()
            .unwrap()
            .insert(service.to_string(), ticket_xml.to_string());
        Ok(())
    }
}

/// WSAA `loginCms` response wrapping the given ticket document.
pub fn login_cms_response(ticket_xml: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <loginCmsResponse xmlns="http://wsaa.view.sua.dvadac.desein.afip.gov.ar">
      <loginCmsReturn>{}</loginCmsReturn>
    </loginCmsResponse>
  </soapenv:Body>
</soapenv:Envelope>"#,
        quick_xml::escape::escape(ticket_xml)
    )
}

pub fn ticket_xml(token: &str, expiration: &str) -> String {
    format!(
        "<loginTicketResponse version=\"1.0\"><header><uniqueId>1</uniqueId>\
         <generationTime>2025-06-30T12:00:00-03:00</generationTime>\
         <expirationTime>{}</expirationTime></header>\
         <credentials><token>{}</token><sign>sign-{}</sign></credentials></loginTicketResponse>",
        expiration, token, token
    )
}
