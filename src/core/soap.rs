use crate::domain::model::ServiceMessage;
use crate::utils::error::{AfipError, Result};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use std::fmt::Display;

pub const SOAPENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Wraps a body fragment in a SOAP 1.1 envelope declaring one service namespace.
pub fn envelope(prefix: &str, namespace: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="{}" xmlns:{}="{}">"#,
            "<soapenv:Header/><soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        SOAPENV_NS, prefix, namespace, body
    )
}

/// 簡單的 XML 片段產生器，所有文字值都會跳脫
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, tag: &str) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn leaf(&mut self, tag: &str, value: impl Display) -> &mut Self {
        let text = value.to_string();
        self.open(tag);
        self.buf.push_str(&quick_xml::escape::escape(text.as_str()));
        self.close(tag)
    }

    pub fn leaf_opt<T: Display>(&mut self, tag: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.leaf(tag, value);
        }
        self
    }

    pub fn raw(&mut self, fragment: &str) -> &mut Self {
        self.buf.push_str(fragment);
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Parses a response and fails on a SOAP Fault.
pub fn parse_response(xml: &str) -> Result<Document<'_>> {
    let doc = Document::parse(xml)?;
    check_fault(&doc)?;
    Ok(doc)
}

pub fn check_fault(doc: &Document<'_>) -> Result<()> {
    let Some(fault) = find(doc.root(), "Fault") else {
        return Ok(());
    };

    let code = text_of(fault, "faultcode").unwrap_or_default();
    let message = text_of(fault, "faultstring").unwrap_or_else(|| "unspecified fault".to_string());

    if code.contains("alreadyAuthenticated") || message.contains("ya posee un TA valido") {
        return Err(AfipError::AlreadyAuthenticated { message });
    }

    Err(AfipError::SoapFault { code, message })
}

/// First element (self included) whose local name matches.
pub fn find<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

pub fn find_required<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>> {
    find(node, name).ok_or_else(|| AfipError::malformed(format!("missing <{}> element", name)))
}

/// Direct children with the given local name.
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Trimmed text of the first matching descendant, `None` when absent or empty.
pub fn text_of(node: Node<'_, '_>, name: &str) -> Option<String> {
    find(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn parse_of<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<Option<T>> {
    match text_of(node, name) {
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|_| AfipError::malformed(format!("<{}> is not a valid value: {}", name, text))),
        None => Ok(None),
    }
}

/// Reads `<list><item><code/><msg/></item>...</list>` blocks.
pub fn collect_messages(
    node: Node<'_, '_>,
    list: &str,
    item: &str,
    code: &str,
    msg: &str,
) -> Vec<ServiceMessage> {
    let Some(container) = find(node, list) else {
        return Vec::new();
    };

    children(container, item)
        .map(|entry| {
            ServiceMessage::new(
                text_of(entry, code).unwrap_or_default(),
                text_of(entry, msg).unwrap_or_default(),
            )
        })
        .collect()
}

/// AFIP dates travel as `yyyymmdd`; `NULL` means open-ended.
pub fn parse_afip_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

pub fn format_afip_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
