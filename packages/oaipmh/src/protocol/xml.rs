//! OAI-PMH 2.0 response rendering.

use chrono::{DateTime, Utc};

use super::resumption::{Page, ResumptionState};
use crate::config::earliest_datestamp;
use crate::error::OaiError;
use crate::types::{Header, Identify, MetadataFormat, MetadataPrefix, Record, SetSpec};

const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const OAI_DC_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";
const OAI_DC_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/oai_dc/ http://www.openarchives.org/OAI/2.0/oai_dc.xsd";
const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Dublin Core elements in schema order. Other metadata fields are not emitted.
pub const DC_ELEMENTS: [&str; 15] = [
    "title",
    "creator",
    "subject",
    "description",
    "publisher",
    "contributor",
    "date",
    "type",
    "format",
    "identifier",
    "source",
    "language",
    "relation",
    "coverage",
    "rights",
];

/// Escape text and attribute values.
///
/// Characters XML 1.0 does not allow in a document are dropped.
///
/// # Examples
/// ```
/// use catalog_oaipmh::protocol::xml::escape;
///
/// assert_eq!(escape(r#"a < b & "c""#), "a &lt; b &amp; &quot;c&quot;");
/// assert_eq!(escape("bad\u{1}text"), "badtext");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if !is_xml_char(c) => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn day(datestamp: &DateTime<Utc>) -> String {
    datestamp.format("%Y-%m-%d").to_string()
}

/// Minimal streaming writer for the response document.
#[derive(Debug)]
struct XmlWriter {
    out: String,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value));
            self.out.push('"');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push('>');
    }

    fn close(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push_str("/>");
    }

    fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.open(name, attrs);
        self.out.push_str(&escape(text));
        self.close(name);
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Response envelope shared by every verb.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub base_url: &'a str,
    pub response_date: DateTime<Utc>,
    /// Arguments echoed as attributes of the `request` element, `None` for
    /// requests rejected with badVerb or badArgument.
    pub request_args: Option<&'a [(String, String)]>,
}

impl Envelope<'_> {
    fn render(&self, body: impl FnOnce(&mut XmlWriter)) -> String {
        let mut w = XmlWriter::new();
        w.open(
            "OAI-PMH",
            &[
                ("xmlns", OAI_NAMESPACE),
                ("xmlns:xsi", XSI_NAMESPACE),
                ("xsi:schemaLocation", OAI_SCHEMA_LOCATION),
            ],
        );
        w.element(
            "responseDate",
            &[],
            &self.response_date.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );

        let attrs: Vec<(&str, &str)> = self
            .request_args
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        w.element("request", &attrs, self.base_url);

        body(&mut w);
        w.close("OAI-PMH");
        w.finish()
    }
}

fn write_header(w: &mut XmlWriter, header: &Header) {
    if header.deleted {
        w.open("header", &[("status", "deleted")]);
    } else {
        w.open("header", &[]);
    }
    w.element("identifier", &[], &header.identifier);
    let datestamp = header
        .datestamp
        .map_or_else(|| earliest_datestamp().format("%Y-%m-%d").to_string(), |d| day(&d));
    w.element("datestamp", &[], &datestamp);
    for spec in &header.set_specs {
        w.element("setSpec", &[], spec);
    }
    w.close("header");
}

fn write_dc_elements(w: &mut XmlWriter, record: &Record) {
    for name in DC_ELEMENTS {
        for value in record.metadata.get(name).unwrap_or_default() {
            w.element(&format!("dc:{name}"), &[], value);
        }
    }
}

fn write_metadata(w: &mut XmlWriter, prefix: MetadataPrefix, record: &Record) {
    w.open("metadata", &[]);
    match prefix {
        MetadataPrefix::OaiDc => {
            w.open(
                "oai_dc:dc",
                &[
                    ("xmlns:oai_dc", OAI_DC_NAMESPACE),
                    ("xmlns:dc", DC_NAMESPACE),
                    ("xmlns:xsi", XSI_NAMESPACE),
                    ("xsi:schemaLocation", OAI_DC_SCHEMA_LOCATION),
                ],
            );
            write_dc_elements(w, record);
            w.close("oai_dc:dc");
        }
        MetadataPrefix::Rdf => {
            w.open(
                "rdf:RDF",
                &[("xmlns:rdf", RDF_NAMESPACE), ("xmlns:dc", DC_NAMESPACE)],
            );
            w.open("rdf:Description", &[("rdf:about", record.header.identifier.as_str())]);
            write_dc_elements(w, record);
            w.close("rdf:Description");
            w.close("rdf:RDF");
        }
    }
    w.close("metadata");
}

fn write_record(w: &mut XmlWriter, prefix: MetadataPrefix, record: &Record) {
    w.open("record", &[]);
    write_header(w, &record.header);
    if !record.header.deleted {
        write_metadata(w, prefix, record);
    }
    if let Some(ref about) = record.about {
        w.element("about", &[], about);
    }
    w.close("record");
}

fn write_resumption(w: &mut XmlWriter, state: Option<&ResumptionState>) {
    let Some(state) = state else {
        return;
    };
    let size = state.complete_list_size.to_string();
    let cursor = state.cursor.to_string();
    let attrs = [("completeListSize", size.as_str()), ("cursor", cursor.as_str())];
    match state.token {
        Some(ref token) => w.element("resumptionToken", &attrs, token),
        None => w.empty("resumptionToken", &attrs),
    }
}

#[must_use]
pub fn render_identify(envelope: &Envelope<'_>, identify: &Identify) -> String {
    envelope.render(|w| {
        w.open("Identify", &[]);
        w.element("repositoryName", &[], &identify.repository_name);
        w.element("baseURL", &[], &identify.base_url);
        w.element("protocolVersion", &[], identify.protocol_version);
        for email in &identify.admin_emails {
            w.element("adminEmail", &[], email);
        }
        w.element(
            "earliestDatestamp",
            &[],
            &identify.earliest_datestamp.format("%Y-%m-%d").to_string(),
        );
        w.element("deletedRecord", &[], identify.deleted_record);
        w.element("granularity", &[], identify.granularity);
        for compression in &identify.compression {
            w.element("compression", &[], compression);
        }
        w.close("Identify");
    })
}

#[must_use]
pub fn render_metadata_formats(envelope: &Envelope<'_>, formats: &[MetadataFormat]) -> String {
    envelope.render(|w| {
        w.open("ListMetadataFormats", &[]);
        for format in formats {
            w.open("metadataFormat", &[]);
            w.element("metadataPrefix", &[], format.prefix.as_str());
            w.element("schema", &[], format.schema);
            w.element("metadataNamespace", &[], format.namespace);
            w.close("metadataFormat");
        }
        w.close("ListMetadataFormats");
    })
}

/// ListSets; a description is wrapped in an `oai_dc:dc` element.
#[must_use]
pub fn render_sets(envelope: &Envelope<'_>, page: &Page<SetSpec>) -> String {
    envelope.render(|w| {
        w.open("ListSets", &[]);
        for set in &page.items {
            w.open("set", &[]);
            w.element("setSpec", &[], &set.spec);
            w.element("setName", &[], &set.name);
            if let Some(ref description) = set.description {
                w.open("setDescription", &[]);
                w.open(
                    "oai_dc:dc",
                    &[
                        ("xmlns:oai_dc", OAI_DC_NAMESPACE),
                        ("xmlns:dc", DC_NAMESPACE),
                        ("xmlns:xsi", XSI_NAMESPACE),
                        ("xsi:schemaLocation", OAI_DC_SCHEMA_LOCATION),
                    ],
                );
                w.element("dc:description", &[], description);
                w.close("oai_dc:dc");
                w.close("setDescription");
            }
            w.close("set");
        }
        write_resumption(w, page.resumption.as_ref());
        w.close("ListSets");
    })
}

#[must_use]
pub fn render_identifiers(envelope: &Envelope<'_>, page: &Page<Header>) -> String {
    envelope.render(|w| {
        w.open("ListIdentifiers", &[]);
        for header in &page.items {
            write_header(w, header);
        }
        write_resumption(w, page.resumption.as_ref());
        w.close("ListIdentifiers");
    })
}

#[must_use]
pub fn render_records(envelope: &Envelope<'_>, prefix: MetadataPrefix, page: &Page<Record>) -> String {
    envelope.render(|w| {
        w.open("ListRecords", &[]);
        for record in &page.items {
            write_record(w, prefix, record);
        }
        write_resumption(w, page.resumption.as_ref());
        w.close("ListRecords");
    })
}

/// GetRecord response.
#[must_use]
pub fn render_record(envelope: &Envelope<'_>, prefix: MetadataPrefix, record: &Record) -> String {
    envelope.render(|w| {
        w.open("GetRecord", &[]);
        write_record(w, prefix, record);
        w.close("GetRecord");
    })
}

/// Error response for a protocol error. Faults have no OAI-PMH code and
/// render as `badArgument`; callers are expected not to pass them.
#[must_use]
pub fn render_error(envelope: &Envelope<'_>, error: &OaiError) -> String {
    let code = error.code().unwrap_or("badArgument");
    envelope.render(|w| {
        w.element("error", &[("code", code)], &error.to_string());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn envelope(args: Option<&[(String, String)]>) -> Envelope<'_> {
        Envelope {
            base_url: "https://data.example.org/oai",
            response_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            request_args: args,
        }
    }

    fn record() -> Record {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), vec!["Rain & snow".to_string()]);
        fields.insert("identifier".to_string(), vec!["d1".to_string()]);
        fields.insert("language".to_string(), vec!["fi".to_string()]);
        fields.insert("custom_extra".to_string(), vec!["hidden".to_string()]);
        Record {
            header: Header {
                identifier: "d1".into(),
                datestamp: Some(Utc.with_ymd_and_hms(2020, 5, 1, 8, 0, 0).unwrap()),
                set_specs: vec!["rainfall".into()],
                deleted: false,
            },
            metadata: Metadata::new(fields),
            about: None,
        }
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape("rainfall 2020"), "rainfall 2020");
        assert_eq!(escape("it's"), "it&apos;s");
    }

    #[test]
    fn test_escape_drops_non_xml_characters() {
        assert_eq!(escape("a\u{0}b\u{8}c\u{B}d\u{1F}e"), "abcde");
        assert_eq!(escape("x\u{FFFE}y\u{FFFF}z"), "xyz");
        assert_eq!(escape("tab\there\r\nline"), "tab\there\r\nline");
        assert_eq!(escape("Säätila 🌧"), "Säätila 🌧");
    }

    #[test]
    fn test_envelope_echoes_request_arguments() {
        let args = vec![("verb".to_string(), "Identify".to_string())];
        let xml = render_error(&envelope(Some(args.as_slice())), &OaiError::NoRecordsMatch);

        assert!(xml.contains("<responseDate>2024-03-01T12:30:00Z</responseDate>"));
        assert!(xml.contains(r#"<request verb="Identify">https://data.example.org/oai</request>"#));
        assert!(xml.contains(r#"<error code="noRecordsMatch">"#));
    }

    #[test]
    fn test_envelope_without_arguments() {
        let xml = render_error(&envelope(None), &OaiError::BadVerb("Harvest".into()));
        assert!(xml.contains("<request>https://data.example.org/oai</request>"));
    }

    #[test]
    fn test_oai_dc_record_skips_non_dublin_core_fields() {
        let xml = render_record(&envelope(None), MetadataPrefix::OaiDc, &record());

        assert!(xml.contains("<dc:title>Rain &amp; snow</dc:title>"));
        assert!(xml.contains("<dc:language>fi</dc:language>"));
        assert!(!xml.contains("custom_extra"));
        assert!(xml.contains("<datestamp>2020-05-01</datestamp>"));
        assert!(xml.contains("<setSpec>rainfall</setSpec>"));
    }

    #[test]
    fn test_rdf_record() {
        let xml = render_record(&envelope(None), MetadataPrefix::Rdf, &record());
        assert!(xml.contains(r#"<rdf:Description rdf:about="d1">"#));
        assert!(xml.contains("<dc:title>Rain &amp; snow</dc:title>"));
    }

    #[test]
    fn test_missing_datestamp_uses_earliest() {
        let mut record = record();
        record.header.datestamp = None;
        let page = Page {
            items: vec![record.header],
            resumption: None,
        };

        let xml = render_identifiers(&envelope(None), &page);
        assert!(xml.contains("<datestamp>2004-01-01</datestamp>"));
    }

    #[test]
    fn test_resumption_token_element() {
        let page = Page {
            items: vec![record().header],
            resumption: Some(ResumptionState {
                token: None,
                cursor: 10,
                complete_list_size: 11,
            }),
        };

        let xml = render_identifiers(&envelope(None), &page);
        assert!(xml.contains(r#"<resumptionToken completeListSize="11" cursor="10"/>"#));
    }
}
