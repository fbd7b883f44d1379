//! OWS exception report parsing.
//!
//! WMTS servers answer failed requests with an `ows:ExceptionReport`
//! document, frequently with a 200 status. Callers check responses with
//! [`parse_exception_report`] before treating a body as capabilities or
//! image data.

use quick_xml::events::Event;
use quick_xml::Reader;
use wmts_common::WmtsError;

/// The first exception carried by an OWS exception report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceException {
    pub code: String,
    pub locator: Option<String>,
    pub text: String,
}

impl From<ServiceException> for WmtsError {
    fn from(ex: ServiceException) -> Self {
        let text = match ex.locator {
            Some(locator) if !locator.is_empty() => format!("{} (locator: {})", ex.text, locator),
            _ => ex.text,
        };
        WmtsError::ServiceException {
            code: ex.code,
            text,
        }
    }
}

/// Parse an OWS exception report. Returns `None` if the document is not one.
pub fn parse_exception_report(xml: &str) -> Option<ServiceException> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut seen_root = false;
    let mut in_text = false;
    let mut exception: Option<ServiceException> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if !seen_root {
                    if name.as_ref() != b"ExceptionReport" {
                        return None;
                    }
                    seen_root = true;
                } else if name.as_ref() == b"Exception" && exception.is_none() {
                    let mut ex = ServiceException {
                        code: "NoApplicableCode".to_string(),
                        locator: None,
                        text: String::new(),
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_default();
                        match attr.key.local_name().as_ref() {
                            b"exceptionCode" => ex.code = value,
                            b"locator" => ex.locator = Some(value),
                            _ => {}
                        }
                    }
                    exception = Some(ex);
                } else if name.as_ref() == b"ExceptionText" {
                    in_text = true;
                }
            }
            Ok(Event::Text(t)) if in_text => {
                if let (Some(ex), Ok(text)) = (exception.as_mut(), t.unescape()) {
                    if !ex.text.is_empty() {
                        ex.text.push(' ');
                    }
                    ex.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"ExceptionText" {
                    in_text = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return None;
    }

    Some(exception.unwrap_or(ServiceException {
        code: "NoApplicableCode".to_string(),
        locator: None,
        text: "empty exception report".to_string(),
    }))
}
