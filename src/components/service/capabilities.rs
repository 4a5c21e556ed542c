//! Reading OWS capabilities and exception documents.
//!
//! Only the parts needed to validate requests are kept: the service
//! identification, the advertised operations and the offered layers
//! (WFS `FeatureType`, WCS `CoverageSummary` or `CoverageOfferingBrief`).

use std::borrow::Cow;

use log::debug;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

const LAYER_ELEMENTS: [&str; 3] = ["FeatureType", "CoverageSummary", "CoverageOfferingBrief"];
const LAYER_NAME_ELEMENTS: [&str; 4] = ["Name", "name", "CoverageId", "Identifier"];
const LAYER_TITLE_ELEMENTS: [&str; 2] = ["Title", "label"];
const EXCEPTION_ROOTS: [&str; 2] = ["ExceptionReport", "ServiceExceptionReport"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub service: String,
    pub version: String,
    pub title: Option<String>,
    pub operations: Vec<String>,
    pub layers: Vec<LayerSummary>,
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Capabilities {
    pub fn supports(&self, operation: &str) -> bool {
        self.operations
            .iter()
            .any(|advertised| advertised.eq_ignore_ascii_case(operation))
    }

    /// Looks a layer up by its full name or by the part after the namespace prefix.
    pub fn layer(&self, name: &str) -> Option<&LayerSummary> {
        self.layers.iter().find(|layer| {
            layer.name == name
                || (!name.contains(':') && local_part(&layer.name) == name)
                || (!layer.name.contains(':') && local_part(name) == layer.name)
        })
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OwsDocument {
    Capabilities(Capabilities),
    /// Exception texts joined, verbatim.
    Exception(String),
}

fn local_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(Cow::into_owned))
}

/// Local name of the first element, `None` when the text is not XML.
pub(crate) fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Some(local_name(&element))
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(Event::Text(text)) if !text.iter().all(u8::is_ascii_whitespace) => return None,
            _ => (),
        }
    }
}

pub(crate) fn is_exception_root(name: &str) -> bool {
    EXCEPTION_ROOTS.contains(&name)
}

#[derive(Default)]
struct CapabilitiesParser {
    stack: Vec<String>,
    exception: bool,
    exception_texts: Vec<String>,
    exception_codes: Vec<String>,
    capabilities: Capabilities,
    service_type: Option<String>,
    layer: Option<LayerSummary>,
}

impl CapabilitiesParser {
    fn parent(&self) -> Option<&str> {
        self.stack.iter().rev().nth(1).map(String::as_str)
    }

    fn start(&mut self, element: &BytesStart) {
        let name = local_name(element);
        if self.stack.is_empty() {
            self.exception = is_exception_root(&name);
            if let Some(version) = attribute(element, "version") {
                self.capabilities.version = version;
            }
            if let Some(service) = name.strip_suffix("_Capabilities") {
                self.capabilities.service = service.to_string();
            }
        }
        if self.exception {
            if name == "Exception" || name == "ServiceException" {
                if let Some(code) = attribute(element, "exceptionCode")
                    .or_else(|| attribute(element, "code"))
                {
                    self.exception_codes.push(code);
                }
            }
        } else if name == "Operation" {
            if let Some(operation) = attribute(element, "name") {
                self.capabilities.operations.push(operation);
            }
        } else if self.stack.last().is_some_and(|parent| parent == "Request") {
            self.capabilities.operations.push(name.clone());
        } else if LAYER_ELEMENTS.contains(&name.as_str()) {
            self.layer = Some(LayerSummary {
                name: String::new(),
                title: None,
            });
        }
        self.stack.push(name);
    }

    fn end(&mut self) {
        if let Some(name) = self.stack.pop() {
            if LAYER_ELEMENTS.contains(&name.as_str()) {
                match self.layer.take() {
                    Some(layer) if !layer.name.is_empty() => self.capabilities.layers.push(layer),
                    _ => debug!("skipping {name} without a name"),
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let text = text.trim();
        let Some(current) = self.stack.last().map(String::as_str) else {
            return;
        };
        if text.is_empty() {
            return;
        }
        if self.exception {
            if current == "ExceptionText" || current == "ServiceException" {
                self.exception_texts.push(text.to_string());
            }
            return;
        }
        let parent = self.parent();
        let in_layer = parent.is_some_and(|parent| LAYER_ELEMENTS.contains(&parent));
        let in_service = matches!(parent, Some("ServiceIdentification") | Some("Service"));
        if in_layer {
            if let Some(layer) = self.layer.as_mut() {
                if LAYER_NAME_ELEMENTS.contains(&current) && layer.name.is_empty() {
                    layer.name = text.to_string();
                } else if LAYER_TITLE_ELEMENTS.contains(&current) && layer.title.is_none() {
                    layer.title = Some(text.to_string());
                }
            }
        } else if in_service && current == "Title" && self.capabilities.title.is_none() {
            self.capabilities.title = Some(text.to_string());
        } else if in_service && current == "ServiceType" {
            self.service_type = Some(text.to_string());
        }
    }

    fn finish(mut self) -> OwsDocument {
        if self.exception {
            let message = if self.exception_texts.is_empty() {
                self.exception_codes.join("; ")
            } else {
                self.exception_texts.join("; ")
            };
            return OwsDocument::Exception(message);
        }
        if self.capabilities.service.is_empty() {
            if let Some(service_type) = self.service_type {
                self.capabilities.service = service_type
                    .trim_start_matches("OGC")
                    .trim()
                    .to_string();
            }
        }
        OwsDocument::Capabilities(self.capabilities)
    }
}

/// Parses a capabilities or exception document.
pub(crate) fn parse_document(xml: &str) -> Result<OwsDocument, String> {
    if root_element(xml).is_none() {
        return Err("response is not an XML document".to_string());
    }
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut parser = CapabilitiesParser::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => parser.start(&element),
            Ok(Event::Empty(element)) => {
                parser.start(&element);
                parser.end();
            }
            Ok(Event::End(_)) => parser.end(),
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|err| err.to_string())?;
                parser.text(&text);
            }
            Ok(Event::CData(data)) => parser.text(&String::from_utf8_lossy(&data)),
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(format!(
                    "malformed XML at position {}: {err}",
                    reader.error_position()
                ))
            }
            _ => (),
        }
    }
    Ok(parser.finish())
}
