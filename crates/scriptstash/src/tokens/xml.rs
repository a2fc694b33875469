//! XML form of token maps.
//!
//! A single map is a root element whose children are `<key>value</key>`
//! pairs. A list of maps is a root element whose children each hold such
//! pairs. The root and group element names are not significant when reading.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::TokenMap;
use crate::error::{Error, Result};

const FORMAT: &str = "XML";
const ROOT: &str = "root";
const GROUP: &str = "tokens";

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::format(FORMAT, e.to_string())
}

/// A parsed element with the text of all of its descendants, in document order.
#[derive(Debug, Default)]
struct Element {
    name: String,
    value: String,
    children: Vec<Element>,
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// Parses a document into its root element.
fn parse_root(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut root: Option<Element> = None;
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Eof => break,
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(xml_error("document has more than one root element"));
                }
                stack.push(Element {
                    name: element_name(&start),
                    ..Element::default()
                });
            }
            Event::Empty(empty) => {
                let element = Element {
                    name: element_name(&empty),
                    ..Element::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(xml_error("document has more than one root element")),
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(xml_error)?;
                push_text(&mut stack, &content);
            }
            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(&cdata).into_owned();
                push_text(&mut stack, &content);
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(format!("element <{}> is not closed", open.name)));
    }
    root.ok_or_else(|| xml_error("document has no root element"))
}

/// Appends text to every open element below the root.
fn push_text(stack: &mut [Element], text: &str) {
    for element in stack.iter_mut().skip(1) {
        element.value.push_str(text);
    }
}

fn to_tokens(group: Element) -> TokenMap {
    group
        .children
        .into_iter()
        .map(|pair| (pair.name, pair.value))
        .collect()
}

pub(super) fn parse(text: &str) -> Result<TokenMap> {
    Ok(to_tokens(parse_root(text)?))
}

pub(super) fn parse_array(text: &str) -> Result<Vec<TokenMap>> {
    Ok(parse_root(text)?
        .children
        .into_iter()
        .map(to_tokens)
        .collect())
}

/// Returns true if `name` can be written as an element name.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn write_pairs(writer: &mut Writer<Vec<u8>>, tokens: &TokenMap) -> Result<()> {
    for (key, value) in tokens.pairs() {
        if !is_valid_name(&key) {
            return Err(xml_error(format!("'{key}' is not a valid element name")));
        }
        writer
            .write_event(Event::Start(BytesStart::new(key.as_str())))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(&value)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new(key.as_str())))
            .map_err(xml_error)?;
    }
    Ok(())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

pub(super) fn to_string(tokens: &TokenMap) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new(ROOT)))
        .map_err(xml_error)?;
    write_pairs(&mut writer, tokens)?;
    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(xml_error)?;
    finish(writer)
}

pub(super) fn to_string_array(maps: &[TokenMap]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new(ROOT)))
        .map_err(xml_error)?;
    for tokens in maps {
        writer
            .write_event(Event::Start(BytesStart::new(GROUP)))
            .map_err(xml_error)?;
        write_pairs(&mut writer, tokens)?;
        writer
            .write_event(Event::End(BytesEnd::new(GROUP)))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(xml_error)?;
    finish(writer)
}
