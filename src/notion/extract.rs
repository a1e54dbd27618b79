//! Turning raw Notion pages into [`Item`]s.
//!
//! Every property lookup goes through an ordered list of candidate names (see
//! [`FieldNames`]). Missing or oddly shaped properties never fail a page: the
//! eligibility flag defaults to false, the title to [`UNTITLED`], the image to
//! none.

use serde_json::Value;

use crate::config::FieldNames;
use crate::models::{Item, UNTITLED};

/// Extract every eligible, non-archived page.
pub fn extract_items(pages: &[Value], fields: &FieldNames) -> Vec<Item> {
    pages
        .iter()
        .filter_map(|page| extract_item(page, fields))
        .collect()
}

/// Extract one page, or `None` if it should not take part in battles.
pub fn extract_item(page: &Value, fields: &FieldNames) -> Option<Item> {
    if page.get("archived").and_then(Value::as_bool) == Some(true) {
        return None;
    }

    let id = page.get("id").and_then(Value::as_str)?;
    let properties = page.get("properties")?;

    if !is_eligible(properties, &fields.eligible) {
        return None;
    }

    Some(Item {
        id: id.to_string(),
        title: title(properties, &fields.title),
        image: image(properties, &fields.image),
    })
}

/// Read the eligibility flag from the first candidate property present.
///
/// Accepts a checkbox property or a formula producing a checkbox, a boolean,
/// the string `"True"`, or a non-zero number.
pub fn is_eligible(properties: &Value, names: &[String]) -> bool {
    let Some(prop) = first_present(properties, names) else {
        return false;
    };

    match prop.get("type").and_then(Value::as_str) {
        Some("checkbox") => prop.get("checkbox").and_then(Value::as_bool).unwrap_or(false),
        Some("formula") => prop.get("formula").map(formula_truthy).unwrap_or(false),
        _ => false,
    }
}

fn formula_truthy(formula: &Value) -> bool {
    if let Some(b) = formula.get("checkbox").and_then(Value::as_bool) {
        return b;
    }
    if let Some(b) = formula.get("boolean").and_then(Value::as_bool) {
        return b;
    }
    if let Some(s) = formula.get("string").and_then(Value::as_str) {
        return s.trim().eq_ignore_ascii_case("true");
    }
    if let Some(n) = formula.get("number").and_then(Value::as_f64) {
        return n != 0.0;
    }
    false
}

/// First candidate whose `title` or `rich_text` array yields non-empty text.
pub fn title(properties: &Value, names: &[String]) -> String {
    names
        .iter()
        .filter_map(|name| properties.get(name))
        .filter_map(|prop| {
            prop.get("title")
                .or_else(|| prop.get("rich_text"))
                .and_then(Value::as_array)
        })
        .map(|parts| plain_text(parts))
        .find(|text| !text.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn plain_text(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|part| {
            part.get("plain_text")
                .or_else(|| part.get("text").and_then(|t| t.get("content")))
                .and_then(Value::as_str)
        })
        .collect()
}

/// First candidate with a usable URL: an uploaded or external file, or a
/// plain `url` property.
pub fn image(properties: &Value, names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| properties.get(name))
        .find_map(|prop| {
            let from_files = prop
                .get("files")
                .and_then(Value::as_array)
                .and_then(|files| files.first())
                .and_then(|file| {
                    file.get("file")
                        .or_else(|| file.get("external"))
                        .and_then(|f| f.get("url"))
                        .and_then(Value::as_str)
                });
            from_files
                .or_else(|| prop.get("url").and_then(Value::as_str))
                .map(str::to_string)
        })
}

fn first_present<'a>(properties: &'a Value, names: &[String]) -> Option<&'a Value> {
    names.iter().find_map(|name| properties.get(name))
}
