//! One-page PDF receipt for a stored grievance.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use grievance_core::{Error, Grievance, Result};

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 57;
const LINE_HEIGHT: i64 = 20;
const WRAP_COLUMNS: usize = 90;

pub const RECEIPT_TITLE: &str = "Grievance / Feedback Receipt";

/// Printed where an overlong field was cut to fit the page.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Text lines printed under the title, in order.
pub fn receipt_lines(grievance: &Grievance) -> Vec<String> {
    let or_dash = |v: Option<&str>| match v.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "-".to_string(),
    };
    vec![
        format!("Grievance ID: {}", grievance.id),
        format!("Created at: {}", grievance.created_at.to_rfc3339()),
        format!(
            "Anonymous: {}",
            if grievance.is_anonymous { "True" } else { "False" }
        ),
        format!("Details: {}", or_dash(grievance.details.as_deref())),
        format!("Category type: {}", or_dash(grievance.category_type.as_deref())),
    ]
}

/// Render the receipt. Text outside printable ASCII is replaced with `?`
/// since the page uses a standard Type1 font.
pub fn render_receipt(grievance: &Grievance) -> Result<Vec<u8>> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F2".to_vec()), Object::Integer(16)]),
        Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(PAGE_HEIGHT - MARGIN)],
        ),
        Operation::new("Tj", vec![Object::string_literal(RECEIPT_TITLE)]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(11)]),
        Operation::new("Td", vec![Object::Integer(0), Object::Integer(-2 * LINE_HEIGHT)]),
    ];

    let max_lines = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize - 2;
    let blocks: Vec<Vec<String>> = receipt_lines(grievance)
        .iter()
        .map(|line| wrap(&printable(line), WRAP_COLUMNS))
        .collect();
    for line in fit_to_page(blocks, max_lines) {
        ops.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        ops.push(Operation::new("Td", vec![Object::Integer(0), Object::Integer(-LINE_HEIGHT)]));
    }
    ops.push(Operation::new("ET", vec![]));

    let content = Content { operations: ops }
        .encode()
        .map_err(|e| Error::Internal(format!("receipt encoding failed: {}", e)))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| Error::Internal(format!("receipt rendering failed: {}", e)))?;
    Ok(buf)
}

/// Flatten wrapped blocks into at most `max_lines` lines. When they do not
/// fit, the longest block is shortened and ends with [`TRUNCATION_MARKER`],
/// so every other field stays on the page.
fn fit_to_page(mut blocks: Vec<Vec<String>>, max_lines: usize) -> Vec<String> {
    let total: usize = blocks.iter().map(Vec::len).sum();
    if total > max_lines {
        let overflow = total - max_lines;
        if let Some(longest) = blocks.iter_mut().max_by_key(|b| b.len()) {
            let keep = longest.len().saturating_sub(overflow + 1);
            longest.truncate(keep);
            longest.push(TRUNCATION_MARKER.to_string());
        }
    }
    blocks.into_iter().flatten().take(max_lines).collect()
}

fn printable(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\n' | '\r' | '\t' => ' ',
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split(' ').filter(|w| !w.is_empty()) {
        let mut word = word;
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let (head, tail) = word.split_at(width);
            lines.push(head.to_string());
            word = tail;
        }
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
