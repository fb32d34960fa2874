//! `canopy parse`: print a source file's syntax tree.

use canopy_lib::{Edit, Node, Parser, Point};
use serde_json::json;

use crate::cli::ParseParams;
use crate::commands::grammar::read_file;
use crate::commands::{CliError, load_grammar};

pub fn run(params: ParseParams) -> Result<(), CliError> {
    let table = load_grammar(&params.grammar)?;

    let source = match (&params.source_path, &params.source_text) {
        (Some(_), Some(_)) => return Err(CliError::ConflictingSources),
        (Some(path), None) => read_file(path)?,
        (None, Some(text)) => text.clone().into_bytes(),
        (None, None) => return Err(CliError::NoSource),
    };

    let parser = Parser::new(table);
    let mut tree = parser.parse(source.as_slice(), None)?;

    // --edit: replace a byte range and re-derive the tree from the old one.
    if let Some((start, old_end, new_text)) = &params.edit {
        let start = (*start).min(source.len());
        let old_end = (*old_end).clamp(start, source.len());
        let mut new_source = Vec::with_capacity(source.len());
        new_source.extend_from_slice(&source[..start]);
        new_source.extend_from_slice(new_text.as_bytes());
        new_source.extend_from_slice(&source[old_end..]);

        let edit = Edit {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: start + new_text.len(),
            start_point: point_at(&source, start),
            old_end_point: point_at(&source, old_end),
            new_end_point: point_at(&new_source, start + new_text.len()),
        };
        let edited = tree.with_edits(&[edit])?;
        tree = parser.parse(new_source.as_slice(), Some(&edited))?;
    }

    if params.json {
        let value = node_to_json(tree.root(), params.spans);
        println!("{}", serde_json::to_string_pretty(&value).expect("tree serializes"));
    } else if params.spans {
        let mut out = String::new();
        write_sexp_with_spans(tree.root(), &mut out);
        println!("{out}");
    } else {
        println!("{}", tree.root().to_sexp());
    }

    if tree.root().has_error() {
        eprintln!("(tree contains errors)");
    }
    Ok(())
}

fn point_at(bytes: &[u8], offset: usize) -> Point {
    let mut row = 0;
    let mut line_start = 0;
    for (i, &byte) in bytes.iter().take(offset).enumerate() {
        if byte == b'\n' {
            row += 1;
            line_start = i + 1;
        }
    }
    Point::new(row, (offset - line_start) as u32)
}

fn node_to_json(node: Node<'_>, spans: bool) -> serde_json::Value {
    let mut value = json!({
        "kind": node.kind_name(),
        "named": node.is_named(),
    });
    if node.is_error() {
        value["error"] = json!(true);
    }
    if node.is_missing() {
        value["missing"] = json!(true);
    }
    if spans {
        let (start, end) = node.point_range();
        value["start_byte"] = json!(node.start_byte());
        value["end_byte"] = json!(node.end_byte());
        value["start_point"] = json!([start.row, start.column]);
        value["end_point"] = json!([end.row, end.column]);
    }
    if node.child_count() > 0 {
        let children: Vec<_> = node
            .children()
            .map(|child| node_to_json(child, spans))
            .collect();
        value["children"] = json!(children);
    }
    value
}

fn write_sexp_with_spans(node: Node<'_>, out: &mut String) {
    use std::fmt::Write;

    if node.child_count() == 0 {
        let _ = write!(
            out,
            "({} [{}, {}))",
            node.kind_name(),
            node.start_byte(),
            node.end_byte()
        );
        return;
    }
    let _ = write!(out, "({} [{}, {})", node.kind_name(), node.start_byte(), node.end_byte());
    for child in node.children() {
        out.push(' ');
        write_sexp_with_spans(child, out);
    }
    out.push(')');
}
