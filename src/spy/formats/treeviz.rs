//! Treeviz for reconstructed structures
//!
//! One line per structure entry, nesting drawn with box characters. Each
//! line shows the visual node followed by its contributors:
//!
//! ```text
//! ⧉ 1 root(s)
//! └─ <div> ← <div> /src/app.jsx:1 [0..28], App /src/main.jsx:3 [10..17]
//!   ├─ #text "title" ← (anonymous) unknown [-1..-1], text-node /src/app.jsx:1 [5..10]
//!   └─ <span> ← <span> /src/app.jsx:1 [10..17]
//! ```

use crate::spy::host::Document;
use crate::spy::walker::{ComponentInfo, DomFrameworkStructure};

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn contributor(info: &ComponentInfo) -> String {
    format!("{} {}", info.component, info.location)
}

fn label(structure: &DomFrameworkStructure, document: &Document) -> String {
    let node = match structure.node {
        Some(id) => truncate(&document.describe(id), 30),
        None => "∅".to_string(),
    };
    if structure.components.is_empty() {
        return node;
    }
    let contributors: Vec<String> = structure.components.iter().map(contributor).collect();
    format!("{} ← {}", node, contributors.join(", "))
}

fn format_structure(
    structure: &DomFrameworkStructure,
    document: &Document,
    prefix: &str,
    is_last: bool,
    output: &mut String,
) {
    let connector = if is_last { "└─" } else { "├─" };
    output.push_str(&format!("{}{} {}\n", prefix, connector, label(structure, document)));

    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    let count = structure.children.len();
    for (i, child) in structure.children.iter().enumerate() {
        format_structure(child, document, &child_prefix, i + 1 == count, output);
    }
}

pub fn to_treeviz(structures: &[DomFrameworkStructure], document: &Document) -> String {
    let mut output = format!("⧉ {} root(s)\n", structures.len());
    let count = structures.len();
    for (i, structure) in structures.iter().enumerate() {
        format_structure(structure, document, "", i + 1 == count, &mut output);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::runtime::{SourceLocation, Value};
    use crate::spy::walker::Component;

    #[test]
    fn test_nested_output() {
        let mut document = Document::new();
        let div = document.create_element("div");
        let text = document.create_text("hi");
        let structures = vec![DomFrameworkStructure {
            node: Some(div),
            components: vec![ComponentInfo {
                component: Component::Tag("div".to_string()),
                location: SourceLocation::new("/a.jsx", 1, 0, 12),
                props: Value::Null,
            }],
            children: vec![
                DomFrameworkStructure::leaf(text, Vec::new()),
                DomFrameworkStructure::default(),
            ],
        }];

        let expected = [
            "⧉ 1 root(s)",
            "└─ <div> ← <div> /a.jsx:1 [0..12]",
            "  ├─ #text \"hi\"",
            "  └─ ∅",
        ];
        assert_eq!(to_treeviz(&structures, &document), expected.join("\n") + "\n");
    }
}
