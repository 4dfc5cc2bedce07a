/*
[INPUT]:  Task snapshots, outline tree + selection, flashcards
[OUTPUT]: Plain-text lines for the terminal
[POS]:    CLI presentation layer
[UPDATE]: When adding columns or changing checkbox markers
*/

use console::style;

use cardloom_adapter::{Flashcard, Result, Task, TaskPage};
use cardloom_workflow::{CatalogEntry, CatalogTree, CheckState, NodeKind, SelectionState};

pub fn marker(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
        CheckState::Unchecked => "[ ]",
    }
}

pub fn task_line(task: &Task) -> String {
    format!(
        "{}  {:<18} {:<5} {:<15} {}",
        task.id,
        task.status,
        task.task_type(),
        task.workflow_type,
        task.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn task_detail(task: &Task) -> String {
    let options = task.input.options();
    let mut lines = vec![
        format!("id:        {}", task.id),
        format!("status:    {}", styled_status(task)),
        format!("type:      {} / {}", task.task_type(), task.workflow_type),
        format!("created:   {}", task.created_at.to_rfc3339()),
        format!("updated:   {}", task.updated_at.to_rfc3339()),
    ];
    if let Some(language) = &options.language {
        lines.push(format!("language:  {language}"));
    }
    if let Some(card_count) = options.card_count {
        lines.push(format!("cards:     {card_count}"));
    }
    lines.join("\n")
}

fn styled_status(task: &Task) -> String {
    let status = task.status.to_string();
    match task.status {
        cardloom_adapter::TaskStatus::Completed => style(status).green().to_string(),
        cardloom_adapter::TaskStatus::Failed => style(status).red().to_string(),
        _ => style(status).yellow().to_string(),
    }
}

pub fn task_page(page: &TaskPage, offset: u32) -> Vec<String> {
    let mut lines: Vec<String> = page.tasks.iter().map(task_line).collect();
    let shown_to = offset as u64 + page.tasks.len() as u64;
    lines.push(format!(
        "showing {}-{} of {}",
        if page.tasks.is_empty() { offset as u64 } else { offset as u64 + 1 },
        shown_to,
        page.total_count
    ));
    lines
}

/// Nodes shown in document order; children of collapsed chapters are hidden.
pub fn visible_nodes<'a>(tree: &'a CatalogTree, state: &SelectionState) -> Vec<&'a CatalogEntry> {
    let mut collapsed = false;
    tree.iter()
        .filter(|entry| {
            if entry.kind == NodeKind::Chapter {
                collapsed = !state.is_expanded(&entry.id);
                true
            } else {
                !collapsed
            }
        })
        .collect()
}

pub fn node_line(
    tree: &CatalogTree,
    state: &SelectionState,
    entry: &CatalogEntry,
) -> Result<String> {
    let fold = match entry.kind {
        NodeKind::Chapter if entry.is_leaf() => " ",
        NodeKind::Chapter if state.is_expanded(&entry.id) => "-",
        NodeKind::Chapter => "+",
        _ => " ",
    };
    Ok(format!(
        "{}{} {} {} ({})",
        "  ".repeat(entry.depth),
        fold,
        marker(tree.check_state(state, &entry.id)?),
        entry.title,
        entry.id
    ))
}

/// Outline as an indented checklist
pub fn catalog_lines(tree: &CatalogTree, state: &SelectionState) -> Result<Vec<String>> {
    visible_nodes(tree, state)
        .into_iter()
        .map(|entry| node_line(tree, state, entry))
        .collect()
}

pub fn flashcard_lines(cards: &[Flashcard]) -> Vec<String> {
    cards
        .iter()
        .enumerate()
        .map(|(index, card)| format!("{:>3}. Q: {}\n     A: {}", index + 1, card.front, card.back))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardloom_adapter::{Chapter, Section, Subsection};
    use cardloom_workflow::load_catalog;

    fn outline() -> Vec<Chapter> {
        vec![
            Chapter {
                id: "ch1".to_string(),
                chapter: "Thermodynamics".to_string(),
                description: None,
                sections: vec![Section {
                    id: "s1".to_string(),
                    section: "First law".to_string(),
                    description: None,
                    subsections: vec![
                        Subsection {
                            id: "sub1".to_string(),
                            subsection: "Internal energy".to_string(),
                            description: None,
                        },
                        Subsection {
                            id: "sub2".to_string(),
                            subsection: "Work".to_string(),
                            description: None,
                        },
                    ],
                }],
            },
            Chapter {
                id: "ch2".to_string(),
                chapter: "Kinetics".to_string(),
                description: None,
                sections: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_catalog_lines_show_partial_selection() {
        let (tree, state) = load_catalog(&outline()).unwrap();
        let state = tree.toggle_node(&state, "sub2").unwrap();

        let lines = catalog_lines(&tree, &state).unwrap();
        assert_eq!(
            lines,
            vec![
                "- [-] Thermodynamics (ch1)",
                "    [-] First law (s1)",
                "      [x] Internal energy (sub1)",
                "      [ ] Work (sub2)",
                "  [x] Kinetics (ch2)",
            ]
        );
    }

    #[test]
    fn test_collapsed_chapter_hides_children() {
        let (tree, state) = load_catalog(&outline()).unwrap();
        let state = tree.toggle_expanded(&state, "ch1").unwrap();

        let lines = catalog_lines(&tree, &state).unwrap();
        assert_eq!(lines, vec!["+ [x] Thermodynamics (ch1)", "  [x] Kinetics (ch2)"]);
    }

    #[test]
    fn test_empty_page_footer() {
        let page = TaskPage {
            tasks: Vec::new(),
            total_count: 0,
        };
        assert_eq!(task_page(&page, 0), vec!["showing 0-0 of 0"]);
    }
}
