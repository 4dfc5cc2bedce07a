/*
[INPUT]:  Loaded outline tree, starting selection, user input via terminal prompts
[OUTPUT]: Final SelectionState for flashcard generation
[POS]:    CLI interactive flow - outline checkbox picker
[UPDATE]: When adding picker actions
*/

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};

use cardloom_workflow::{CatalogTree, CheckState, NodeKind, SelectionState};

use super::render;

/// Remove each id and its subtree from the selection.
pub fn exclude(
    tree: &CatalogTree,
    mut state: SelectionState,
    ids: &[String],
) -> cardloom_adapter::Result<SelectionState> {
    for id in ids {
        state = match tree.check_state(&state, id)? {
            CheckState::Checked => tree.toggle_node(&state, id)?,
            // select the whole subtree first so the second toggle clears it
            CheckState::Indeterminate => tree.toggle_node(&tree.toggle_node(&state, id)?, id)?,
            CheckState::Unchecked => state,
        };
    }
    Ok(state)
}

/// Checkbox picker: choose a node to toggle it, `Done` to confirm.
pub fn pick(tree: &CatalogTree, mut state: SelectionState) -> Result<SelectionState> {
    let theme = ColorfulTheme::default();
    println!("{}", style("Choose outline nodes to generate flashcards from").bold().cyan());

    loop {
        let nodes = render::visible_nodes(tree, &state);
        let mut items = nodes
            .iter()
            .map(|entry| render::node_line(tree, &state, entry))
            .collect::<cardloom_adapter::Result<Vec<_>>>()?;
        let toggle_all = items.len();
        items.push(if state.is_empty() {
            "Select all".to_string()
        } else {
            "Clear selection".to_string()
        });
        let fold = items.len();
        items.push("Expand / collapse a chapter".to_string());
        let done = items.len();
        items.push(format!("Done ({} selected)", state.selected_count()));
        let cancel = items.len();
        items.push("Cancel".to_string());

        let choice = Select::with_theme(&theme)
            .with_prompt("Toggle")
            .items(&items)
            .default(done)
            .interact()
            .context("read selection")?;

        state = match choice {
            index if index == toggle_all => tree.toggle_all(&state),
            index if index == fold => fold_chapter(tree, &state, &theme)?,
            index if index == done => {
                if state.is_empty() {
                    println!("{}", style("Select at least one node").red());
                    continue;
                }
                return Ok(state);
            }
            index if index == cancel => bail!("selection cancelled"),
            index => tree.toggle_node(&state, &nodes[index].id)?,
        };
    }
}

fn fold_chapter(
    tree: &CatalogTree,
    state: &SelectionState,
    theme: &ColorfulTheme,
) -> Result<SelectionState> {
    let chapters: Vec<_> = tree
        .roots()
        .filter(|entry| entry.kind == NodeKind::Chapter && !entry.is_leaf())
        .collect();
    if chapters.is_empty() {
        return Ok(state.clone());
    }
    let labels: Vec<String> = chapters
        .iter()
        .map(|entry| {
            let mark = if state.is_expanded(&entry.id) { "-" } else { "+" };
            format!("{mark} {}", entry.title)
        })
        .collect();
    let choice = Select::with_theme(theme)
        .with_prompt("Chapter")
        .items(&labels)
        .default(0)
        .interact()
        .context("read chapter")?;
    Ok(tree.toggle_expanded(state, &chapters[choice].id)?)
}
