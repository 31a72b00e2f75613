//! Security plan document blocks
//!
//! A plan document is an ordered list of blocks. Dynamic blocks are
//! placeholders bound to live project data; syncing one replaces it with a
//! static snapshot of that data.
//!
//! Global invariants enforced:
//! - A snapshot never contains dynamic blocks
//! - Syncing replaces exactly one block in place; all other blocks keep their
//!   ids and order
//! - Empty source lists produce a placeholder paragraph, never an empty section

use crate::project::Project;
use serde::{Deserialize, Serialize};

pub const NO_TEAMS: &str = "Nebyly vybrány žádné týmy.";
pub const NO_RISKS: &str = "Nebyla identifikována žádná rizika.";
pub const NO_MEASURES: &str = "Nebyla vybrána žádná opatření.";
pub const UNKNOWN_DYNAMIC: &str = "Neznámý dynamický blok.";

/// Project data a dynamic block is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicKey {
    BasicInfo,
    Teams,
    Risks,
    Measures,
    #[serde(other)]
    Unknown,
}

impl DynamicKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicKey::BasicInfo => "basicInfo",
            DynamicKey::Teams => "teams",
            DynamicKey::Risks => "risks",
            DynamicKey::Measures => "measures",
            DynamicKey::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    H1,
    H2,
    P,
    PageBreak,
    Dynamic,
}

/// One stored document block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_key: Option<DynamicKey>,
}

impl Block {
    pub fn text(id: String, kind: BlockKind, content: &str) -> Self {
        Block {
            id,
            kind,
            content: content.to_string(),
            dynamic_key: None,
        }
    }

    pub fn page_break(id: String) -> Self {
        Block::text(id, BlockKind::PageBreak, "")
    }

    pub fn dynamic(id: String, key: DynamicKey) -> Self {
        Block {
            id,
            kind: BlockKind::Dynamic,
            content: String::new(),
            dynamic_key: Some(key),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BlockKind::Dynamic
    }
}

/// Snapshot content before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticBlock {
    pub kind: BlockKind,
    pub content: String,
}

impl StaticBlock {
    fn h2(content: &str) -> Self {
        StaticBlock {
            kind: BlockKind::H2,
            content: content.to_string(),
        }
    }

    fn p(content: impl Into<String>) -> Self {
        StaticBlock {
            kind: BlockKind::P,
            content: content.into(),
        }
    }

    fn into_block(self, id: String) -> Block {
        Block {
            id,
            kind: self.kind,
            content: self.content,
            dynamic_key: None,
        }
    }
}

fn bullet_list<'a>(
    heading: &str,
    items: impl IntoIterator<Item = &'a str>,
    placeholder: &str,
) -> Vec<StaticBlock> {
    let mut out = vec![StaticBlock::h2(heading)];
    let before = out.len();
    out.extend(items.into_iter().map(|item| StaticBlock::p(format!("- {}", item))));
    if out.len() == before {
        out.push(StaticBlock::p(placeholder));
    }
    out
}

/// Static content for a dynamic block, computed from the current project data
pub fn snapshot(key: DynamicKey, project: &Project) -> Vec<StaticBlock> {
    match key {
        DynamicKey::BasicInfo => vec![
            StaticBlock::p(format!("Oficiální název: {}", project.official_name_display())),
            StaticBlock::p(format!("Organizátor: {}", project.organizer_display())),
            StaticBlock::p(format!("Počet účastníků: {}", project.audience_size_display())),
        ],
        DynamicKey::Teams => bullet_list(
            "Týmy podílející se na akci",
            project.involved_teams(),
            NO_TEAMS,
        ),
        DynamicKey::Risks => bullet_list(
            "Zvažovaná rizika",
            project.risks.iter().map(|r| r.name.as_str()),
            NO_RISKS,
        ),
        DynamicKey::Measures => bullet_list(
            "Navrhovaná bezpečnostní opatření",
            project.selected_measures.iter(),
            NO_MEASURES,
        ),
        DynamicKey::Unknown => vec![StaticBlock::p(UNKNOWN_DYNAMIC)],
    }
}

/// Replace the dynamic block `block_id` with a snapshot of its data.
///
/// Missing ids and non-dynamic blocks leave the document unchanged.
pub fn sync_dynamic_block(
    blocks: &[Block],
    block_id: &str,
    project: &Project,
    next_id: &mut impl FnMut() -> String,
) -> Vec<Block> {
    let Some(index) = blocks.iter().position(|b| b.id == block_id) else {
        log::warn!("document block '{}' not found; nothing to sync", block_id);
        return blocks.to_vec();
    };
    let target = &blocks[index];
    if !target.is_dynamic() {
        log::warn!("document block '{}' is not dynamic; nothing to sync", block_id);
        return blocks.to_vec();
    }
    let key = target.dynamic_key.unwrap_or(DynamicKey::Unknown);

    let mut out = Vec::with_capacity(blocks.len() + 4);
    out.extend_from_slice(&blocks[..index]);
    out.extend(
        snapshot(key, project)
            .into_iter()
            .map(|block| block.into_block(next_id())),
    );
    out.extend_from_slice(&blocks[index + 1..]);
    out
}

/// Sync every dynamic block in document order
pub fn materialize(
    blocks: &[Block],
    project: &Project,
    next_id: &mut impl FnMut() -> String,
) -> Vec<Block> {
    let dynamic_ids: Vec<String> = blocks
        .iter()
        .filter(|b| b.is_dynamic())
        .map(|b| b.id.clone())
        .collect();
    let mut doc = blocks.to_vec();
    for id in &dynamic_ids {
        doc = sync_dynamic_block(&doc, id, project, &mut *next_id);
    }
    doc
}

/// Starting layout for a project without stored blocks
pub fn default_template(
    project: &Project,
    prepared_on: &str,
    next_id: &mut impl FnMut() -> String,
) -> Vec<Block> {
    let title = if project.title().trim().is_empty() {
        "Nový projekt"
    } else {
        project.title()
    };
    vec![
        Block::text(next_id(), BlockKind::H1, &format!("Bezpečnostní plán: {}", title)),
        Block::text(
            next_id(),
            BlockKind::P,
            &format!(
                "Datum zpracování: {}\nZpracovatel: {}",
                prepared_on,
                project.author_display()
            ),
        ),
        Block::page_break(next_id()),
        Block::text(next_id(), BlockKind::H1, "Obsah"),
        Block::text(
            next_id(),
            BlockKind::P,
            "1. Základní údaje o akci\n2. Zvažovaná rizika\n3. Bezpečnostní opatření",
        ),
        Block::page_break(next_id()),
        Block::text(next_id(), BlockKind::H1, "1. Základní údaje o akci"),
        Block::dynamic(next_id(), DynamicKey::BasicInfo),
        Block::text(next_id(), BlockKind::H1, "2. Zvažovaná rizika"),
        Block::dynamic(next_id(), DynamicKey::Risks),
        Block::text(next_id(), BlockKind::H1, "3. Bezpečnostní opatření"),
        Block::dynamic(next_id(), DynamicKey::Measures),
    ]
}

/// Plain-text rendering of a document, one block per paragraph
pub fn render_document_text(blocks: &[Block]) -> String {
    let mut output = String::new();
    for block in blocks {
        match block.kind {
            BlockKind::H1 => {
                let rule = "=".repeat(block.content.chars().count());
                output.push_str(&format!("{}\n{}\n\n", block.content, rule));
            }
            BlockKind::H2 => {
                let rule = "-".repeat(block.content.chars().count());
                output.push_str(&format!("{}\n{}\n\n", block.content, rule));
            }
            BlockKind::P => {
                output.push_str(&block.content);
                output.push_str("\n\n");
            }
            BlockKind::PageBreak => output.push_str("\x0c\n"),
            BlockKind::Dynamic => {
                let key = block.dynamic_key.unwrap_or(DynamicKey::Unknown);
                output.push_str(&format!("[dynamic section: {}]\n\n", key.as_str()));
            }
        }
    }
    output
}
