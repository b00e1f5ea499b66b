//! Markdown rendering for structured documents.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::{Block, Document, Page, Role, TableCandidate, PAGE_SEPARATOR};
use crate::parser::{strip_bullet, LayoutAnalyzer};

use super::{HeadingStyle, RenderOptions};

/// Marker placed between the columns of a multi-column page.
pub const COLUMN_BREAK: &str = "\n\n<!-- Column Break -->\n\n";

/// Code blocks longer than this are fenced instead of inlined.
const INLINE_CODE_MAX_CHARS: usize = 60;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Markdown renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    analyzer: LayoutAnalyzer,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            analyzer: LayoutAnalyzer::with_tolerance(options.column_tolerance),
            options,
        }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_metadata {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
        }

        let mut first = true;
        for page in doc.pages.iter().filter(|p| self.options.pages.includes(p.number)) {
            if !first {
                trim_end(&mut output);
                output.push_str(PAGE_SEPARATOR);
            }
            first = false;
            self.render_page(&mut output, page);
        }

        Ok(output.trim().to_string())
    }

    fn render_page(&self, output: &mut String, page: &Page) {
        let mut plan = TablePlan::new(page, self.options.table_detection);

        let columns = if self.options.preserve_columns {
            self.analyzer.detect_columns(&page.blocks)
        } else {
            Vec::new()
        };

        // Indices rather than a sorted copy, so table membership stays valid
        if columns.len() < 2 {
            for index in self.analyzer.reading_order(&page.blocks) {
                self.render_slot(output, page, &mut plan, index);
            }
            return;
        }

        log::debug!("page {}: rendering {} columns", page.number, columns.len());

        // Blocks without a position belong to no column and lead the page.
        let mut placed = vec![false; page.blocks.len()];
        for &index in columns.iter().flatten() {
            placed[index] = true;
        }
        for index in (0..page.blocks.len()).filter(|&i| !placed[i]) {
            self.render_slot(output, page, &mut plan, index);
        }

        // A column left empty by table suppression gets no break.
        let mut parts = Vec::with_capacity(columns.len());
        for column in &columns {
            let mut part = String::new();
            for &index in column {
                self.render_slot(&mut part, page, &mut plan, index);
            }
            let part = part.trim_end();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
        if !parts.is_empty() {
            output.push_str(&parts.join(COLUMN_BREAK));
            output.push_str("\n\n");
        }
    }

    /// Render the block at `index`, or the table that claimed it.
    fn render_slot(&self, output: &mut String, page: &Page, plan: &mut TablePlan, index: usize) {
        match plan.owner.get(&index) {
            Some(&table) => {
                if !plan.emitted[table] {
                    plan.emitted[table] = true;
                    self.render_table(output, plan.tables[table]);
                }
            }
            None => self.render_block(output, &page.blocks[index]),
        }
    }

    fn render_block(&self, output: &mut String, block: &Block) {
        let raw = block.text();
        if raw.trim().is_empty() {
            return;
        }

        match block.role {
            Role::Title => self.render_heading(output, &self.prepare(&raw), 1),
            Role::Heading => self.render_heading(output, &self.prepare(&raw), heading_level(block)),
            Role::Caption => {
                output.push('*');
                output.push_str(&self.prepare(&raw));
                output.push('*');
            }
            Role::Code => {
                let text = self.normalize(&raw);
                if text.contains('\n') || text.chars().count() > INLINE_CODE_MAX_CHARS {
                    output.push_str("```\n");
                    output.push_str(&text);
                    output.push_str("\n```");
                } else {
                    output.push('`');
                    output.push_str(&text);
                    output.push('`');
                }
            }
            Role::ListItem => {
                output.push_str("- ");
                output.push_str(&self.prepare(strip_bullet(&raw)));
            }
            Role::Paragraph | Role::Text => self.render_paragraph(output, block, &raw),
        }
        output.push_str("\n\n");
    }

    fn render_heading(&self, output: &mut String, text: &str, level: usize) {
        match (self.options.heading_style, level) {
            (HeadingStyle::Setext, 1 | 2) => {
                let underline = if level == 1 { "=" } else { "-" };
                output.push_str(text);
                output.push('\n');
                output.push_str(&underline.repeat(text.chars().count()));
            }
            _ => {
                output.push_str(&"#".repeat(level));
                output.push(' ');
                output.push_str(text);
            }
        }
    }

    fn render_paragraph(&self, output: &mut String, block: &Block, raw: &str) {
        let mut text = self.prepare(raw);
        if let Some(width) = self.options.max_line_length {
            text = wrap_text(&text, width);
        }

        // Emphasis only when every word carries it.
        let marker = match (block.is_bold(), block.is_italic()) {
            (true, true) => "***",
            (true, false) => "**",
            (false, true) => "*",
            (false, false) => "",
        };
        output.push_str(marker);
        output.push_str(&text);
        output.push_str(marker);
    }

    fn render_table(&self, output: &mut String, table: &TableCandidate) {
        let width = table.column_count();
        if width == 0 {
            return;
        }

        for (i, row) in table.rows.iter().enumerate() {
            output.push('|');
            for col in 0..width {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                output.push(' ');
                output.push_str(&self.cell_text(cell));
                output.push_str(" |");
            }
            output.push('\n');

            if i == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(width));
                output.push('\n');
            }
        }
        output.push('\n');
    }

    fn cell_text(&self, cell: &str) -> String {
        let text = self.prepare(cell).replace('\n', " ");
        if self.options.escape_special_chars {
            text
        } else {
            text.replace('|', "\\|")
        }
    }

    fn normalize(&self, text: &str) -> String {
        if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        }
    }

    /// Normalize and, if enabled, escape block text.
    fn prepare(&self, text: &str) -> String {
        let text = self.normalize(text.trim());
        if self.options.escape_special_chars {
            escape_markdown(&text)
        } else {
            text
        }
    }
}

/// Accepted tables of one page and the blocks they claim.
///
/// Tables are taken in pool order; a table sharing any block with one
/// taken earlier is dropped, so each block is rendered at most once.
struct TablePlan<'a> {
    tables: Vec<&'a TableCandidate>,
    owner: HashMap<usize, usize>,
    emitted: Vec<bool>,
}

impl<'a> TablePlan<'a> {
    fn new(page: &'a Page, enabled: bool) -> Self {
        let mut plan = Self {
            tables: Vec::new(),
            owner: HashMap::new(),
            emitted: Vec::new(),
        };
        if !enabled {
            return plan;
        }

        for table in &page.tables {
            if table.is_empty() || table.block_indices.is_empty() {
                continue;
            }
            if table.block_indices.iter().any(|i| plan.owner.contains_key(i)) {
                log::debug!(
                    "page {}: skipping overlapping {:?} table",
                    page.number,
                    table.source
                );
                continue;
            }
            let id = plan.tables.len();
            for &index in &table.block_indices {
                plan.owner.insert(index, id);
            }
            plan.tables.push(table);
            plan.emitted.push(false);
        }
        plan
    }
}

/// Heading level from the dominant font size.
pub fn heading_level(block: &Block) -> usize {
    match block.dominant_font() {
        None => 2,
        Some(font) if font.size >= 24.0 => 1,
        Some(font) if font.size >= 18.0 => 2,
        Some(font) if font.size >= 14.0 => 3,
        Some(_) => 4,
    }
}

/// Greedy word wrap. A word longer than `width` gets a line of its own.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Escape special Markdown characters.
/// Only characters that could be misread as inline syntax are escaped.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

fn trim_end(output: &mut String) {
    let len = output.trim_end().len();
    output.truncate(len);
}
