//! Markdown stage
//!
//! Renders markdown to HTML. When the next token is a literate language
//! (`app.coffee.md`), the document is literate source: only its code blocks
//! are kept and the label is handed to that token.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use crate::domain::ports::stage::{Stage, StageContext, StageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownStage;

impl MarkdownStage {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options
    }
}

impl Stage for MarkdownStage {
    fn name(&self) -> &str {
        "markdown"
    }

    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError> {
        match ctx.next.clone().filter(|_| ctx.literate) {
            Some(next) => {
                ctx.text = extract_code(&ctx.text);
                ctx.label = next;
            }
            None => {
                let parser = Parser::new_ext(&ctx.text, Self::options());
                let mut out = String::with_capacity(ctx.text.len() * 3 / 2);
                html::push_html(&mut out, parser);
                ctx.text = out;
            }
        }
        Ok(())
    }

    fn reads_literate(&self) -> bool {
        true
    }
}

/// Concatenate every code block, indented or fenced, in document order
pub fn extract_code(markdown: &str) -> String {
    let mut code = String::new();
    let mut in_block = false;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_block = true;
                if !code.is_empty() && !code.ends_with("\n\n") {
                    code.push('\n');
                }
            }
            Event::End(TagEnd::CodeBlock) => in_block = false,
            Event::Text(text) if in_block => code.push_str(&text),
            _ => {}
        }
    }
    code
}
