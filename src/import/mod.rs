//! Thin XML importer: source text to variant witness graph.
//!
//! The importer is the boundary producer for the collation core. It turns
//! one XML-transcribed witness into a [`VariantWitnessGraph`] satisfying the
//! core's input contract: acyclic, one start and one end sentinel, every
//! non-sentinel vertex carrying a token with a populated branch path.
//!
//! Variation is encoded the usual TEI-ish way:
//! - a `<del>` immediately followed by an `<add>` forms one variation group
//!   with one branch per element (whitespace-only text between them is
//!   ignored);
//! - a lone `<del>` or `<add>` is a variation of its content against an
//!   empty alternative path;
//! - `<subst>` groups its `<del>`/`<add>` children explicitly;
//! - empty elements (`<lb/>`) become milestone tokens;
//! - every other element is markup: recorded in the registry, stacked onto
//!   token parent paths, otherwise structurally inert.
//!
//! The import state is an explicit struct threaded through one event loop,
//! not closures over mutable captures: every transition is a method that
//! can be exercised in isolation.

pub mod tokenizer;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::markup::{Markup, MarkupId};
use crate::types::sigil::Sigil;
use crate::types::token::Token;
use crate::types::vertex::VertexId;
use crate::types::witness::VariantWitnessGraph;
use self::tokenizer::tokenize;

/// Errors raised while importing a witness.
///
/// All fatal: the importer either yields a well-formed witness graph or
/// nothing. The core never sees these.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ImportError {
    /// Malformed XML.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// A close tag that does not match the innermost open element.
    #[error("mismatched close tag: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag {
        /// The innermost open element.
        expected: String,
        /// The tag actually closed.
        found: String,
    },
    /// A close tag with no open element at all.
    #[error("unexpected close tag </{0}>")]
    UnexpectedCloseTag(String),
    /// An XML construct the importer does not support.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
}

/// One open element, with its registered markup span.
#[derive(Debug)]
struct OpenElement {
    tag: String,
    markup: MarkupId,
}

/// One open variation group.
#[derive(Debug)]
struct VariationFrame {
    /// Frontier at the point the group opened; every branch starts here.
    entry: Vec<VertexId>,
    /// Final vertices of each completed branch.
    exits: Vec<VertexId>,
    /// Completed branches so far.
    branches: u32,
    /// Whether the group was opened by `<subst>` (closed by its end tag)
    /// rather than by adjacency (closed by the next non-variant event).
    explicit: bool,
}

/// Importer state, threaded through the event loop.
struct ImporterState {
    graph: VariantWitnessGraph,
    sigil: Sigil,
    /// Vertices whose outgoing edges connect to the next token vertex.
    frontier: Vec<VertexId>,
    branch_path: Vec<u32>,
    next_branch: u32,
    token_index: u32,
    open_elements: Vec<OpenElement>,
    variations: Vec<VariationFrame>,
    /// An adjacency-mode group is open and its last branch just closed;
    /// the next event decides whether the group continues or closes.
    awaiting_adjacent: bool,
}

impl ImporterState {
    fn new(sigil: Sigil) -> Self {
        let graph = VariantWitnessGraph::new(sigil.clone());
        let start = graph.start();
        Self {
            graph,
            sigil,
            frontier: vec![start],
            branch_path: vec![0],
            next_branch: 1,
            token_index: 0,
            open_elements: Vec::new(),
            variations: Vec::new(),
            awaiting_adjacent: false,
        }
    }

    fn parent_path(&self) -> Vec<String> {
        self.open_elements.iter().map(|e| e.tag.clone()).collect()
    }

    /// Append a token vertex, wiring it from the whole frontier.
    fn append_token(&mut self, raw: &str, parent_path: Vec<String>) {
        let token = Token::new(self.sigil.clone(), raw, self.token_index, parent_path);
        self.token_index += 1;
        let vertex = self.graph.add_token_vertex(token, self.branch_path.clone());
        for &f in &self.frontier {
            self.graph.add_edge(f, vertex);
        }
        self.frontier = vec![vertex];
        for i in 0..self.open_elements.len() {
            let markup = self.open_elements[i].markup;
            self.graph.attach_markup(vertex, markup);
        }
    }

    fn open_group(&mut self, explicit: bool) {
        self.variations.push(VariationFrame {
            entry: self.frontier.clone(),
            exits: Vec::new(),
            branches: 0,
            explicit,
        });
    }

    /// Begin one branch of the innermost group.
    fn begin_branch(&mut self) {
        if let Some(frame) = self.variations.last() {
            self.frontier = frame.entry.clone();
        }
        self.branch_path.push(self.next_branch);
        self.next_branch += 1;
    }

    /// End the current branch: bank its frontier as an exit, restore the
    /// group entry for the next branch.
    fn end_branch(&mut self) {
        if let Some(frame) = self.variations.last_mut() {
            frame.exits.extend(self.frontier.iter().copied());
            frame.branches += 1;
            self.frontier = frame.entry.clone();
        }
        self.branch_path.pop();
    }

    /// Close the innermost group: the frontier becomes the union of branch
    /// exits. A single-branch group (lone `<del>`/`<add>`) keeps the entry
    /// as an empty alternative path.
    fn close_group(&mut self) {
        let Some(frame) = self.variations.pop() else {
            return;
        };
        if frame.branches == 0 {
            return;
        }
        let mut frontier = frame.exits;
        if frame.branches <= 1 {
            frontier.extend(frame.entry.iter().copied());
        }
        frontier.dedup();
        self.frontier = frontier;
    }

    fn close_pending_adjacent(&mut self) {
        if self.awaiting_adjacent {
            self.awaiting_adjacent = false;
            self.close_group();
        }
    }

    /// Finish: connect the frontier to the end sentinel.
    fn finish(mut self) -> Result<VariantWitnessGraph, ImportError> {
        self.close_pending_adjacent();
        if let Some(open) = self.open_elements.last() {
            return Err(ImportError::Xml(format!(
                "unclosed element <{}> at end of input",
                open.tag
            )));
        }
        let end = self.graph.end();
        for &f in &self.frontier {
            self.graph.add_edge(f, end);
        }
        Ok(self.graph)
    }
}

fn is_variant_tag(tag: &str) -> bool {
    tag == "del" || tag == "add"
}

fn element_markup(e: &BytesStart<'_>) -> Result<Markup, ImportError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ImportError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ImportError::Xml(err.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(Markup::with_attributes(tag, attributes))
}

/// Import one witness from its XML source.
pub fn import_witness(
    sigil: impl Into<Sigil>,
    xml: &str,
) -> Result<VariantWitnessGraph, ImportError> {
    let sigil = sigil.into();
    let mut state = ImporterState::new(sigil.clone());

    let mut reader = Reader::from_reader(xml.as_bytes());
    // The element stack below reports mismatches with their own taxonomy.
    reader.config_mut().check_end_names = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let markup = element_markup(&e)?;
                let tag = markup.tag.clone();
                if tag == "subst" {
                    state.close_pending_adjacent();
                    state.open_group(true);
                } else if is_variant_tag(&tag) {
                    if state.awaiting_adjacent {
                        // The group stays open; this element is its next
                        // branch.
                        state.awaiting_adjacent = false;
                    } else {
                        let in_subst = state
                            .open_elements
                            .last()
                            .map(|o| o.tag == "subst")
                            .unwrap_or(false);
                        if !in_subst {
                            state.open_group(false);
                        }
                    }
                } else {
                    state.close_pending_adjacent();
                }
                let markup_id = state.graph.register_markup(markup);
                state.open_elements.push(OpenElement { tag: tag.clone(), markup: markup_id });
                if is_variant_tag(&tag) {
                    state.begin_branch();
                }
            }
            Ok(Event::End(e)) => {
                let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                // Any group still awaiting adjacency here belongs to a
                // nested element and closes before this end tag applies.
                state.close_pending_adjacent();
                let Some(open) = state.open_elements.pop() else {
                    return Err(ImportError::UnexpectedCloseTag(found));
                };
                if open.tag != found {
                    return Err(ImportError::MismatchedCloseTag {
                        expected: open.tag,
                        found,
                    });
                }
                if is_variant_tag(&found) {
                    state.end_branch();
                    let explicit = state.variations.last().map(|f| f.explicit).unwrap_or(false);
                    if !explicit {
                        state.awaiting_adjacent = true;
                    }
                } else if found == "subst" {
                    state.close_group();
                }
            }
            Ok(Event::Empty(e)) => {
                state.close_pending_adjacent();
                let markup = element_markup(&e)?;
                let tag = markup.tag.clone();
                let markup_id = state.graph.register_markup(markup);
                let mut parent_path = state.parent_path();
                parent_path.push(tag);
                state.append_token("", parent_path);
                // append_token attached the enclosing spans; the milestone's
                // own span covers just this vertex.
                let vertex = state.frontier[0];
                state.graph.attach_markup(vertex, markup_id);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|err| ImportError::Xml(err.to_string()))?
                    .into_owned();
                if state.awaiting_adjacent && text.trim().is_empty() {
                    // Whitespace between adjacent variants does not close
                    // the group.
                } else {
                    state.close_pending_adjacent();
                    let parent_path = state.parent_path();
                    for raw in tokenize(&text) {
                        state.append_token(&raw, parent_path.clone());
                    }
                }
            }
            Ok(Event::CData(_)) => {
                return Err(ImportError::UnsupportedConstruct("CDATA section".to_string()));
            }
            Ok(Event::Comment(_)) | Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let graph = state.finish()?;
    debug!(witness = %sigil, vertices = graph.vertex_count(), "imported witness");
    Ok(graph)
}
