//! Server-side HTML rendering of lesson blocks.
//!
//! Prose trees render through a small tag allowlist; exercise blocks
//! render their initial interactive markup with data attributes the
//! page script drives. A block that failed content parsing renders a
//! visible inline error region instead of breaking its siblings.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::content::blanks::{parse_blank_content, Blank, RenderNode, Table};
use crate::content::{Block, Lesson, Node};
use crate::exercise::placement::PlacementBoard;
use crate::exercise::ExerciseConfig;
use crate::progress;
use crate::state::AppState;

/// Inline formatting tags passed through as-is; anything else renders
/// its children only.
const ALLOWED_TAGS: [&str; 12] = [
    "p", "strong", "em", "b", "i", "u", "span", "ul", "ol", "li", "br", "blockquote",
];

fn esc(s: &str) -> String {
    encode_text(s).to_string()
}

fn esc_attr(s: &str) -> String {
    encode_double_quoted_attribute(s).to_string()
}

/// Render every block of a lesson, in order.
pub fn render_lesson_body(lesson: &Lesson, state: &AppState) -> String {
    lesson
        .blocks
        .iter()
        .enumerate()
        .map(|(index, block)| render_block(index, block, &lesson.path, state))
        .collect()
}

fn render_block(index: usize, block: &Block, lesson_path: &str, state: &AppState) -> String {
    match block {
        Block::Prose(nodes) => format!("<div class=\"prose\">{}</div>", render_nodes(nodes)),
        Block::Exercise(config) => render_exercise(index, config, lesson_path, state),
        Block::Error { message } => format!(
            "<div class=\"block-error\">Inhalt konnte nicht geladen werden: {}</div>",
            esc(message)
        ),
    }
}

pub fn render_nodes(nodes: &[Node]) -> String {
    nodes.iter().map(render_node).collect()
}

fn render_node(node: &Node) -> String {
    match node {
        Node::Text(text) => esc(text),
        Node::Element { tag, children } => {
            let inner = render_nodes(children);
            if ALLOWED_TAGS.contains(&tag.as_str()) {
                if tag == "br" {
                    "<br>".to_string()
                } else {
                    format!("<{tag}>{inner}</{tag}>")
                }
            } else {
                inner
            }
        }
    }
}

/// Wrap one exercise with its identity and completion state; the page
/// script posts interactions to `/exercise/check` keyed by lesson path
/// and block index.
fn render_exercise(
    index: usize,
    config: &ExerciseConfig,
    lesson_path: &str,
    state: &AppState,
) -> String {
    let kind = config.kind();
    let id = progress::exercise_id(
        lesson_path,
        kind,
        &config.content_fingerprint(),
        &state.base_path,
    );
    let completed = state.store.is_complete(&id);
    let body = render_exercise_body(config);
    format!(
        "<section class=\"exercise\" data-kind=\"{}\" data-block=\"{}\" \
         data-lesson=\"{}\" data-exercise-id=\"{}\" data-completed=\"{}\">{}</section>",
        kind,
        index,
        esc_attr(lesson_path),
        esc_attr(&id),
        completed,
        body
    )
}

fn render_exercise_body(config: &ExerciseConfig) -> String {
    match config {
        ExerciseConfig::FillBlanks(c) => {
            let parsed = parse_blank_content(&c.text);
            if c.drag_mode {
                render_drag_blanks(&parsed.rendered, &parsed.blanks)
            } else {
                render_typed_blanks(&parsed.rendered, &parsed.blanks)
            }
        }
        ExerciseConfig::InlineBlanks(c) => {
            let parsed = parse_blank_content(&c.text);
            render_typed_blanks(&parsed.rendered, &parsed.blanks)
        }
        ExerciseConfig::Quiz(c) => {
            let multi = crate::exercise::validators::quiz_is_multi_select(c);
            let input_type = if multi { "checkbox" } else { "radio" };
            let options: String = c
                .options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    format!(
                        "<label><input type=\"{}\" name=\"option\" value=\"{}\"> {}</label>",
                        input_type,
                        i + 1,
                        esc(option)
                    )
                })
                .collect();
            format!(
                "<p class=\"question\">{}</p><div class=\"options\">{}</div>{}",
                esc(&c.question),
                options,
                check_button()
            )
        }
        ExerciseConfig::Ordering(c) => {
            let board = PlacementBoard::new(&c.items, 0);
            let mode = if c.vertical { "vertical" } else { "horizontal" };
            let tokens = token_bank(&board);
            format!("<div class=\"ordering\" data-mode=\"{mode}\">{tokens}</div>{}", check_button())
        }
        ExerciseConfig::Matching(c) => {
            let rights: Vec<&str> = c.pairs.iter().map(|p| p.right.as_str()).collect();
            let board = PlacementBoard::new(&rights, rights.len());
            let targets: String = c
                .pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| {
                    format!(
                        "<div class=\"match-row\"><span>{}</span>{}</div>",
                        esc(&pair.left),
                        slot(i)
                    )
                })
                .collect();
            format!("{}{}{}", targets, token_bank(&board), check_button())
        }
        ExerciseConfig::Grouping(c) => {
            let members: Vec<&str> = c
                .groups
                .iter()
                .flat_map(|g| g.members.iter().map(String::as_str))
                .collect();
            let board = PlacementBoard::new(&members, 0);
            let groups: String = c
                .groups
                .iter()
                .enumerate()
                .map(|(i, group)| {
                    format!(
                        "<div class=\"group\" data-group=\"{}\"><h4>{}</h4></div>",
                        i,
                        esc(&group.name)
                    )
                })
                .collect();
            format!("{}{}{}", groups, token_bank(&board), check_button())
        }
        ExerciseConfig::ImageLabeling(c) => {
            let labels: Vec<&str> = c.slots.iter().map(|s| s.label.as_str()).collect();
            let board = PlacementBoard::new(&labels, labels.len());
            let slots: String = c
                .slots
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    format!(
                        "<span class=\"image-slot\" data-slot=\"{}\" \
                         style=\"left:{}%;top:{}%\"></span>",
                        i, s.x_pct, s.y_pct
                    )
                })
                .collect();
            format!(
                "<div class=\"labeling\"><img src=\"{}\" alt=\"\">{}</div>{}{}",
                esc_attr(&c.image),
                slots,
                token_bank(&board),
                check_button()
            )
        }
        ExerciseConfig::Flashcards(c) => {
            let cards: String = c
                .cards
                .iter()
                .map(|card| {
                    format!(
                        "<div class=\"flashcard\"><div class=\"front\">{}</div>\
                         <div class=\"back\">{}</div></div>",
                        esc(&card.front),
                        esc(&card.back)
                    )
                })
                .collect();
            format!("<div class=\"flashcards\">{cards}</div>")
        }
        ExerciseConfig::SpeakingChallenge(c) => format!(
            "<p class=\"phrase\" data-language=\"{}\">{}</p>{}\
             <button type=\"button\" data-action=\"record\">Aufnehmen</button>\
             <span class=\"transcript\" data-role=\"interim\"></span>",
            esc_attr(c.language.as_deref().unwrap_or("de-DE")),
            esc(&c.phrase),
            translation_line(c.translation.as_deref()),
        ),
        ExerciseConfig::AudioPhrase(c) => format!(
            "<p class=\"phrase\" data-language=\"{}\" data-speed-mode=\"{}\">{}</p>{}\
             <button type=\"button\" data-action=\"play\">Anhören</button>\
             <button type=\"button\" data-action=\"play-slow\">Langsam</button>",
            esc_attr(c.language.as_deref().unwrap_or("de-DE")),
            c.speed_mode,
            esc(&c.phrase),
            translation_line(c.translation.as_deref()),
        ),
        ExerciseConfig::Media(c) => {
            let element = if c.audio_only { "audio" } else { "video" };
            let checkpoints = serde_json::to_string(
                &c.checkpoints.iter().map(|cp| cp.time).collect::<Vec<_>>(),
            )
            .unwrap_or_else(|_| "[]".to_string());
            format!(
                "<{element} controls src=\"{}\" data-checkpoints=\"{}\"></{element}>\
                 <div class=\"checkpoint-overlay\" hidden></div>",
                esc_attr(&c.source),
                esc_attr(&checkpoints)
            )
        }
    }
}

fn check_button() -> String {
    "<button type=\"button\" data-action=\"check\">Prüfen</button>\
     <span class=\"feedback\" data-role=\"feedback\"></span>"
        .to_string()
}

fn translation_line(translation: Option<&str>) -> String {
    match translation {
        Some(t) => format!("<p class=\"translation\">{}</p>", esc(t)),
        None => String::new(),
    }
}

fn slot(index: usize) -> String {
    format!("<span class=\"slot\" data-slot=\"{index}\"></span>")
}

/// The shuffled token bank; PlacementBoard randomizes once at render.
fn token_bank(board: &PlacementBoard) -> String {
    let tokens: String = board
        .bank()
        .iter()
        .filter_map(|id| {
            board.token_text(*id).map(|text| {
                format!(
                    "<span class=\"token\" data-token=\"{}\">{}</span>",
                    id.0,
                    esc(text)
                )
            })
        })
        .collect();
    format!("<div class=\"token-bank\">{tokens}</div>")
}

fn render_typed_blanks(rendered: &[RenderNode], blanks: &[Blank]) -> String {
    let body = render_blank_nodes(rendered, blanks, false);
    format!("{body}{}", check_button())
}

fn render_drag_blanks(rendered: &[RenderNode], blanks: &[Blank]) -> String {
    // Bank holds every answer plus each blank's local distractors.
    let mut texts: Vec<&str> = blanks.iter().map(|b| b.answer.as_str()).collect();
    texts.extend(
        blanks
            .iter()
            .flat_map(|b| b.options.iter().map(String::as_str)),
    );
    let board = PlacementBoard::new(&texts, blanks.len());
    let body = render_blank_nodes(rendered, blanks, true);
    format!("{body}{}{}", token_bank(&board), check_button())
}

fn render_blank_nodes(nodes: &[RenderNode], blanks: &[Blank], drag: bool) -> String {
    nodes
        .iter()
        .map(|node| render_blank_node(node, blanks, drag))
        .collect()
}

fn render_blank_node(node: &RenderNode, blanks: &[Blank], drag: bool) -> String {
    match node {
        RenderNode::Text(text) => esc(text),
        RenderNode::Blank(index) => {
            let hint = blanks
                .get(*index)
                .and_then(|b| b.hint.as_deref())
                .map(|h| format!(" title=\"{}\"", esc_attr(h)))
                .unwrap_or_default();
            if drag {
                format!("<span class=\"slot\" data-slot=\"{index}\"{hint}></span>")
            } else {
                format!("<input class=\"blank\" data-blank=\"{index}\"{hint} autocomplete=\"off\">")
            }
        }
        RenderNode::Element { tag, children } => {
            let inner = render_blank_nodes(children, blanks, drag);
            if ALLOWED_TAGS.contains(&tag.as_str()) {
                if tag == "br" {
                    "<br>".to_string()
                } else {
                    format!("<{tag}>{inner}</{tag}>")
                }
            } else {
                inner
            }
        }
        RenderNode::Table(table) => render_table(table, blanks, drag),
    }
}

fn render_table(table: &Table, blanks: &[Blank], drag: bool) -> String {
    let cell = |nodes: &[RenderNode], tag: &str| {
        format!("<{tag}>{}</{tag}>", render_blank_nodes(nodes, blanks, drag))
    };
    let header: String = table
        .header
        .iter()
        .map(|nodes| cell(nodes, "th"))
        .collect();
    let rows: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|nodes| cell(nodes, "td")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!("<table><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>")
}
