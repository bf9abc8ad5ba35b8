//! Drawing rendered elements as terminal lines
//!
//! Only the component kinds the bundled trees use get special treatment;
//! anything else shows its text and its children.

use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use ui_dispatch::debug::DebugSection;
use ui_dispatch::value::{is_truthy, stringify};
use ui_dispatch::{Element, ElementChild, Value};

pub const HELP: &str = "Tab: focus  Left/Right: option  Enter: activate  s: state  q: quit";

/// Host-side input state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Index into [`focusables`].
    pub focus: usize,
    /// Option shown by a focused select.
    pub option: usize,
}

/// Elements that take keyboard input, in tree order.
pub fn focusables(roots: &[Element]) -> Vec<&Element> {
    fn walk<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
        if matches!(element.kind.as_str(), "Select" | "Button") {
            out.push(element);
        }
        for child in element.child_elements() {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for root in roots {
        walk(root, &mut out);
    }
    out
}

/// `(label, value)` pairs of a select's `options` prop.
pub fn options(select: &Element) -> Vec<(String, Value)> {
    let Some(Value::Array(items)) = select.prop("options") else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let label = item.get("label").map(stringify).unwrap_or_else(|| stringify(item));
            let value = item.get("value").cloned().unwrap_or_else(|| item.clone());
            (label, value)
        })
        .collect()
}

/// Position of the select's current `value` among its options.
///
/// Values compare by their string form, since templated state writes turn
/// numbers into strings.
pub fn selected_index(select: &Element) -> Option<usize> {
    let value = select.prop("value").filter(|v| !v.is_null())?;
    let wanted = stringify(value);
    options(select)
        .iter()
        .position(|(_, candidate)| stringify(candidate) == wanted)
}

/// Text shown for an element: a bound `children` prop, else its literal content.
pub fn label(element: &Element) -> String {
    match element.prop("children") {
        Some(value) if !value.is_null() => stringify(value),
        _ => element.text(),
    }
}

/// Lay out `roots` as styled lines.
pub fn lines(roots: &[Element], cursor: Cursor) -> Vec<Line<'static>> {
    let focused = focusables(roots).get(cursor.focus).copied();
    let mut out = Vec::new();
    for root in roots {
        push_element(root, 0, focused, cursor, &mut out);
    }
    out
}

fn push_element(
    element: &Element,
    indent: usize,
    focused: Option<&Element>,
    cursor: Cursor,
    out: &mut Vec<Line<'static>>,
) {
    let pad = "  ".repeat(indent);
    let is_focused = focused.is_some_and(|f| std::ptr::eq(f, element));

    match element.kind.as_str() {
        "CardTitle" => out.push(Line::from(vec![
            Span::raw(pad),
            Span::styled(
                label(element),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ])),
        "Alert" => {
            let (marker, color) = match element.prop("variant").and_then(Value::as_str) {
                Some("destructive") => ("! ", Color::Red),
                _ => ("i ", Color::Yellow),
            };
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled(format!("{marker}{}", label(element)), Style::default().fg(color)),
            ]));
        }
        "Button" => {
            let style = if is_focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Green)
            };
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled(format!("[ {} ]", label(element)), style),
            ]));
        }
        "Select" => push_select(element, &pad, is_focused, cursor, out),
        _ if is_inline_row(element) => {
            let mut spans = vec![Span::raw(pad)];
            spans.extend(element.child_elements().map(|span| {
                let strong = span
                    .prop("className")
                    .and_then(Value::as_str)
                    .is_some_and(|class| class.contains("font-semibold"));
                let style = if strong {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Span::styled(label(span), style)
            }));
            out.push(Line::from(spans));
        }
        kind => {
            let text = own_text(element);
            if !text.is_empty() {
                out.push(Line::from(format!("{pad}{text}")));
            }
            let nested = if kind == "Card" { indent + 1 } else { indent };
            for child in element.child_elements() {
                push_element(child, nested, focused, cursor, out);
            }
            if kind == "Card" {
                out.push(Line::default());
            }
        }
    }
}

fn push_select(
    select: &Element,
    pad: &str,
    is_focused: bool,
    cursor: Cursor,
    out: &mut Vec<Line<'static>>,
) {
    let options = options(select);
    let current = if select.prop("loading").is_some_and(is_truthy) {
        "Loading…".to_string()
    } else if is_focused && !options.is_empty() {
        options[cursor.option % options.len()].0.clone()
    } else if let Some(index) = selected_index(select) {
        options[index].0.clone()
    } else {
        select
            .prop("placeholder")
            .map(stringify)
            .unwrap_or_else(|| "Select".to_string())
    };

    let (marker, style) = if is_focused {
        ("▸ ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    } else {
        ("  ", Style::default())
    };
    out.push(Line::from(vec![
        Span::raw(format!("{pad}{marker}")),
        Span::styled(format!("< {current} >"), style),
    ]));

    if let Some(error) = select.prop("error").filter(|e| is_truthy(e)) {
        out.push(Line::from(Span::styled(
            format!("{pad}  {}", stringify(error)),
            Style::default().fg(Color::Red),
        )));
    }
}

fn is_inline_row(element: &Element) -> bool {
    let mut children = element.child_elements().peekable();
    element.kind == "div" && children.peek().is_some() && children.all(|c| c.kind == "span")
}

fn own_text(element: &Element) -> String {
    if let Some(value) = element.prop("children").filter(|v| !v.is_null()) {
        return stringify(value);
    }
    element
        .children
        .iter()
        .filter_map(|child| match child {
            ElementChild::Content(value) => Some(stringify(value)),
            ElementChild::Element(_) => None,
        })
        .collect()
}

fn section_lines(sections: &[DebugSection]) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for section in sections {
        out.push(Line::from(Span::styled(
            section.title.clone(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        for entry in &section.entries {
            out.push(Line::from(vec![
                Span::styled(format!("  {}: ", entry.key), Style::default().fg(Color::DarkGray)),
                Span::raw(entry.value.clone()),
            ]));
        }
        out.push(Line::default());
    }
    out
}

/// Draw the tree, an optional state panel, a status line and key help.
pub fn draw(
    frame: &mut Frame,
    roots: &[Element],
    cursor: Cursor,
    panel: Option<&[DebugSection]>,
    status: &str,
) {
    let [body, status_area, help_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let tree = Paragraph::new(lines(roots, cursor))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" ui-dispatch ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    match panel {
        Some(sections) => {
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .areas(body);
            frame.render_widget(tree, left);
            let panel = Paragraph::new(section_lines(sections))
                .wrap(Wrap { trim: false })
                .block(Block::default().title(" state ").borders(Borders::ALL));
            frame.render_widget(panel, right);
        }
        None => frame.render_widget(tree, body),
    }

    frame.render_widget(
        Paragraph::new(status.to_string()).style(Style::default().fg(Color::Yellow)),
        status_area,
    );
    frame.render_widget(
        Paragraph::new(HELP)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        help_area,
    );
}
