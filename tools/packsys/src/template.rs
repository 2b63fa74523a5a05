/*!
The `{name}` template language used throughout package recipes.

Almost every path, flag and command argument a recipe hands to the engine is
a template. Templates are parsed into literal and reference segments, then
rendered against a configuration map. Rendering is recursive: a substituted
value may itself contain references, so substitution repeats until no
reference remains. A template that never stops referencing itself is an
error, as is a reference to a key the map does not contain.
*/

use crate::error::{self, Result};
use snafu::ensure;
use std::collections::BTreeMap;

/// Substitution stops after this many passes; hitting the cap means a value
/// cycle such as `a -> {b}`, `b -> {a}`.
const MAX_PASSES: usize = 32;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Ref(String),
}

/// Split a template into literal and `{name}` reference segments.
pub fn parse(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => name.push(c),
                None => return error::TemplateUnterminatedSnafu { template }.fail(),
            }
        }
        segments.push(Segment::Ref(name));
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Render `template` against `values`, substituting until a fixpoint is
/// reached.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut current = template.to_string();
    for _ in 0..MAX_PASSES {
        let segments = parse(&current)?;
        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Ok(current);
        }
        let mut rendered = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(&text),
                Segment::Ref(name) => {
                    let value = values.get(&name).ok_or_else(|| {
                        error::TemplateUnknownKeySnafu {
                            key: name.clone(),
                            template: template.to_string(),
                        }
                        .build()
                    })?;
                    rendered.push_str(value);
                }
            }
        }
        current = rendered;
    }
    ensure!(
        parse(&current)?
            .iter()
            .all(|s| matches!(s, Segment::Literal(_))),
        error::TemplateDepthSnafu { template }
    );
    Ok(current)
}
