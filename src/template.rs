//! Numeric templates: a string split into literal segments and numeric slots.
//!
//! `"rotate(10deg) translateX(-4.5px)"` parses into the literals `rotate(`, `deg) translateX(`,
//! `px)` around two slots with values `10` and `-4.5`. Templates are parsed once and rendered
//! per frame with fresh slot values.

use core::fmt::Write as _;

use crate::types::leading_number;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    slots: usize,
}

impl Template {
    /// Splits `input` into a template and the values found in its slots.
    ///
    /// A number token is a run of `-` signs followed by a digit and then any digits or dots. A
    /// token that does not read as a number (like `--5`) contributes `0`.
    pub fn parse(input: &str) -> (Self, Vec<f64>) {
        let bytes = input.as_bytes();
        let mut segments = Vec::new();
        let mut values = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let token_start = i;
            let mut j = i;
            while j < bytes.len() && bytes[j] == b'-' {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                while j < bytes.len() && (bytes[j].is_ascii_digit() || bytes[j] == b'.') {
                    j += 1;
                }
                if literal_start < token_start {
                    segments.push(Segment::Literal(input[literal_start..token_start].into()));
                }
                segments.push(Segment::Slot);
                values.push(leading_number(&input[token_start..j]).unwrap_or(0.0));
                literal_start = j;
                i = j;
            } else {
                i = j.max(i + 1);
            }
        }
        if literal_start < input.len() {
            segments.push(Segment::Literal(input[literal_start..].into()));
        }

        let slots = values.len();
        (Self { segments, slots }, values)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Renders the template, asking `value(slot)` for each slot in order.
    pub fn render(&self, mut value: impl FnMut(usize) -> f64) -> String {
        let mut out = String::new();
        let mut slot = 0;
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Slot => {
                    push_number(&mut out, value(slot));
                    slot += 1;
                }
            }
        }
        out
    }
}

/// Formats a number the way script engines print them: `10`, `0.5`, never `-0`.
pub fn format_number(v: f64) -> String {
    let mut out = String::new();
    push_number(&mut out, v);
    out
}

fn push_number(out: &mut String, v: f64) {
    let v = if v == 0.0 { 0.0 } else { v };
    let _ = write!(out, "{v}");
}
