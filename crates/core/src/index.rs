use crate::variables::Token;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumberSystem {
    Decimal,
    Binary,
    Octal,
    Hex,
    Roman,
}

impl NumberSystem {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(Self::Decimal),
            "b" => Some(Self::Binary),
            "o" => Some(Self::Octal),
            "h" => Some(Self::Hex),
            "r" => Some(Self::Roman),
            _ => None,
        }
    }
}

/// Inclusive range of numbers an index never emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipRange {
    pub min: i64,
    pub max: i64,
}

impl SkipRange {
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Widest zero padding an index may request.
pub const MAX_INDEX_WIDTH: usize = 255;

/// An auto-incrementing number such as `{%03d}`, `{10%d5}` or `{$1%dr<3-5>}`.
#[derive(Debug, Clone)]
pub struct IndexVariable {
    pub token: Token,
    pub start: i64,
    pub step: i64,
    pub width: usize,
    pub system: NumberSystem,
    pub skip: Vec<SkipRange>,
    /// Capture group of the find pattern whose value scopes the counter.
    pub capture: Option<usize>,
}

impl IndexVariable {
    /// First value at or after `value`, in steps of `step`, that no skip
    /// range contains. Each range is crossed in one jump. Returns `value`
    /// unchanged when the next candidate would overflow.
    fn skip_forward(&self, mut value: i64) -> i64 {
        while let Some(range) = self.skip.iter().find(|range| range.contains(value)) {
            let step = i128::from(self.step);
            let jumps = (i128::from(range.max) - i128::from(value)) / step + 1;
            match i64::try_from(i128::from(value) + jumps * step) {
                Ok(next) => value = next,
                Err(_) => break,
            }
        }
        value
    }

    /// Renders a counter value in the variable's numbering system and width.
    pub fn render(&self, value: i64) -> String {
        if self.system == NumberSystem::Roman && value > 0 {
            return to_roman(value.unsigned_abs());
        }

        let sign = if value < 0 { "-" } else { "" };
        let abs = value.unsigned_abs();
        let digits = match self.system {
            NumberSystem::Binary => format!("{abs:b}"),
            NumberSystem::Octal => format!("{abs:o}"),
            NumberSystem::Hex => format!("{abs:x}"),
            NumberSystem::Decimal | NumberSystem::Roman => abs.to_string(),
        };
        format!("{sign}{digits:0>width$}", width = self.width)
    }
}

#[derive(Debug, Default)]
struct IndexCounter {
    next: Option<i64>,
    scoped: HashMap<String, i64>,
}

/// Running counters for every index variable of one chain link.
#[derive(Debug, Default)]
pub struct IndexState {
    counters: Vec<IndexCounter>,
}

impl IndexState {
    pub fn new(variables: usize) -> Self {
        Self {
            counters: (0..variables).map(|_| IndexCounter::default()).collect(),
        }
    }

    /// Emits the next value for the variable in `slot`. `scope` is the
    /// capture value for capture-scoped variables; each distinct value owns
    /// a sequence starting at the variable's start number.
    pub fn next_value(&mut self, slot: usize, var: &IndexVariable, scope: Option<&str>) -> i64 {
        if slot >= self.counters.len() {
            self.counters.resize_with(slot + 1, IndexCounter::default);
        }
        let counter = &mut self.counters[slot];
        let candidate = match scope {
            Some(key) => counter.scoped.entry(key.to_string()).or_insert(var.start),
            None => counter.next.get_or_insert(var.start),
        };

        let value = var.skip_forward(*candidate);
        *candidate = value.saturating_add(var.step);
        value
    }
}

fn to_roman(mut value: u64) -> String {
    const NUMERALS: [(u64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for (weight, numeral) in NUMERALS {
        while value >= weight {
            out.push_str(numeral);
            value -= weight;
        }
    }
    out
}
