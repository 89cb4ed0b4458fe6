//! Phrase grammar for the sales-order chat.
//!
//! Recognition is keyword containment, nothing more: each rule lists the terms
//! that must all appear (case-insensitively) and rules are tried in order.

use std::collections::BTreeMap;

pub const SLOT_SHIPMENT_METHOD: &str = "shipment_method";
pub const SLOT_LOAD_IN_TIME: &str = "load_in_time";

pub const FALLBACK_REPLY: &str = "I can update this order's shipment method or load-in time. \
Try \"switch shipment to courier\" or \"change the load time to 7:30 am\".";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderIntent {
    SwitchShipmentToCourier,
    ChangeLoadInTime,
}

impl OrderIntent {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::SwitchShipmentToCourier => "order.shipment_method",
            Self::ChangeLoadInTime => "order.load_in_time",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recognition {
    Recognized { intent: OrderIntent, slots: BTreeMap<String, String> },
    Unrecognized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrammarRule {
    pub intent: OrderIntent,
    pub required_terms: &'static [&'static str],
}

pub const ORDER_GRAMMAR: [GrammarRule; 2] = [
    GrammarRule {
        intent: OrderIntent::SwitchShipmentToCourier,
        required_terms: &["shipment", "courier"],
    },
    GrammarRule { intent: OrderIntent::ChangeLoadInTime, required_terms: &["load", "time"] },
];

pub fn recognize(text: &str) -> Recognition {
    let normalized = normalize_text(text);
    let Some(rule) = ORDER_GRAMMAR
        .iter()
        .find(|rule| rule.required_terms.iter().all(|term| normalized.contains(term)))
    else {
        return Recognition::Unrecognized;
    };

    let mut slots = BTreeMap::new();
    match rule.intent {
        OrderIntent::SwitchShipmentToCourier => {
            slots.insert(SLOT_SHIPMENT_METHOD.to_owned(), "COURIER".to_owned());
        }
        OrderIntent::ChangeLoadInTime => {
            if let Some(time) = extract_clock_time(&tokenize(&normalized)) {
                slots.insert(SLOT_LOAD_IN_TIME.to_owned(), time);
            }
        }
    }

    Recognition::Recognized { intent: rule.intent, slots }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || character == ':' {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

/// Finds `H[:MM] am|pm`, with the meridiem attached or as the next token.
/// Returns it as `H:MM AM`.
fn extract_clock_time(tokens: &[String]) -> Option<String> {
    tokens.iter().enumerate().find_map(|(index, token)| {
        if !token.starts_with(|ch: char| ch.is_ascii_digit()) {
            return None;
        }

        let (clock, meridiem) = match split_meridiem(token) {
            Some(split) => split,
            None => {
                let next = tokens.get(index + 1)?;
                (token.as_str(), parse_meridiem(next)?)
            }
        };
        let (hour, minute) = parse_clock(clock)?;
        Some(format!("{hour}:{minute:02} {meridiem}"))
    })
}

fn split_meridiem(token: &str) -> Option<(&str, &'static str)> {
    let clock = token.strip_suffix("am").or_else(|| token.strip_suffix("pm"))?;
    let meridiem = parse_meridiem(&token[clock.len()..])?;
    (!clock.is_empty()).then_some((clock, meridiem))
}

fn parse_meridiem(token: &str) -> Option<&'static str> {
    match token {
        "am" => Some("AM"),
        "pm" => Some("PM"),
        _ => None,
    }
}

fn parse_clock(clock: &str) -> Option<(u32, u32)> {
    let (hour, minute) = match clock.split_once(':') {
        Some((hour, minute)) if minute.len() == 2 => (hour, minute),
        Some(_) => return None,
        None => (clock, "00"),
    };
    let hour = hour.parse::<u32>().ok().filter(|hour| (1..=12).contains(hour))?;
    let minute = minute.parse::<u32>().ok().filter(|minute| *minute < 60)?;
    Some((hour, minute))
}
